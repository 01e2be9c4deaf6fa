use crate::{
    db::DbPool,
    entities::book::{self, Model as BookModel},
    errors::ServiceError,
    events::{Event, EventSender},
    repositories::{BookAvailability, BookRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBookRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 200, message = "Author must be between 1 and 200 characters"))]
    pub author: String,
    #[validate(length(min = 1, max = 13, message = "ISBN must be between 1 and 13 characters"))]
    pub isbn: String,
    /// Copies on the shelf; defaults to 1
    #[serde(default = "default_quantity")]
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
}

impl CreateBookRequest {
    fn trimmed(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.author = self.author.trim().to_string();
        self.isbn = self.isbn.trim().to_string();
        self
    }
}

/// Partial update; absent fields keep their current value.
///
/// Setting `quantity` is a librarian correction of the shelf count.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateBookRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Author must be between 1 and 200 characters"))]
    pub author: Option<String>,
    #[validate(length(min = 1, max = 13, message = "ISBN must be between 1 and 13 characters"))]
    pub isbn: Option<String>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i32>,
}

impl UpdateBookRequest {
    fn trimmed(mut self) -> Self {
        let trim = |v: Option<String>| v.map(|s| s.trim().to_string());
        self.title = trim(self.title);
        self.author = trim(self.author);
        self.isbn = trim(self.isbn);
        self
    }
}

#[derive(Debug, Clone)]
pub struct BookListing {
    pub books: Vec<BookModel>,
    pub total_books: u64,
    pub available_books: u64,
}

/// Service for managing the book catalog
#[derive(Clone)]
pub struct CatalogService {
    books: BookRepository,
    event_sender: Arc<EventSender>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            books: BookRepository::new(db_pool),
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn create_book(&self, request: CreateBookRequest) -> Result<BookModel, ServiceError> {
        let request = request.trimmed();
        request.validate()?;

        let created = self
            .books
            .create(book::ActiveModel {
                title: Set(request.title),
                author: Set(request.author),
                isbn: Set(request.isbn),
                quantity: Set(request.quantity),
                ..Default::default()
            })
            .await?;

        info!(book_id = created.id, quantity = created.quantity, "book created");
        self.event_sender
            .send_or_log(Event::BookCreated(created.id))
            .await;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_book(&self, id: i32) -> Result<BookModel, ServiceError> {
        self.books
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Book {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn update_book(
        &self,
        id: i32,
        request: UpdateBookRequest,
    ) -> Result<BookModel, ServiceError> {
        let request = request.trimmed();
        request.validate()?;

        let existing = self.get_book(id).await?;
        let previous_quantity = existing.quantity;
        let mut active: book::ActiveModel = existing.into();
        if let Some(title) = request.title {
            active.title = Set(title);
        }
        if let Some(author) = request.author {
            active.author = Set(author);
        }
        if let Some(isbn) = request.isbn {
            active.isbn = Set(isbn);
        }
        if let Some(quantity) = request.quantity {
            active.quantity = Set(quantity);
        }

        let updated = self.books.update(active).await?;
        if updated.quantity != previous_quantity {
            info!(
                book_id = id,
                from = previous_quantity,
                to = updated.quantity,
                "shelf quantity corrected"
            );
        }
        self.event_sender.send_or_log(Event::BookUpdated(id)).await;
        Ok(updated)
    }

    /// Removes the book and all of its loan records
    #[instrument(skip(self))]
    pub async fn delete_book(&self, id: i32) -> Result<(), ServiceError> {
        if !self.books.delete_with_loans(id).await? {
            return Err(ServiceError::NotFound(format!("Book {} not found", id)));
        }

        info!(book_id = id, "book deleted");
        self.event_sender.send_or_log(Event::BookDeleted(id)).await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_books(
        &self,
        availability: BookAvailability,
    ) -> Result<BookListing, ServiceError> {
        let books = self.books.find_all(availability).await?;
        let total_books = self.books.count().await?;
        let available_books = self.books.count_available().await?;

        Ok(BookListing {
            books,
            total_books,
            available_books,
        })
    }
}

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::entities::book::{ActiveModel as BookActiveModel, Column, Entity as Book, Model as BookModel};
use crate::entities::issued_book::{self, Entity as IssuedBook};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

/// Shelf-availability filter for catalog listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookAvailability {
    #[default]
    All,
    /// At least one copy on the shelf
    Available,
    /// No copies on the shelf
    Unavailable,
}

/// Repository for catalog operations
#[derive(Debug, Clone)]
pub struct BookRepository {
    base: BaseRepository,
}

impl BookRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find a book by ID
    pub async fn find_by_id(&self, id: i32) -> Result<Option<BookModel>, ServiceError> {
        Book::find_by_id(id)
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Books newest first, optionally restricted by shelf availability
    pub async fn find_all(
        &self,
        availability: BookAvailability,
    ) -> Result<Vec<BookModel>, ServiceError> {
        let query = match availability {
            BookAvailability::All => Book::find(),
            BookAvailability::Available => Book::find().filter(Column::Quantity.gt(0)),
            BookAvailability::Unavailable => Book::find().filter(Column::Quantity.eq(0)),
        };

        query
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn count(&self) -> Result<u64, ServiceError> {
        Book::find()
            .count(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Number of titles with at least one copy on the shelf
    pub async fn count_available(&self) -> Result<u64, ServiceError> {
        Book::find()
            .filter(Column::Quantity.gt(0))
            .count(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Create a new book
    pub async fn create(&self, book: BookActiveModel) -> Result<BookModel, ServiceError> {
        book.insert(self.base.get_db())
            .await
            .map_err(|e| ServiceError::from_write(e, "A book with this ISBN"))
    }

    /// Update a book
    pub async fn update(&self, book: BookActiveModel) -> Result<BookModel, ServiceError> {
        book.update(self.base.get_db())
            .await
            .map_err(|e| ServiceError::from_write(e, "A book with this ISBN"))
    }

    /// Deletes a book together with every loan record that references it.
    /// Returns `false` when no such book exists.
    pub async fn delete_with_loans(&self, id: i32) -> Result<bool, ServiceError> {
        let txn = self.base.get_db().begin().await?;

        IssuedBook::delete_many()
            .filter(issued_book::Column::BookId.eq(id))
            .exec(&txn)
            .await?;
        let deleted = Book::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(deleted.rows_affected > 0)
    }
}

impl Repository for BookRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}

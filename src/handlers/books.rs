use super::common::{
    created_response, into_responses, message_response, success_response, BookResponse,
};
use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::{
    auth::Librarian,
    errors::ServiceError,
    repositories::BookAvailability,
    services::{CreateBookRequest, UpdateBookRequest},
    AppState,
};
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookListQuery {
    /// all | available | unavailable
    #[serde(default)]
    pub status: BookAvailability,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookListResponse {
    pub books: Vec<BookResponse>,
    pub filter_status: BookAvailability,
    pub total_books: u64,
    pub available_books: u64,
}

pub fn books_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/:id", get(get_book).put(update_book).delete(delete_book))
}

#[utoipa::path(
    get,
    path = "/api/v1/books",
    params(BookListQuery),
    responses(
        (status = 200, description = "Catalog listing", body = BookListResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "books"
)]
pub async fn list_books(
    _librarian: Librarian,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<BookListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let listing = state.services.catalog.list_books(query.status).await?;
    Ok(success_response(BookListResponse {
        books: into_responses(listing.books),
        filter_status: query.status,
        total_books: listing.total_books,
        available_books: listing.available_books,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 409, description = "ISBN already in the catalog", body = crate::errors::ErrorResponse)
    ),
    tag = "books"
)]
pub async fn create_book(
    _librarian: Librarian,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateBookRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let book = state.services.catalog.create_book(payload).await?;
    let message = format!("Book '{}' created successfully!", book.title);
    Ok(created_response(BookResponse::from(book), message))
}

#[utoipa::path(
    get,
    path = "/api/v1/books/{id}",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book found", body = BookResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::errors::ErrorResponse)
    ),
    tag = "books"
)]
pub async fn get_book(
    _librarian: Librarian,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(success_response(BookResponse::from(book)))
}

#[utoipa::path(
    put,
    path = "/api/v1/books/{id}",
    params(("id" = i32, Path, description = "Book ID")),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "ISBN already in the catalog", body = crate::errors::ErrorResponse)
    ),
    tag = "books"
)]
pub async fn update_book(
    _librarian: Librarian,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateBookRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let book = state.services.catalog.update_book(id, payload).await?;
    let message = format!("Book '{}' updated successfully!", book.title);
    Ok(message_response(BookResponse::from(book), message))
}

#[utoipa::path(
    delete,
    path = "/api/v1/books/{id}",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book and its loan records deleted"),
        (status = 404, description = "Book not found", body = crate::errors::ErrorResponse)
    ),
    tag = "books"
)]
pub async fn delete_book(
    _librarian: Librarian,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let book = state.services.catalog.get_book(id).await?;
    state.services.catalog.delete_book(id).await?;
    Ok(message_response(
        (),
        format!("Book '{}' deleted successfully!", book.title),
    ))
}

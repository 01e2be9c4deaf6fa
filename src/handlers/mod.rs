use crate::AppState;
use axum::Router;

pub mod books;
pub mod common;
pub mod dashboard;
pub mod extract;
pub mod health;
pub mod loans;
pub mod students;

/// Routes mounted under `/api/v1`
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/books", books::books_routes())
        .nest("/students", students::students_routes())
        .nest("/loans", loans::loans_routes())
        .nest("/dashboard", dashboard::dashboard_routes())
}

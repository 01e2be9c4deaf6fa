use crate::{
    entities::{book, issued_book, student, Department},
    lending::LoanStatus,
    ApiResponse,
};
use axum::{http::StatusCode, Json};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 200 with the standard envelope
pub fn success_response<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

/// 200 with the standard envelope and a confirmation message
pub fn message_response<T: Serialize>(
    data: T,
    message: impl Into<String>,
) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::OK,
        Json(ApiResponse::with_message(data, message.into())),
    )
}

/// 201 with the standard envelope and a confirmation message
pub fn created_response<T: Serialize>(
    data: T,
    message: impl Into<String>,
) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::CREATED,
        Json(ApiResponse::with_message(data, message.into())),
    )
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookResponse {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    /// Copies currently on the shelf
    pub quantity: i32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<book::Model> for BookResponse {
    fn from(model: book::Model) -> Self {
        Self {
            is_available: model.is_available(),
            id: model.id,
            title: model.title,
            author: model.author,
            isbn: model.isbn,
            quantity: model.quantity,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentResponse {
    pub id: i32,
    pub name: String,
    pub id_number: String,
    pub department: Department,
    pub phone_number: String,
}

impl From<student::Model> for StudentResponse {
    fn from(model: student::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            id_number: model.id_number,
            department: model.department,
            phone_number: model.phone_number,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanResponse {
    pub id: i32,
    pub book_id: i32,
    pub student_id: i32,
    /// Copies still outstanding
    pub quantity: i32,
    pub issue_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub is_returned: bool,
    pub status: LoanStatus,
}

impl From<issued_book::Model> for LoanResponse {
    fn from(model: issued_book::Model) -> Self {
        Self {
            status: LoanStatus::of(&model),
            id: model.id,
            book_id: model.book_id,
            student_id: model.student_id,
            quantity: model.quantity,
            issue_date: model.issue_date,
            return_date: model.return_date,
            is_returned: model.is_returned,
        }
    }
}

pub(crate) fn into_responses<M, R: From<M>>(models: Vec<M>) -> Vec<R> {
    models.into_iter().map(R::from).collect()
}

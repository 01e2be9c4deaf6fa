use super::common::{into_responses, message_response, success_response, BookResponse, LoanResponse, StudentResponse};
use super::extract::ApiQuery;
use crate::{
    auth::{Caller, Librarian},
    errors::ServiceError,
    repositories::{BookAvailability, LoanWithNames},
    AppState,
};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecentIssue {
    pub loan_id: i32,
    pub book_title: Option<String>,
    pub student_name: Option<String>,
    pub quantity: i32,
    pub issue_date: NaiveDate,
    pub is_returned: bool,
}

impl From<LoanWithNames> for RecentIssue {
    fn from(row: LoanWithNames) -> Self {
        Self {
            loan_id: row.loan.id,
            book_title: row.book_title,
            student_name: row.student_name,
            quantity: row.loan.quantity,
            issue_date: row.loan.issue_date,
            is_returned: row.loan.is_returned,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LibrarianDashboardResponse {
    pub total_books: u64,
    pub total_students: u64,
    pub available_books: u64,
    pub active_issues: u64,
    pub recent_issues: Vec<RecentIssue>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentDashboardQuery {
    /// all | available | unavailable
    #[serde(default)]
    pub status: BookAvailability,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StudentDashboardResponse {
    pub student: Option<StudentResponse>,
    pub active_borrowed: Vec<LoanResponse>,
    pub borrowed_history: Vec<LoanResponse>,
    pub total_borrowed: u64,
    pub books: Vec<BookResponse>,
    pub filter_status: BookAvailability,
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/librarian", get(librarian_dashboard))
        .route("/student", get(student_dashboard))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/librarian",
    responses(
        (status = 200, description = "Library statistics", body = LibrarianDashboardResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "dashboard"
)]
pub async fn librarian_dashboard(
    _librarian: Librarian,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let dashboard = state.services.dashboard.librarian_dashboard().await?;
    Ok(success_response(LibrarianDashboardResponse {
        total_books: dashboard.total_books,
        total_students: dashboard.total_students,
        available_books: dashboard.available_books,
        active_issues: dashboard.active_issues,
        recent_issues: into_responses(dashboard.recent_issues),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/student",
    params(StudentDashboardQuery),
    responses(
        (status = 200, description = "The caller's loans and the catalog", body = StudentDashboardResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "dashboard"
)]
pub async fn student_dashboard(
    caller: Caller,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StudentDashboardQuery>,
) -> Result<Response, ServiceError> {
    let dashboard = state
        .services
        .dashboard
        .student_dashboard(&caller.username, query.status)
        .await?;

    let body = StudentDashboardResponse {
        student: dashboard.student.map(StudentResponse::from),
        active_borrowed: into_responses(dashboard.active_loans),
        borrowed_history: into_responses(dashboard.loan_history),
        total_borrowed: dashboard.total_borrowed,
        books: into_responses(dashboard.books),
        filter_status: dashboard.filter_status,
    };

    Ok(match dashboard.message {
        Some(message) => message_response(body, message).into_response(),
        None => success_response(body).into_response(),
    })
}

use super::common::{
    created_response, into_responses, message_response, success_response, LoanResponse,
    StudentResponse,
};
use super::extract::{ApiJson, ApiPath};
use crate::{
    auth::Librarian,
    errors::ServiceError,
    services::{CreateStudentRequest, UpdateStudentRequest},
    AppState,
};
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StudentListResponse {
    pub students: Vec<StudentResponse>,
    pub total_students: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StudentDetailResponse {
    pub student: StudentResponse,
    /// All loan records, newest first
    pub issued_books: Vec<LoanResponse>,
    pub active_issues: Vec<LoanResponse>,
    pub active_count: usize,
}

pub fn students_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route(
            "/:id",
            get(student_detail).put(update_student).delete(delete_student),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/students",
    responses(
        (status = 200, description = "Roster ordered by ID number", body = StudentListResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "students"
)]
pub async fn list_students(
    _librarian: Librarian,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let listing = state.services.roster.list_students().await?;
    Ok(success_response(StudentListResponse {
        students: into_responses(listing.students),
        total_students: listing.total_students,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/students",
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student created", body = StudentResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "ID number already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "students"
)]
pub async fn create_student(
    _librarian: Librarian,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateStudentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let student = state.services.roster.create_student(payload).await?;
    let message = format!("Student '{}' created successfully!", student.name);
    Ok(created_response(StudentResponse::from(student), message))
}

#[utoipa::path(
    get,
    path = "/api/v1/students/{id}",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student with borrowing history", body = StudentDetailResponse),
        (status = 404, description = "Student not found", body = crate::errors::ErrorResponse)
    ),
    tag = "students"
)]
pub async fn student_detail(
    _librarian: Librarian,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.roster.student_detail(id).await?;
    let active_count = detail.active_count();
    Ok(success_response(StudentDetailResponse {
        student: detail.student.into(),
        issued_books: into_responses(detail.loans),
        active_issues: into_responses(detail.active_loans),
        active_count,
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/students/{id}",
    params(("id" = i32, Path, description = "Student ID")),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Student updated", body = StudentResponse),
        (status = 404, description = "Student not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "ID number already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "students"
)]
pub async fn update_student(
    _librarian: Librarian,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateStudentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let student = state.services.roster.update_student(id, payload).await?;
    let message = format!("Student '{}' updated successfully!", student.name);
    Ok(message_response(StudentResponse::from(student), message))
}

#[utoipa::path(
    delete,
    path = "/api/v1/students/{id}",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student and their loan records deleted"),
        (status = 404, description = "Student not found", body = crate::errors::ErrorResponse)
    ),
    tag = "students"
)]
pub async fn delete_student(
    _librarian: Librarian,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let student = state.services.roster.get_student(id).await?;
    state.services.roster.delete_student(id).await?;
    Ok(message_response(
        (),
        format!("Student '{}' deleted successfully!", student.name),
    ))
}

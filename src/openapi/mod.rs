use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library API",
        version = "0.1.0",
        description = r#"
# Library Lending API

Manages the book catalog, the student roster and the copies lent out to students.

## Authentication

Requests carry the caller identity resolved by the fronting proxy:

```
x-auth-user: <username>
x-auth-role: librarian | student
```

Catalog, roster and loan endpoints are restricted to librarians.

## Error Handling

Errors share one body shape. Stock and return conflicts carry the count the caller must respect:

```json
{
  "error": "Unprocessable Entity",
  "code": "insufficient_stock",
  "message": "Not enough books available. Available: 2",
  "details": { "book_id": 1, "available": 2 }
}
```
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "http://localhost:8080", description = "Local development")),
    tags(
        (name = "books", description = "Book catalog"),
        (name = "students", description = "Student roster"),
        (name = "loans", description = "Issuing and returning copies"),
        (name = "dashboard", description = "Librarian and student summaries"),
        (name = "health", description = "Liveness and metrics")
    ),
    paths(
        crate::handlers::books::list_books,
        crate::handlers::books::create_book,
        crate::handlers::books::get_book,
        crate::handlers::books::update_book,
        crate::handlers::books::delete_book,

        crate::handlers::students::list_students,
        crate::handlers::students::create_student,
        crate::handlers::students::student_detail,
        crate::handlers::students::update_student,
        crate::handlers::students::delete_student,

        crate::handlers::loans::list_loans,
        crate::handlers::loans::issue_book,
        crate::handlers::loans::get_loan,
        crate::handlers::loans::return_book,

        crate::handlers::dashboard::librarian_dashboard,
        crate::handlers::dashboard::student_dashboard,

        crate::handlers::health::health,
        crate::handlers::health::metrics_text,
    ),
    components(
        schemas(
            crate::handlers::common::BookResponse,
            crate::handlers::common::StudentResponse,
            crate::handlers::common::LoanResponse,
            crate::handlers::books::BookListResponse,
            crate::handlers::students::StudentListResponse,
            crate::handlers::students::StudentDetailResponse,
            crate::handlers::loans::LoanListResponse,
            crate::handlers::loans::ReturnBookRequest,
            crate::handlers::loans::ReturnResponse,
            crate::handlers::dashboard::RecentIssue,
            crate::handlers::dashboard::LibrarianDashboardResponse,
            crate::handlers::dashboard::StudentDashboardResponse,
            crate::handlers::health::HealthStatus,
            crate::services::CreateBookRequest,
            crate::services::UpdateBookRequest,
            crate::services::CreateStudentRequest,
            crate::services::UpdateStudentRequest,
            crate::commands::loans::IssueBookCommand,
            crate::lending::LoanReceipt,
            crate::lending::LoanStatus,
            crate::entities::Department,
            crate::repositories::BookAvailability,
            crate::repositories::LoanStatusFilter,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

/// Serves the generated document as JSON
pub fn openapi_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route(OPENAPI_JSON_PATH, get(|| async { Json(ApiDocV1::openapi()) }))
}

use super::common::{
    created_response, into_responses, message_response, success_response, LoanResponse,
};
use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::{
    auth::Librarian,
    commands::loans::IssueBookCommand,
    errors::ServiceError,
    lending::{LoanReceipt, ReturnOutcome, ALREADY_RETURNED_MESSAGE},
    repositories::LoanStatusFilter,
    AppState,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoanListQuery {
    /// all | active | returned
    #[serde(default)]
    pub status: LoanStatusFilter,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoanListResponse {
    pub loans: Vec<LoanResponse>,
    pub filter_status: LoanStatusFilter,
    /// Loans still open
    pub total_issued: u64,
    pub total_returned: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReturnBookRequest {
    /// Copies being handed back, at least 1
    #[schema(minimum = 1, example = 1)]
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReturnResponse {
    pub receipt: LoanReceipt,
    /// Copies taken back by this request; 0 when the loan was already closed
    pub returned_quantity: i32,
    pub already_returned: bool,
}

pub fn loans_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_loans).post(issue_book))
        .route("/:id", get(get_loan))
        .route("/:id/return", post(return_book))
}

#[utoipa::path(
    get,
    path = "/api/v1/loans",
    params(LoanListQuery),
    responses(
        (status = 200, description = "Loans, newest issue date first", body = LoanListResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "loans"
)]
pub async fn list_loans(
    _librarian: Librarian,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LoanListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let listing = state.services.loans.list_loans(query.status).await?;
    Ok(success_response(LoanListResponse {
        loans: into_responses(listing.loans),
        filter_status: query.status,
        total_issued: listing.total_issued,
        total_returned: listing.total_returned,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/loans",
    request_body = IssueBookCommand,
    responses(
        (status = 201, description = "Copies lent out", body = LoanReceipt),
        (status = 400, description = "Quantity not a whole number of at least 1, or malformed body", body = crate::errors::ErrorResponse),
        (status = 404, description = "Book or student not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Not enough copies on the shelf", body = crate::errors::ErrorResponse)
    ),
    tag = "loans"
)]
pub async fn issue_book(
    _librarian: Librarian,
    State(state): State<AppState>,
    ApiJson(command): ApiJson<IssueBookCommand>,
) -> Result<impl IntoResponse, ServiceError> {
    // Resolved up front so nothing is committed if the lookup fails.
    let student = state.services.roster.get_student(command.student_id).await?;
    let change = state.services.loans.issue_book(command).await?;

    let message = format!(
        "Book '{}' issued to '{}' ({} copies)",
        change.book.title, student.name, change.loan.quantity
    );
    Ok(created_response(change.receipt(), message))
}

#[utoipa::path(
    get,
    path = "/api/v1/loans/{id}",
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan found", body = LoanResponse),
        (status = 404, description = "Loan not found", body = crate::errors::ErrorResponse)
    ),
    tag = "loans"
)]
pub async fn get_loan(
    _librarian: Librarian,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let loan = state.services.loans.get_loan(id).await?;
    Ok(success_response(LoanResponse::from(loan)))
}

#[utoipa::path(
    post,
    path = "/api/v1/loans/{id}/return",
    params(("id" = i32, Path, description = "Loan ID")),
    request_body = ReturnBookRequest,
    responses(
        (status = 200, description = "Copies returned, or warning that the loan was already closed", body = ReturnResponse),
        (status = 400, description = "Quantity not a whole number of at least 1, or malformed body", body = crate::errors::ErrorResponse),
        (status = 404, description = "Loan not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "More copies than outstanding", body = crate::errors::ErrorResponse)
    ),
    tag = "loans"
)]
pub async fn return_book(
    _librarian: Librarian,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<ReturnBookRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state.services.loans.return_book(id, payload.quantity).await?;

    let response = match outcome {
        ReturnOutcome::Returned {
            change,
            returned_quantity,
        } => {
            let message = format!(
                "'{}' copy/copies of '{}' returned successfully!",
                returned_quantity, change.book.title
            );
            message_response(
                ReturnResponse {
                    receipt: change.receipt(),
                    returned_quantity,
                    already_returned: false,
                },
                message,
            )
        }
        ReturnOutcome::AlreadyReturned { change } => message_response(
            ReturnResponse {
                receipt: change.receipt(),
                returned_quantity: 0,
                already_returned: true,
            },
            ALREADY_RETURNED_MESSAGE,
        ),
    };
    Ok(response)
}

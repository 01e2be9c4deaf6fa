use crate::{
    commands::{
        loans::{IssueBookCommand, ReturnBookCommand},
        Command,
    },
    db::DbPool,
    entities::issued_book::Model as LoanModel,
    errors::ServiceError,
    events::EventSender,
    lending::{LoanChange, ReturnOutcome},
    repositories::{LoanRepository, LoanStatusFilter},
};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct LoanListing {
    pub loans: Vec<LoanModel>,
    /// Loans still open
    pub total_issued: u64,
    pub total_returned: u64,
}

/// Service for the loan ledger: issuing, returning and browsing loans
#[derive(Clone)]
pub struct LoanService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    loans: LoanRepository,
}

impl LoanService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            loans: LoanRepository::new(db_pool.clone()),
            db_pool,
            event_sender,
        }
    }

    /// Lends copies of a book, dated today (UTC)
    #[instrument(skip(self))]
    pub async fn issue_book(&self, command: IssueBookCommand) -> Result<LoanChange, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Lends copies of a book with an explicit issue date
    #[instrument(skip(self))]
    pub async fn issue_book_on(
        &self,
        command: IssueBookCommand,
        today: NaiveDate,
    ) -> Result<LoanChange, ServiceError> {
        command
            .execute_on(self.db_pool.clone(), self.event_sender.clone(), today)
            .await
    }

    /// Takes back copies of a loan, closing it today (UTC) when nothing stays out
    #[instrument(skip(self))]
    pub async fn return_book(
        &self,
        loan_id: i32,
        quantity: i32,
    ) -> Result<ReturnOutcome, ServiceError> {
        ReturnBookCommand::new(loan_id, quantity)
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn return_book_on(
        &self,
        loan_id: i32,
        quantity: i32,
        today: NaiveDate,
    ) -> Result<ReturnOutcome, ServiceError> {
        ReturnBookCommand::new(loan_id, quantity)
            .execute_on(self.db_pool.clone(), self.event_sender.clone(), today)
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_loan(&self, id: i32) -> Result<LoanModel, ServiceError> {
        self.loans
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Loan {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_loans(&self, status: LoanStatusFilter) -> Result<LoanListing, ServiceError> {
        let loans = self.loans.find_all(status).await?;
        let total_issued = self.loans.count_by_returned(false).await?;
        let total_returned = self.loans.count_by_returned(true).await?;

        Ok(LoanListing {
            loans,
            total_issued,
            total_returned,
        })
    }
}

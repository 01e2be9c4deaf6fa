use crate::commands::{transaction_error, with_lock_retry, Command, RetryConfig};
use crate::{
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    lending::{LoanChange, LoanLifecycle, Quantity},
    metrics::{self, BOOKS_ISSUED, COPIES_ISSUED},
    repositories::SeaOrmLendingStore,
};
use chrono::{NaiveDate, Utc};
use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

/// Lend copies of a book to a student
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssueBookCommand {
    pub book_id: i32,
    pub student_id: i32,
    /// Number of copies to lend, at least 1
    #[schema(minimum = 1, example = 1)]
    pub quantity: i32,
}

impl IssueBookCommand {
    pub fn new(book_id: i32, student_id: i32, quantity: i32) -> Self {
        Self {
            book_id,
            student_id,
            quantity,
        }
    }

    /// Runs the issue with an explicit calendar date for the new loan.
    #[instrument(skip(self, db_pool, event_sender), fields(book_id = self.book_id, student_id = self.student_id))]
    pub async fn execute_on(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        today: NaiveDate,
    ) -> Result<LoanChange, ServiceError> {
        let result = self.issue_in_db(db_pool.as_ref(), today).await;

        let change = match result {
            Ok(change) => change,
            Err(e) => {
                metrics::record_failure("issue", &e);
                if e.status_code().is_server_error() {
                    error!(error = %e, "failed to issue book");
                }
                return Err(e);
            }
        };

        BOOKS_ISSUED.inc();
        COPIES_ISSUED.inc_by(change.loan.quantity as u64);

        event_sender
            .send_or_log(Event::BookIssued {
                loan_id: change.loan.id,
                book_id: change.book.id,
                student_id: change.loan.student_id,
                quantity: change.loan.quantity,
            })
            .await;

        info!(
            loan_id = change.loan.id,
            available_stock = change.book.quantity,
            "issue committed"
        );
        Ok(change)
    }

    async fn issue_in_db(&self, db: &DbPool, today: NaiveDate) -> Result<LoanChange, ServiceError> {
        let quantity = Quantity::new(self.quantity)?;
        let book_id = self.book_id;
        let student_id = self.student_id;

        with_lock_retry(&RetryConfig::default(), move || async move {
            db.transaction::<_, LoanChange, ServiceError>(move |txn| {
                Box::pin(async move {
                    let store = SeaOrmLendingStore::new(txn);
                    LoanLifecycle::new(&store)
                        .issue(book_id, student_id, quantity, today)
                        .await
                })
            })
            .await
            .map_err(transaction_error)
        })
        .await
    }
}

#[async_trait::async_trait]
impl Command for IssueBookCommand {
    type Result = LoanChange;

    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.execute_on(db_pool, event_sender, Utc::now().date_naive())
            .await
    }
}

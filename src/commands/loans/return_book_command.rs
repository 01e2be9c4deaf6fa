use crate::commands::{transaction_error, with_lock_retry, Command, RetryConfig};
use crate::{
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    lending::{LoanLifecycle, Quantity, ReturnOutcome},
    metrics::{self, BOOK_RETURNS, COPIES_RETURNED, LOANS_CLOSED},
    repositories::SeaOrmLendingStore,
};
use chrono::{NaiveDate, Utc};
use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Take back some or all outstanding copies of a loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnBookCommand {
    pub loan_id: i32,
    pub quantity: i32,
}

impl ReturnBookCommand {
    pub fn new(loan_id: i32, quantity: i32) -> Self {
        Self { loan_id, quantity }
    }

    /// Runs the return, closing the loan on `today` if nothing stays out.
    #[instrument(skip(self, db_pool, event_sender), fields(loan_id = self.loan_id))]
    pub async fn execute_on(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        today: NaiveDate,
    ) -> Result<ReturnOutcome, ServiceError> {
        let outcome = match self.return_in_db(db_pool.as_ref(), today).await {
            Ok(outcome) => outcome,
            Err(e) => {
                metrics::record_failure("return", &e);
                if e.status_code().is_server_error() {
                    error!(error = %e, "failed to return book");
                }
                return Err(e);
            }
        };

        if let ReturnOutcome::Returned {
            change,
            returned_quantity,
        } = &outcome
        {
            BOOK_RETURNS.inc();
            COPIES_RETURNED.inc_by(*returned_quantity as u64);
            if change.loan.is_returned {
                LOANS_CLOSED.inc();
            }

            event_sender
                .send_or_log(Event::BookReturned {
                    loan_id: change.loan.id,
                    book_id: change.book.id,
                    quantity: *returned_quantity,
                    closed: change.loan.is_returned,
                })
                .await;

            info!(
                outstanding = change.loan.quantity,
                available_stock = change.book.quantity,
                "return committed"
            );
        }

        Ok(outcome)
    }

    async fn return_in_db(
        &self,
        db: &DbPool,
        today: NaiveDate,
    ) -> Result<ReturnOutcome, ServiceError> {
        let quantity = Quantity::new(self.quantity)?;
        let loan_id = self.loan_id;

        with_lock_retry(&RetryConfig::default(), move || async move {
            db.transaction::<_, ReturnOutcome, ServiceError>(move |txn| {
                Box::pin(async move {
                    let store = SeaOrmLendingStore::new(txn);
                    LoanLifecycle::new(&store)
                        .partial_return(loan_id, quantity, today)
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
impl Command for ReturnBookCommand {
    type Result = ReturnOutcome;

    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.execute_on(db_pool, event_sender, Utc::now().date_naive())
            .await
    }
}

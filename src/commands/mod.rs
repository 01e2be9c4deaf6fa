use crate::{db::DbPool, errors::ServiceError, events::EventSender};
use async_trait::async_trait;
use sea_orm::TransactionError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

pub mod loans;

/// Command trait for implementing the Command Pattern
///
/// A command carries its validated input and performs one business
/// operation inside a single database transaction, publishing domain events
/// once the transaction has committed.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    /// Execute the command with the given dependencies
    ///
    /// # Arguments
    /// * `db_pool` - Database connection pool for persistence operations
    /// * `event_sender` - Channel to publish domain events
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError>;
}

/// Flattens the error of `DatabaseConnection::transaction`.
pub(crate) fn transaction_error(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}

/// Backoff for reruns after a lock conflict
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(200),
        }
    }
}

/// Reruns a whole unit of work while the database reports a lock conflict.
///
/// Any other outcome, success or failure, is returned as is.
pub(crate) async fn with_lock_retry<F, Fut, T>(
    config: &RetryConfig,
    mut unit_of_work: F,
) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let mut delay = config.initial_delay;
    let mut attempts = 0;

    loop {
        attempts += 1;
        match unit_of_work().await {
            Err(e) if e.is_lock_conflict() && attempts < config.max_attempts => {
                debug!(attempts, error = %e, "lock conflict, rerunning transaction");
                sleep(delay).await;
                delay = (delay * 2).min(config.max_delay);
            }
            Err(e) => {
                if e.is_lock_conflict() {
                    warn!(attempts, error = %e, "giving up after repeated lock conflicts");
                }
                return Err(e);
            }
            Ok(value) => return Ok(value),
        }
    }
}

/*!
 * # Metrics
 *
 * Prometheus counters for the lending workflow, registered in a crate-wide
 * registry and exposed in the text format at `/metrics`.
 */

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::error;

use crate::errors::ServiceError;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref BOOKS_ISSUED: IntCounter =
        IntCounter::new("library_loans_issued_total", "Total number of loans opened")
            .expect("metric can be created");
    pub static ref COPIES_ISSUED: IntCounter = IntCounter::new(
        "library_copies_issued_total",
        "Total number of copies lent out"
    )
    .expect("metric can be created");
    pub static ref BOOK_RETURNS: IntCounter = IntCounter::new(
        "library_returns_total",
        "Total number of accepted return requests"
    )
    .expect("metric can be created");
    pub static ref COPIES_RETURNED: IntCounter = IntCounter::new(
        "library_copies_returned_total",
        "Total number of copies returned to the shelf"
    )
    .expect("metric can be created");
    pub static ref LOANS_CLOSED: IntCounter = IntCounter::new(
        "library_loans_closed_total",
        "Total number of loans fully returned"
    )
    .expect("metric can be created");
    pub static ref LENDING_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "library_lending_failures_total",
            "Total number of rejected issue or return requests"
        ),
        &["operation", "error_type"]
    )
    .expect("metric can be created");
}

/// Registers the lending counters. Safe to call more than once.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(BOOKS_ISSUED.clone()),
        Box::new(COPIES_ISSUED.clone()),
        Box::new(BOOK_RETURNS.clone()),
        Box::new(COPIES_RETURNED.clone()),
        Box::new(LOANS_CLOSED.clone()),
        Box::new(LENDING_FAILURES.clone()),
    ];
    for collector in collectors {
        if let Err(e) = REGISTRY.register(collector) {
            if !matches!(e, prometheus::Error::AlreadyReg) {
                error!("Failed to register metric: {}", e);
            }
        }
    }
}

/// Counts a rejected lifecycle request under its error code
pub fn record_failure(operation: &str, err: &ServiceError) {
    LENDING_FAILURES
        .with_label_values(&[operation, err.code()])
        .inc();
}

/// Renders every registered metric in the Prometheus text format
pub fn gather_text() -> Result<String, ServiceError> {
    register_metrics();

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| ServiceError::InternalError(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| ServiceError::InternalError(format!("Metrics are not UTF-8: {}", e)))
}

use crate::{db::DbPool, events::EventSender};
use std::sync::Arc;

pub mod catalog;
pub mod dashboard;
pub mod loans;
pub mod roster;

pub use catalog::{BookListing, CatalogService, CreateBookRequest, UpdateBookRequest};
pub use dashboard::{DashboardService, LibrarianDashboard, StudentDashboard};
pub use loans::{LoanListing, LoanService};
pub use roster::{
    CreateStudentRequest, RosterService, StudentDetail, StudentListing, UpdateStudentRequest,
};

/// Every service the HTTP layer talks to
#[derive(Clone)]
pub struct AppServices {
    pub catalog: CatalogService,
    pub roster: RosterService,
    pub loans: LoanService,
    pub dashboard: DashboardService,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        recent_issues_limit: u64,
    ) -> Self {
        Self {
            catalog: CatalogService::new(db_pool.clone(), event_sender.clone()),
            roster: RosterService::new(db_pool.clone(), event_sender.clone()),
            loans: LoanService::new(db_pool.clone(), event_sender),
            dashboard: DashboardService::new(db_pool, recent_issues_limit),
        }
    }
}

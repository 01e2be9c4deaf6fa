use crate::{
    db::DbPool,
    entities::{book::Model as BookModel, issued_book::Model as LoanModel, student::Model as StudentModel},
    errors::ServiceError,
    repositories::{
        BookAvailability, BookRepository, LoanRepository, LoanWithNames, StudentRepository,
    },
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Shown when an account has no matching roster entry
pub const NO_STUDENT_PROFILE_MESSAGE: &str =
    "No student profile found for your account. Please contact the librarian.";

#[derive(Debug, Clone)]
pub struct LibrarianDashboard {
    pub total_books: u64,
    pub total_students: u64,
    /// Titles with at least one copy on the shelf
    pub available_books: u64,
    /// Loans not yet fully returned
    pub active_issues: u64,
    pub recent_issues: Vec<LoanWithNames>,
}

#[derive(Debug, Clone)]
pub struct StudentDashboard {
    pub student: Option<StudentModel>,
    pub message: Option<String>,
    pub active_loans: Vec<LoanModel>,
    pub loan_history: Vec<LoanModel>,
    pub total_borrowed: u64,
    pub books: Vec<BookModel>,
    pub filter_status: BookAvailability,
}

/// Read-only projections for the dashboards
#[derive(Clone)]
pub struct DashboardService {
    books: BookRepository,
    students: StudentRepository,
    loans: LoanRepository,
    recent_issues_limit: u64,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>, recent_issues_limit: u64) -> Self {
        Self {
            books: BookRepository::new(db_pool.clone()),
            students: StudentRepository::new(db_pool.clone()),
            loans: LoanRepository::new(db_pool),
            recent_issues_limit,
        }
    }

    #[instrument(skip(self))]
    pub async fn librarian_dashboard(&self) -> Result<LibrarianDashboard, ServiceError> {
        Ok(LibrarianDashboard {
            total_books: self.books.count().await?,
            total_students: self.students.count().await?,
            available_books: self.books.count_available().await?,
            active_issues: self.loans.count_by_returned(false).await?,
            recent_issues: self
                .loans
                .find_recent_with_names(self.recent_issues_limit)
                .await?,
        })
    }

    /// Dashboard for the roster entry named `username`, if there is one
    #[instrument(skip(self))]
    pub async fn student_dashboard(
        &self,
        username: &str,
        filter_status: BookAvailability,
    ) -> Result<StudentDashboard, ServiceError> {
        let student = self.students.find_by_name(username).await?;
        let books = self.books.find_all(filter_status).await?;

        let (message, loan_history) = match &student {
            Some(s) => (None, self.loans.find_by_student(s.id).await?),
            None => {
                info!(username, "no roster entry for account");
                (Some(NO_STUDENT_PROFILE_MESSAGE.to_string()), Vec::new())
            }
        };
        let active_loans: Vec<LoanModel> = loan_history
            .iter()
            .filter(|l| !l.is_returned)
            .cloned()
            .collect();

        Ok(StudentDashboard {
            total_borrowed: active_loans.len() as u64,
            student,
            message,
            active_loans,
            loan_history,
            books,
            filter_status,
        })
    }
}

use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod book_repository;
pub mod lending_store;
pub mod loan_repository;
pub mod memory;
pub mod student_repository;

pub use book_repository::{BookAvailability, BookRepository};
pub use lending_store::{LendingStore, NewLoan, SeaOrmLendingStore};
pub use loan_repository::{LoanRepository, LoanStatusFilter, LoanWithNames};
pub use memory::{InMemoryLendingStore, MemoryUnitOfWork};
pub use student_repository::StudentRepository;

/// Repository trait for common database operations
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl Repository for BaseRepository {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};

use super::lending_store::{LendingStore, NewLoan};
use crate::entities::{book, issued_book, student, Department};
use crate::errors::ServiceError;

#[derive(Debug, Default)]
struct MemoryState {
    books: BTreeMap<i32, book::Model>,
    students: BTreeMap<i32, student::Model>,
    loans: BTreeMap<i32, issued_book::Model>,
    last_loan_id: i32,
}

/// Loan lifecycle storage in process memory, for running the engine
/// without a database.
///
/// The engine works on a [`MemoryUnitOfWork`] from [`begin`](Self::begin).
/// Units of work are serialised: the first `*_for_update` lock is in effect
/// held on every row until the unit is dropped. There is no rollback; the
/// engine does all its checks before its first write.
#[derive(Debug, Default)]
pub struct InMemoryLendingStore {
    state: Mutex<MemoryState>,
    writer: AsyncMutex<()>,
}

/// Exclusive access to an [`InMemoryLendingStore`], released on drop
#[derive(Debug)]
pub struct MemoryUnitOfWork<'a> {
    store: &'a InMemoryLendingStore,
    _writer: AsyncMutexGuard<'a, ()>,
}

impl InMemoryLendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for any other unit of work to finish, then starts one.
    pub async fn begin(&self) -> MemoryUnitOfWork<'_> {
        MemoryUnitOfWork {
            store: self,
            _writer: self.writer.lock().await,
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds (or replaces) a book with the given shelf quantity.
    pub fn put_book(&self, id: i32, quantity: i32) -> book::Model {
        let now = Utc::now();
        let model = book::Model {
            id,
            title: format!("Book {}", id),
            author: "Unknown".to_string(),
            isbn: format!("{:013}", id),
            quantity,
            created_at: now,
            updated_at: now,
        };
        self.state().books.insert(id, model.clone());
        model
    }

    /// Adds (or replaces) a student.
    pub fn put_student(&self, id: i32, name: &str) -> student::Model {
        let model = student::Model {
            id,
            name: name.to_string(),
            id_number: format!("S{:05}", id),
            department: Department::Science,
            phone_number: String::new(),
        };
        self.state().students.insert(id, model.clone());
        model
    }

    pub fn book(&self, id: i32) -> Option<book::Model> {
        self.state().books.get(&id).cloned()
    }

    pub fn issued_book(&self, id: i32) -> Option<issued_book::Model> {
        self.state().loans.get(&id).cloned()
    }

    /// All loan records for a book, oldest first.
    pub fn loans_for_book(&self, book_id: i32) -> Vec<issued_book::Model> {
        self.state()
            .loans
            .values()
            .filter(|loan| loan.book_id == book_id)
            .cloned()
            .collect()
    }

    /// Sum of outstanding copies over the book's open loans.
    pub fn outstanding_for_book(&self, book_id: i32) -> i32 {
        self.state()
            .loans
            .values()
            .filter(|loan| loan.book_id == book_id && !loan.is_returned)
            .map(|loan| loan.quantity)
            .sum()
    }
}

#[async_trait]
impl<'a> LendingStore for MemoryUnitOfWork<'a> {
    async fn book_for_update(&self, book_id: i32) -> Result<Option<book::Model>, ServiceError> {
        Ok(self.store.book(book_id))
    }

    async fn student(&self, student_id: i32) -> Result<Option<student::Model>, ServiceError> {
        Ok(self.store.state().students.get(&student_id).cloned())
    }

    async fn loan(&self, loan_id: i32) -> Result<Option<issued_book::Model>, ServiceError> {
        Ok(self.store.issued_book(loan_id))
    }

    async fn loan_for_update(
        &self,
        loan_id: i32,
    ) -> Result<Option<issued_book::Model>, ServiceError> {
        Ok(self.store.issued_book(loan_id))
    }

    async fn set_book_quantity(
        &self,
        book: book::Model,
        quantity: i32,
    ) -> Result<book::Model, ServiceError> {
        let mut state = self.store.state();
        let stored = state
            .books
            .get_mut(&book.id)
            .ok_or_else(|| ServiceError::NotFound(format!("Book {} not found", book.id)))?;
        stored.quantity = quantity;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn insert_loan(&self, loan: NewLoan) -> Result<issued_book::Model, ServiceError> {
        let mut state = self.store.state();
        state.last_loan_id += 1;
        let now = Utc::now();
        let model = issued_book::Model {
            id: state.last_loan_id,
            book_id: loan.book_id,
            student_id: loan.student_id,
            quantity: loan.quantity,
            issue_date: loan.issue_date,
            return_date: None,
            is_returned: false,
            created_at: now,
            updated_at: now,
        };
        state.loans.insert(model.id, model.clone());
        Ok(model)
    }

    async fn update_loan(
        &self,
        loan: issued_book::Model,
    ) -> Result<issued_book::Model, ServiceError> {
        let mut state = self.store.state();
        let stored = state
            .loans
            .get_mut(&loan.id)
            .ok_or_else(|| ServiceError::NotFound(format!("Loan {} not found", loan.id)))?;
        stored.quantity = loan.quantity;
        stored.is_returned = loan.is_returned;
        stored.return_date = loan.return_date;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }
}

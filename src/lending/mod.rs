/*!
 * Loan lifecycle
 *
 * Copies move between a book's shelf count (`books.quantity`) and the
 * outstanding count of its open loans (`issued_books.quantity`). For every
 * book, shelf + outstanding stays constant across issues and returns; only
 * a librarian edit of the book changes it.
 *
 * Both operations validate everything before the first write, so a failed
 * call leaves the store untouched. Locks are always taken Book first, then
 * Loan.
 */

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::entities::{book, issued_book};
use crate::errors::ServiceError;
use crate::repositories::{LendingStore, NewLoan};

/// Warning reported when a closed loan is returned again
pub const ALREADY_RETURNED_MESSAGE: &str = "This book has already been returned!";

/// A strictly positive number of copies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Quantity(i32);

impl Quantity {
    pub fn new(value: i32) -> Result<Self, ServiceError> {
        if value < 1 {
            return Err(ServiceError::InvalidQuantity(format!(
                "Quantity must be at least 1, got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for Quantity {
    type Error = ServiceError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Quantity::new(value)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Returned,
}

impl LoanStatus {
    pub fn of(loan: &issued_book::Model) -> Self {
        if loan.is_returned {
            LoanStatus::Returned
        } else {
            LoanStatus::Active
        }
    }
}

/// What the caller needs to confirm an issue or a return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LoanReceipt {
    pub loan_id: i32,
    pub book_id: i32,
    pub student_id: i32,
    /// Copies still out under this loan
    pub outstanding: i32,
    /// Copies of the book left on the shelf
    pub available_stock: i32,
    pub status: LoanStatus,
    pub issue_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

impl LoanReceipt {
    pub fn new(loan: &issued_book::Model, book: &book::Model) -> Self {
        Self {
            loan_id: loan.id,
            book_id: loan.book_id,
            student_id: loan.student_id,
            outstanding: loan.quantity,
            available_stock: book.quantity,
            status: LoanStatus::of(loan),
            issue_date: loan.issue_date,
            return_date: loan.return_date,
        }
    }
}

/// Loan and book rows as they stand after a lifecycle operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanChange {
    pub loan: issued_book::Model,
    pub book: book::Model,
}

impl LoanChange {
    pub fn receipt(&self) -> LoanReceipt {
        LoanReceipt::new(&self.loan, &self.book)
    }
}

/// Result of `partial_return`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnOutcome {
    Returned {
        change: LoanChange,
        returned_quantity: i32,
    },
    /// The loan was already closed; nothing was changed.
    AlreadyReturned { change: LoanChange },
}

impl ReturnOutcome {
    pub fn change(&self) -> &LoanChange {
        match self {
            ReturnOutcome::Returned { change, .. } | ReturnOutcome::AlreadyReturned { change } => {
                change
            }
        }
    }

    pub fn receipt(&self) -> LoanReceipt {
        self.change().receipt()
    }

    pub fn is_already_returned(&self) -> bool {
        matches!(self, ReturnOutcome::AlreadyReturned { .. })
    }
}

/// Issues and takes back copies against a `LendingStore`.
///
/// The engine itself does not open transactions: callers hand it a store
/// scoped to one unit of work.
pub struct LoanLifecycle<'s, S: ?Sized> {
    store: &'s S,
}

impl<'s, S> LoanLifecycle<'s, S>
where
    S: LendingStore + ?Sized,
{
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Lends `quantity` copies of a book to a student, creating a new loan
    /// record dated `today`.
    #[instrument(skip(self))]
    pub async fn issue(
        &self,
        book_id: i32,
        student_id: i32,
        quantity: Quantity,
        today: NaiveDate,
    ) -> Result<LoanChange, ServiceError> {
        let book = self
            .store
            .book_for_update(book_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Book {} not found", book_id)))?;

        if self.store.student(student_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Student {} not found",
                student_id
            )));
        }

        if quantity.get() > book.quantity {
            warn!(
                book_id,
                requested = quantity.get(),
                available = book.quantity,
                "issue rejected: not enough copies on the shelf"
            );
            return Err(ServiceError::InsufficientStock {
                book_id,
                available: book.quantity,
            });
        }

        let remaining = book.quantity - quantity.get();
        let book = self.store.set_book_quantity(book, remaining).await?;
        let loan = self
            .store
            .insert_loan(NewLoan {
                book_id,
                student_id,
                quantity: quantity.get(),
                issue_date: today,
            })
            .await?;

        info!(
            loan_id = loan.id,
            book_id,
            student_id,
            quantity = quantity.get(),
            available_stock = book.quantity,
            "book issued"
        );

        Ok(LoanChange { loan, book })
    }

    /// Takes back `quantity` copies of an open loan. The loan closes, and
    /// records `today` as its return date, once nothing is outstanding.
    #[instrument(skip(self))]
    pub async fn partial_return(
        &self,
        loan_id: i32,
        quantity: Quantity,
        today: NaiveDate,
    ) -> Result<ReturnOutcome, ServiceError> {
        let not_found = || ServiceError::NotFound(format!("Loan {} not found", loan_id));

        // Unlocked read: only used to find the book, whose lock comes first.
        let book_id = self.store.loan(loan_id).await?.ok_or_else(not_found)?.book_id;

        let book = self
            .store
            .book_for_update(book_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Book {} not found", book_id)))?;
        let mut loan = self
            .store
            .loan_for_update(loan_id)
            .await?
            .ok_or_else(not_found)?;

        if loan.is_returned {
            warn!(loan_id, "return ignored: loan already closed");
            return Ok(ReturnOutcome::AlreadyReturned {
                change: LoanChange { loan, book },
            });
        }

        if quantity.get() > loan.quantity {
            warn!(
                loan_id,
                requested = quantity.get(),
                outstanding = loan.quantity,
                "return rejected: more copies than outstanding"
            );
            return Err(ServiceError::ExcessReturn {
                loan_id,
                outstanding: loan.quantity,
            });
        }

        let restocked = book.quantity.checked_add(quantity.get()).ok_or_else(|| {
            ServiceError::InternalError(format!("Stock counter overflow for book {}", book_id))
        })?;

        loan.quantity -= quantity.get();
        if loan.quantity == 0 {
            loan.is_returned = true;
            loan.return_date = Some(today);
        } else {
            loan.return_date = None;
        }

        let book = self.store.set_book_quantity(book, restocked).await?;
        let loan = self.store.update_loan(loan).await?;

        info!(
            loan_id,
            book_id,
            returned = quantity.get(),
            outstanding = loan.quantity,
            available_stock = book.quantity,
            closed = loan.is_returned,
            "book returned"
        );

        Ok(ReturnOutcome::Returned {
            change: LoanChange { loan, book },
            returned_quantity: quantity.get(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryLendingStore;
    use assert_matches::assert_matches;

    const BOOK: i32 = 1;
    const ALICE: i32 = 10;
    const BOB: i32 = 11;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
    }

    fn qty(n: i32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    fn store_with_stock(stock: i32) -> InMemoryLendingStore {
        let store = InMemoryLendingStore::new();
        store.put_book(BOOK, stock);
        store.put_student(ALICE, "alice");
        store.put_student(BOB, "bob");
        store
    }

    #[test]
    fn quantity_rejects_zero_and_negative() {
        assert_matches!(Quantity::new(0), Err(ServiceError::InvalidQuantity(_)));
        assert_matches!(Quantity::try_from(-3), Err(ServiceError::InvalidQuantity(_)));
        assert_eq!(Quantity::new(4).unwrap().get(), 4);
    }

    #[tokio::test]
    async fn issue_moves_copies_from_shelf_to_loan() {
        let store = store_with_stock(5);
        let tx = store.begin().await;
        let engine = LoanLifecycle::new(&tx);

        let change = engine.issue(BOOK, ALICE, qty(3), today()).await.unwrap();

        assert_eq!(change.book.quantity, 2);
        assert_eq!(change.loan.quantity, 3);
        assert!(!change.loan.is_returned);
        assert_eq!(change.loan.return_date, None);
        assert_eq!(change.loan.issue_date, today());
        assert_eq!(store.book(BOOK).unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn issue_beyond_stock_is_rejected_without_changes() {
        let store = store_with_stock(5);
        let tx = store.begin().await;
        let engine = LoanLifecycle::new(&tx);
        engine.issue(BOOK, ALICE, qty(3), today()).await.unwrap();

        let err = engine.issue(BOOK, BOB, qty(3), today()).await.unwrap_err();

        assert_matches!(err, ServiceError::InsufficientStock { available: 2, .. });
        assert_eq!(store.book(BOOK).unwrap().quantity, 2);
        assert_eq!(store.loans_for_book(BOOK).len(), 1);
    }

    #[tokio::test]
    async fn partial_then_full_return_closes_the_loan() {
        let store = store_with_stock(5);
        let tx = store.begin().await;
        let engine = LoanLifecycle::new(&tx);
        let loan_id = engine.issue(BOOK, ALICE, qty(3), today()).await.unwrap().loan.id;

        let outcome = engine.partial_return(loan_id, qty(2), today()).await.unwrap();
        let change = outcome.change();
        assert_eq!(change.loan.quantity, 1);
        assert!(!change.loan.is_returned);
        assert_eq!(change.loan.return_date, None);
        assert_eq!(change.book.quantity, 4);
        assert_eq!(outcome.receipt().status, LoanStatus::Active);

        let outcome = engine.partial_return(loan_id, qty(1), today()).await.unwrap();
        assert_matches!(
            outcome,
            ReturnOutcome::Returned {
                returned_quantity: 1,
                ..
            }
        );
        let receipt = outcome.receipt();
        assert_eq!(receipt.outstanding, 0);
        assert_eq!(receipt.status, LoanStatus::Returned);
        assert_eq!(receipt.return_date, Some(today()));
        assert_eq!(receipt.available_stock, 5);
    }

    #[tokio::test]
    async fn returning_a_closed_loan_is_a_no_op() {
        let store = store_with_stock(5);
        let tx = store.begin().await;
        let engine = LoanLifecycle::new(&tx);
        let loan_id = engine.issue(BOOK, ALICE, qty(2), today()).await.unwrap().loan.id;
        engine.partial_return(loan_id, qty(2), today()).await.unwrap();
        let before = store.issued_book(loan_id).unwrap();

        let later = today().succ_opt().unwrap();
        let outcome = engine.partial_return(loan_id, qty(1), later).await.unwrap();

        assert!(outcome.is_already_returned());
        assert_eq!(store.issued_book(loan_id).unwrap(), before);
        assert_eq!(store.book(BOOK).unwrap().quantity, 5);
        assert_eq!(outcome.receipt().return_date, Some(today()));
    }

    #[tokio::test]
    async fn returning_more_than_outstanding_is_rejected() {
        let store = store_with_stock(5);
        let tx = store.begin().await;
        let engine = LoanLifecycle::new(&tx);
        let loan_id = engine.issue(BOOK, ALICE, qty(2), today()).await.unwrap().loan.id;

        let err = engine.partial_return(loan_id, qty(5), today()).await.unwrap_err();

        assert_matches!(err, ServiceError::ExcessReturn { outstanding: 2, .. });
        assert_eq!(store.issued_book(loan_id).unwrap().quantity, 2);
        assert_eq!(store.book(BOOK).unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn reissue_creates_a_separate_loan() {
        let store = store_with_stock(5);
        let tx = store.begin().await;
        let engine = LoanLifecycle::new(&tx);

        let first = engine.issue(BOOK, ALICE, qty(1), today()).await.unwrap();
        let second = engine.issue(BOOK, ALICE, qty(1), today()).await.unwrap();

        assert_ne!(first.loan.id, second.loan.id);
        assert_eq!(store.outstanding_for_book(BOOK), 2);
        assert_eq!(second.book.quantity, 3);
    }

    #[tokio::test]
    async fn unknown_references_are_not_found() {
        let store = store_with_stock(5);
        let tx = store.begin().await;
        let engine = LoanLifecycle::new(&tx);

        assert_matches!(
            engine.issue(99, ALICE, qty(1), today()).await,
            Err(ServiceError::NotFound(_))
        );
        assert_matches!(
            engine.issue(BOOK, 99, qty(1), today()).await,
            Err(ServiceError::NotFound(_))
        );
        assert_matches!(
            engine.partial_return(99, qty(1), today()).await,
            Err(ServiceError::NotFound(_))
        );
        assert_eq!(store.book(BOOK).unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn issuing_the_whole_shelf_is_allowed() {
        let store = store_with_stock(2);
        let tx = store.begin().await;
        let engine = LoanLifecycle::new(&tx);

        let change = engine.issue(BOOK, BOB, qty(2), today()).await.unwrap();
        assert_eq!(change.book.quantity, 0);
        assert!(!change.book.is_available());

        assert_matches!(
            engine.issue(BOOK, ALICE, qty(1), today()).await,
            Err(ServiceError::InsufficientStock { available: 0, .. })
        );
    }
}

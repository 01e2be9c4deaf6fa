//! Property-based tests for the loan lifecycle.
//!
//! Arbitrary sequences of issues and returns are replayed against the
//! in-memory store; the shelf count plus the copies out on open loans must
//! never change, and no counter may go negative.

use chrono::NaiveDate;
use library_api::{
    errors::ServiceError,
    lending::{LoanLifecycle, Quantity, ReturnOutcome},
    repositories::InMemoryLendingStore,
};
use proptest::prelude::*;

const BOOK: i32 = 1;
const STUDENTS: [i32; 3] = [10, 11, 12];

#[derive(Debug, Clone)]
enum Op {
    Issue { student: usize, quantity: i32 },
    Return { loan: usize, quantity: i32 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..STUDENTS.len(), -1i32..6).prop_map(|(student, quantity)| Op::Issue { student, quantity }),
        (0usize..8, -1i32..6).prop_map(|(loan, quantity)| Op::Return { loan, quantity }),
    ]
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("build runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn copies_are_conserved(stock in 0i32..12, ops in prop::collection::vec(op_strategy(), 1..40)) {
        let store = InMemoryLendingStore::new();
        store.put_book(BOOK, stock);
        for (i, id) in STUDENTS.iter().enumerate() {
            store.put_student(*id, &format!("student-{}", i));
        }
        let mut loan_ids: Vec<i32> = Vec::new();

        runtime().block_on(async {
            for op in ops {
                let tx = store.begin().await;
                let engine = LoanLifecycle::new(&tx);
                match op {
                    Op::Issue { student, quantity } => {
                        let shelf_before = store.book(BOOK).unwrap().quantity;
                        let result = match Quantity::new(quantity) {
                            Ok(q) => engine.issue(BOOK, STUDENTS[student], q, day()).await,
                            Err(e) => Err(e),
                        };
                        match result {
                            Ok(change) => {
                                prop_assert!(quantity <= shelf_before);
                                loan_ids.push(change.loan.id);
                            }
                            Err(ServiceError::InsufficientStock { available, .. }) => {
                                prop_assert_eq!(available, shelf_before);
                                prop_assert!(quantity > shelf_before);
                            }
                            Err(ServiceError::InvalidQuantity(_)) => prop_assert!(quantity < 1),
                            Err(other) => prop_assert!(false, "unexpected error: {}", other),
                        }
                    }
                    Op::Return { loan, quantity } => {
                        let Some(&loan_id) = loan_ids.get(loan) else { continue };
                        let before = store.issued_book(loan_id).unwrap();
                        let result = match Quantity::new(quantity) {
                            Ok(q) => engine.partial_return(loan_id, q, day()).await,
                            Err(e) => Err(e),
                        };
                        match result {
                            Ok(ReturnOutcome::Returned { change, returned_quantity }) => {
                                prop_assert!(!before.is_returned);
                                prop_assert_eq!(change.loan.quantity, before.quantity - returned_quantity);
                                prop_assert_eq!(change.loan.is_returned, change.loan.quantity == 0);
                                prop_assert_eq!(change.loan.return_date.is_some(), change.loan.is_returned);
                            }
                            Ok(ReturnOutcome::AlreadyReturned { .. }) => {
                                prop_assert!(before.is_returned);
                                prop_assert_eq!(store.issued_book(loan_id).unwrap(), before);
                            }
                            Err(ServiceError::ExcessReturn { outstanding, .. }) => {
                                prop_assert_eq!(outstanding, before.quantity);
                                prop_assert!(quantity > before.quantity);
                            }
                            Err(ServiceError::InvalidQuantity(_)) => prop_assert!(quantity < 1),
                            Err(other) => prop_assert!(false, "unexpected error: {}", other),
                        }
                    }
                }
                drop(tx);

                let shelf = store.book(BOOK).unwrap().quantity;
                prop_assert!(shelf >= 0);
                prop_assert_eq!(shelf + store.outstanding_for_book(BOOK), stock);
                for loan in store.loans_for_book(BOOK) {
                    prop_assert!(loan.quantity >= 0);
                    prop_assert_eq!(loan.is_returned, loan.quantity == 0);
                }
            }
            Ok(())
        })?;
    }
}

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DbBackend, EntityTrait, QuerySelect, Set, Statement,
};

use crate::entities::{
    book::{self, Entity as Book},
    issued_book::{self, Entity as IssuedBook},
    student::{self, Entity as Student},
};
use crate::errors::ServiceError;

/// Values for a loan record about to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub book_id: i32,
    pub student_id: i32,
    pub quantity: i32,
    pub issue_date: NaiveDate,
}

/// The storage operations the loan lifecycle needs.
///
/// Implementations are expected to run inside a single unit of work: a row
/// fetched through one of the `*_for_update` methods stays locked until
/// that unit of work commits or rolls back.
#[async_trait]
pub trait LendingStore: Send + Sync {
    /// Fetches a book and locks its row.
    async fn book_for_update(&self, book_id: i32) -> Result<Option<book::Model>, ServiceError>;

    async fn student(&self, student_id: i32) -> Result<Option<student::Model>, ServiceError>;

    /// Fetches a loan without taking a row lock.
    async fn loan(&self, loan_id: i32) -> Result<Option<issued_book::Model>, ServiceError>;

    /// Fetches a loan and locks its row.
    async fn loan_for_update(
        &self,
        loan_id: i32,
    ) -> Result<Option<issued_book::Model>, ServiceError>;

    async fn set_book_quantity(
        &self,
        book: book::Model,
        quantity: i32,
    ) -> Result<book::Model, ServiceError>;

    async fn insert_loan(&self, loan: NewLoan) -> Result<issued_book::Model, ServiceError>;

    /// Persists the outstanding quantity, returned flag and return date.
    async fn update_loan(
        &self,
        loan: issued_book::Model,
    ) -> Result<issued_book::Model, ServiceError>;
}

/// `LendingStore` over any sea-orm connection, normally a `DatabaseTransaction`.
///
/// Row locks are requested with `SELECT ... FOR UPDATE`. SQLite has no row
/// locks, so every read here first claims the database write lock with a
/// no-op `UPDATE`; a deferred transaction that read first could otherwise not
/// upgrade to a writer while another one commits (`database is locked`).
pub struct SeaOrmLendingStore<'a, C> {
    conn: &'a C,
}

impl<'a, C> SeaOrmLendingStore<'a, C>
where
    C: ConnectionTrait,
{
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Takes the SQLite write lock for the rest of the transaction. Waits
    /// on the connection's busy timeout while another writer holds it.
    async fn claim_write_lock(&self, sql: &str, id: i32) -> Result<(), ServiceError> {
        if self.conn.get_database_backend() != DbBackend::Sqlite {
            return Ok(());
        }
        let stmt = Statement::from_sql_and_values(DbBackend::Sqlite, sql, vec![id.into()]);
        self.conn.execute(stmt).await?;
        Ok(())
    }
}

const CLAIM_BOOK_SQL: &str = "UPDATE books SET quantity = quantity WHERE id = ?";
const CLAIM_LOAN_SQL: &str = "UPDATE issued_books SET quantity = quantity WHERE id = ?";

#[async_trait]
impl<'a, C> LendingStore for SeaOrmLendingStore<'a, C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn book_for_update(&self, book_id: i32) -> Result<Option<book::Model>, ServiceError> {
        self.claim_write_lock(CLAIM_BOOK_SQL, book_id).await?;
        Ok(Book::find_by_id(book_id)
            .lock_exclusive()
            .one(self.conn)
            .await?)
    }

    async fn student(&self, student_id: i32) -> Result<Option<student::Model>, ServiceError> {
        Ok(Student::find_by_id(student_id).one(self.conn).await?)
    }

    async fn loan(&self, loan_id: i32) -> Result<Option<issued_book::Model>, ServiceError> {
        // The return path starts here, before the book is known.
        self.claim_write_lock(CLAIM_LOAN_SQL, loan_id).await?;
        Ok(IssuedBook::find_by_id(loan_id).one(self.conn).await?)
    }

    async fn loan_for_update(
        &self,
        loan_id: i32,
    ) -> Result<Option<issued_book::Model>, ServiceError> {
        Ok(IssuedBook::find_by_id(loan_id)
            .lock_exclusive()
            .one(self.conn)
            .await?)
    }

    async fn set_book_quantity(
        &self,
        book: book::Model,
        quantity: i32,
    ) -> Result<book::Model, ServiceError> {
        let mut active: book::ActiveModel = book.into();
        active.quantity = Set(quantity);
        Ok(active.update(self.conn).await?)
    }

    async fn insert_loan(&self, loan: NewLoan) -> Result<issued_book::Model, ServiceError> {
        let active = issued_book::ActiveModel {
            book_id: Set(loan.book_id),
            student_id: Set(loan.student_id),
            quantity: Set(loan.quantity),
            issue_date: Set(loan.issue_date),
            return_date: Set(None),
            is_returned: Set(false),
            ..Default::default()
        };
        Ok(active.insert(self.conn).await?)
    }

    async fn update_loan(
        &self,
        loan: issued_book::Model,
    ) -> Result<issued_book::Model, ServiceError> {
        let quantity = loan.quantity;
        let is_returned = loan.is_returned;
        let return_date = loan.return_date;

        let mut active: issued_book::ActiveModel = loan.into();
        active.quantity = Set(quantity);
        active.is_returned = Set(is_returned);
        active.return_date = Set(return_date);
        Ok(active.update(self.conn).await?)
    }
}

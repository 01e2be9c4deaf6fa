use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::entities::book::{self, Entity as Book};
use crate::entities::issued_book::{Column, Entity as IssuedBook, Model as LoanModel};
use crate::entities::student::{self, Entity as Student};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

/// Status filter for loan listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatusFilter {
    #[default]
    All,
    Active,
    Returned,
}

/// A loan joined with the titles a dashboard shows next to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanWithNames {
    pub loan: LoanModel,
    pub book_title: Option<String>,
    pub student_name: Option<String>,
}

/// Repository for the loan ledger (read side)
#[derive(Debug, Clone)]
pub struct LoanRepository {
    base: BaseRepository,
}

impl LoanRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<LoanModel>, ServiceError> {
        IssuedBook::find_by_id(id)
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Loans by newest issue date, ties broken by newest record
    pub async fn find_all(&self, status: LoanStatusFilter) -> Result<Vec<LoanModel>, ServiceError> {
        let query = match status {
            LoanStatusFilter::All => IssuedBook::find(),
            LoanStatusFilter::Active => IssuedBook::find().filter(Column::IsReturned.eq(false)),
            LoanStatusFilter::Returned => IssuedBook::find().filter(Column::IsReturned.eq(true)),
        };

        query
            .order_by_desc(Column::IssueDate)
            .order_by_desc(Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// A student's loans, newest first
    pub async fn find_by_student(&self, student_id: i32) -> Result<Vec<LoanModel>, ServiceError> {
        IssuedBook::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::IssueDate)
            .order_by_desc(Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn count_by_returned(&self, is_returned: bool) -> Result<u64, ServiceError> {
        IssuedBook::find()
            .filter(Column::IsReturned.eq(is_returned))
            .count(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// The most recent loans with their book title and student name
    pub async fn find_recent_with_names(
        &self,
        limit: u64,
    ) -> Result<Vec<LoanWithNames>, ServiceError> {
        let db = self.base.get_db();
        let loans = IssuedBook::find()
            .order_by_desc(Column::IssueDate)
            .order_by_desc(Column::Id)
            .limit(limit)
            .all(db)
            .await?;

        let book_ids: Vec<i32> = loans.iter().map(|l| l.book_id).collect();
        let student_ids: Vec<i32> = loans.iter().map(|l| l.student_id).collect();

        let titles: HashMap<i32, String> = Book::find()
            .filter(book::Column::Id.is_in(book_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|b| (b.id, b.title))
            .collect();
        let names: HashMap<i32, String> = Student::find()
            .filter(student::Column::Id.is_in(student_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        Ok(loans
            .into_iter()
            .map(|loan| LoanWithNames {
                book_title: titles.get(&loan.book_id).cloned(),
                student_name: names.get(&loan.student_id).cloned(),
                loan,
            })
            .collect())
    }
}

impl Repository for LoanRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}

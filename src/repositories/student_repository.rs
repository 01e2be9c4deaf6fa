use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use std::sync::Arc;

use crate::entities::issued_book::{self, Entity as IssuedBook};
use crate::entities::student::{
    ActiveModel as StudentActiveModel, Column, Entity as Student, Model as StudentModel,
};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

/// Repository for roster operations
#[derive(Debug, Clone)]
pub struct StudentRepository {
    base: BaseRepository,
}

impl StudentRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<StudentModel>, ServiceError> {
        Student::find_by_id(id)
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// First roster entry carrying exactly this name
    pub async fn find_by_name(&self, name: &str) -> Result<Option<StudentModel>, ServiceError> {
        Student::find()
            .filter(Column::Name.eq(name))
            .order_by_asc(Column::Id)
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// All students ordered by ID number
    pub async fn find_all(&self) -> Result<Vec<StudentModel>, ServiceError> {
        Student::find()
            .order_by_asc(Column::IdNumber)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn count(&self) -> Result<u64, ServiceError> {
        Student::find()
            .count(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn create(&self, student: StudentActiveModel) -> Result<StudentModel, ServiceError> {
        student
            .insert(self.base.get_db())
            .await
            .map_err(|e| ServiceError::from_write(e, "A student with this ID number"))
    }

    pub async fn update(&self, student: StudentActiveModel) -> Result<StudentModel, ServiceError> {
        student
            .update(self.base.get_db())
            .await
            .map_err(|e| ServiceError::from_write(e, "A student with this ID number"))
    }

    /// Deletes a student together with their loan records.
    /// Returns `false` when no such student exists.
    pub async fn delete_with_loans(&self, id: i32) -> Result<bool, ServiceError> {
        let txn = self.base.get_db().begin().await?;

        IssuedBook::delete_many()
            .filter(issued_book::Column::StudentId.eq(id))
            .exec(&txn)
            .await?;
        let deleted = Student::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(deleted.rows_affected > 0)
    }
}

impl Repository for StudentRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}

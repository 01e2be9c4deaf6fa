use crate::{
    db::DbPool,
    entities::{
        issued_book::Model as LoanModel,
        student::{self, Department, Model as StudentModel},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    repositories::{LoanRepository, StudentRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "ID number must be between 1 and 20 characters"))]
    pub id_number: String,
    pub department: Department,
    #[serde(default)]
    #[validate(length(max = 20, message = "Phone number cannot exceed 20 characters"))]
    pub phone_number: String,
}

impl CreateStudentRequest {
    fn trimmed(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.id_number = self.id_number.trim().to_string();
        self.phone_number = self.phone_number.trim().to_string();
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateStudentRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 20, message = "ID number must be between 1 and 20 characters"))]
    pub id_number: Option<String>,
    pub department: Option<Department>,
    #[validate(length(max = 20, message = "Phone number cannot exceed 20 characters"))]
    pub phone_number: Option<String>,
}

impl UpdateStudentRequest {
    fn trimmed(mut self) -> Self {
        let trim = |v: Option<String>| v.map(|s| s.trim().to_string());
        self.name = trim(self.name);
        self.id_number = trim(self.id_number);
        self.phone_number = trim(self.phone_number);
        self
    }
}

#[derive(Debug, Clone)]
pub struct StudentListing {
    pub students: Vec<StudentModel>,
    pub total_students: u64,
}

/// A student with their borrowing history
#[derive(Debug, Clone)]
pub struct StudentDetail {
    pub student: StudentModel,
    /// Every loan record, newest first
    pub loans: Vec<LoanModel>,
    pub active_loans: Vec<LoanModel>,
}

impl StudentDetail {
    pub fn active_count(&self) -> usize {
        self.active_loans.len()
    }
}

/// Service for managing the student roster
#[derive(Clone)]
pub struct RosterService {
    students: StudentRepository,
    loans: LoanRepository,
    event_sender: Arc<EventSender>,
}

impl RosterService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            students: StudentRepository::new(db_pool.clone()),
            loans: LoanRepository::new(db_pool),
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn create_student(
        &self,
        request: CreateStudentRequest,
    ) -> Result<StudentModel, ServiceError> {
        let request = request.trimmed();
        request.validate()?;

        let created = self
            .students
            .create(student::ActiveModel {
                name: Set(request.name),
                id_number: Set(request.id_number),
                department: Set(request.department),
                phone_number: Set(request.phone_number),
                ..Default::default()
            })
            .await?;

        info!(student_id = created.id, "student created");
        self.event_sender
            .send_or_log(Event::StudentCreated(created.id))
            .await;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_student(&self, id: i32) -> Result<StudentModel, ServiceError> {
        self.students
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Student {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn update_student(
        &self,
        id: i32,
        request: UpdateStudentRequest,
    ) -> Result<StudentModel, ServiceError> {
        let request = request.trimmed();
        request.validate()?;

        let existing = self.get_student(id).await?;
        if request.name.is_none()
            && request.id_number.is_none()
            && request.department.is_none()
            && request.phone_number.is_none()
        {
            return Ok(existing);
        }

        let mut active: student::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(id_number) = request.id_number {
            active.id_number = Set(id_number);
        }
        if let Some(department) = request.department {
            active.department = Set(department);
        }
        if let Some(phone_number) = request.phone_number {
            active.phone_number = Set(phone_number);
        }

        let updated = self.students.update(active).await?;
        self.event_sender.send_or_log(Event::StudentUpdated(id)).await;
        Ok(updated)
    }

    /// Removes the student and all of their loan records
    #[instrument(skip(self))]
    pub async fn delete_student(&self, id: i32) -> Result<(), ServiceError> {
        if !self.students.delete_with_loans(id).await? {
            return Err(ServiceError::NotFound(format!("Student {} not found", id)));
        }

        info!(student_id = id, "student deleted");
        self.event_sender.send_or_log(Event::StudentDeleted(id)).await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_students(&self) -> Result<StudentListing, ServiceError> {
        let students = self.students.find_all().await?;
        let total_students = students.len() as u64;
        Ok(StudentListing {
            students,
            total_students,
        })
    }

    #[instrument(skip(self))]
    pub async fn student_detail(&self, id: i32) -> Result<StudentDetail, ServiceError> {
        let student = self.get_student(id).await?;
        let loans = self.loans.find_by_student(id).await?;
        let active_loans = loans.iter().filter(|l| !l.is_returned).cloned().collect();

        Ok(StudentDetail {
            student,
            loans,
            active_loans,
        })
    }

    /// Roster entry linked to an account by its name
    #[instrument(skip(self))]
    pub async fn find_student_by_name(
        &self,
        name: &str,
    ) -> Result<Option<StudentModel>, ServiceError> {
        self.students.find_by_name(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn department_must_be_known() {
        let parsed: Result<CreateStudentRequest, _> = serde_json::from_str(
            r#"{"name":"Ada","id_number":"S-1","department":"engineering"}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn phone_number_is_optional_but_bounded() {
        let request: CreateStudentRequest = serde_json::from_str(
            r#"{"name":"Ada","id_number":"S-1","department":"science"}"#,
        )
        .unwrap();
        assert_eq!(request.phone_number, "");
        assert!(request.validate().is_ok());

        let long = UpdateStudentRequest {
            phone_number: Some("0".repeat(21)),
            ..Default::default()
        };
        assert!(long.validate().is_err());
    }
}

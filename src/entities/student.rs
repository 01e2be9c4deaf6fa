use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,

    #[sea_orm(unique)]
    #[validate(length(min = 1, max = 20, message = "ID number must be between 1 and 20 characters"))]
    pub id_number: String,

    pub department: Department,

    #[validate(length(max = 20, message = "Phone number cannot exceed 20 characters"))]
    pub phone_number: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::issued_book::Entity")]
    IssuedBooks,
}

impl Related<super::issued_book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IssuedBooks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Academic department a student is enrolled in
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Department {
    #[sea_orm(string_value = "science")]
    Science,
    #[sea_orm(string_value = "commerce")]
    Commerce,
    #[sea_orm(string_value = "humanities")]
    Humanities,
}

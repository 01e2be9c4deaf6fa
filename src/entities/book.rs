use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A catalog title. `quantity` is the number of copies currently on the
/// shelf; copies out on loan are not counted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 200, message = "Author must be between 1 and 200 characters"))]
    pub author: String,

    #[sea_orm(unique)]
    #[validate(length(min = 1, max = 13, message = "ISBN must be between 1 and 13 characters"))]
    pub isbn: String,

    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
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

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        if insert && self.created_at.is_not_set() {
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}

impl Model {
    /// True when at least one copy is on the shelf
    pub fn is_available(&self) -> bool {
        self.quantity > 0
    }
}

//! `SeaORM` Entity for user table
//!
//! The domain user. Login emails and phone numbers live in `user_email`
//! and `user_phonenumber`; the role-specific profile lives in `resident`,
//! `authority` or `serviceprovider`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{Role, UserStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "userID")]
    pub user_id: i32,
    #[sea_orm(column_name = "communityID")]
    pub community_id: Option<i32>,
    #[sea_orm(column_name = "firstName")]
    pub first_name: String,
    #[sea_orm(column_name = "lastName")]
    pub last_name: String,
    /// bcrypt hash
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
    #[sea_orm(column_name = "date_Of_birth")]
    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
    /// When set, login must present this code
    #[sea_orm(column_name = "twoFactorCode")]
    #[serde(skip_serializing)]
    pub two_factor_code: Option<String>,
    pub status: UserStatus,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTime,
}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::community::Entity",
        from = "Column::CommunityId",
        to = "super::community::Column::CommunityId"
    )]
    Community,
}

impl Related<super::community::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Community.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

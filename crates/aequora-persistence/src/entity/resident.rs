//! `SeaORM` Entity for resident table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::VerificationStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "resident")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "residentID")]
    pub resident_id: i32,
    #[sea_orm(column_name = "userID", unique)]
    pub user_id: i32,
    pub house_no: Option<String>,
    pub street: Option<String>,
    pub thana: Option<String>,
    pub district: Option<String>,
    pub emergency_contact: Option<String>,
    pub verification_status: VerificationStatus,
    pub registered_date: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::UserId"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

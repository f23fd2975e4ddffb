//! Activity log entity for audit logging
//!
//! Tracks every state-changing workflow performed through the API.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "activitylog")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "logID")]
    pub log_id: i32,
    /// User who performed the action
    #[sea_orm(column_name = "userID")]
    pub user_id: i32,
    /// Action type: ISSUE_CREATE, BOOKING_STATUS, PAYMENT, ...
    #[sea_orm(column_name = "actionType")]
    pub action_type: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// Affected entity, e.g. `booking:12`
    #[sea_orm(column_name = "entityAffected")]
    pub entity_affected: Option<String>,
    pub timestamp: DateTime,
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

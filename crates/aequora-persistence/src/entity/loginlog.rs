//! `SeaORM` Entity for loginlog table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{Role, TwoFactorStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "loginlog")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "logID")]
    pub log_id: i32,
    #[sea_orm(column_name = "userID")]
    pub user_id: i32,
    pub user_role: Role,
    #[sea_orm(column_name = "loginTime")]
    pub login_time: DateTime,
    #[sea_orm(column_name = "logoutTime")]
    pub logout_time: Option<DateTime>,
    #[sea_orm(column_name = "ipAddress")]
    pub ip_address: Option<String>,
    #[sea_orm(column_name = "deviceInfo")]
    pub device_info: Option<String>,
    #[sea_orm(column_name = "twoFactorStatus")]
    pub two_factor_status: TwoFactorStatus,
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

//! `SeaORM` Entity for serviceprovider table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ProviderAvailability;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "serviceprovider")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "providerID")]
    pub provider_id: i32,
    #[sea_orm(column_name = "userID", unique)]
    pub user_id: i32,
    pub service_area: Option<String>,
    #[sea_orm(column_name = "workingHours")]
    pub working_hours: Option<String>,
    #[sea_orm(column_name = "certificationFile")]
    pub certification_file: Option<String>,
    pub availability_status: ProviderAvailability,
    #[sea_orm(column_name = "subRole")]
    pub sub_role: Option<String>,
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

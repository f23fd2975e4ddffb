//! `SeaORM` Entity for authority table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "authority")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "authorityID")]
    pub authority_id: i32,
    #[sea_orm(column_name = "userID", unique)]
    pub user_id: i32,
    #[sea_orm(column_name = "departmentName")]
    pub department_name: Option<String>,
    pub designation: Option<String>,
    #[sea_orm(column_name = "houseNo")]
    pub house_no: Option<String>,
    pub street: Option<String>,
    pub thana: Option<String>,
    pub district: Option<String>,
    #[sea_orm(column_name = "assignedArea")]
    pub assigned_area: Option<String>,
    #[sea_orm(column_name = "profileCertificate")]
    pub profile_certificate: Option<String>,
    #[sea_orm(column_name = "dateJoined")]
    pub date_joined: Option<Date>,
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

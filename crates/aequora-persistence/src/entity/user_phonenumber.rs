//! `SeaORM` Entity for user_phonenumber table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "user_phonenumber")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "phoneID")]
    pub phone_id: i32,
    #[sea_orm(column_name = "userID")]
    pub user_id: i32,
    #[sea_orm(column_name = "phoneNumber")]
    pub phone_number: String,
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

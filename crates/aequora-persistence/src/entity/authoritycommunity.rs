//! `SeaORM` Entity for authoritycommunity table
//!
//! Maps an authority to each community it serves.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "authoritycommunity")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "mapID")]
    pub map_id: i32,
    #[sea_orm(column_name = "authorityID")]
    pub authority_id: i32,
    #[sea_orm(column_name = "communityID")]
    pub community_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::authority::Entity",
        from = "Column::AuthorityId",
        to = "super::authority::Column::AuthorityId"
    )]
    Authority,
    #[sea_orm(
        belongs_to = "super::community::Entity",
        from = "Column::CommunityId",
        to = "super::community::Column::CommunityId"
    )]
    Community,
}

impl Related<super::authority::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Authority.def()
    }
}

impl Related<super::community::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Community.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

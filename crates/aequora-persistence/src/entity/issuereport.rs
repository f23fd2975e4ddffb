//! `SeaORM` Entity for issuereport table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{IssueStatus, Priority};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "issuereport")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "issueID")]
    pub issue_id: i32,
    #[sea_orm(column_name = "residentID")]
    pub resident_id: i32,
    #[sea_orm(column_name = "communityID")]
    pub community_id: i32,
    pub title: String,
    #[sea_orm(column_name = "type")]
    pub issue_type: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub photo: Option<String>,
    #[sea_orm(column_name = "mapAddress")]
    pub map_address: Option<String>,
    pub status: IssueStatus,
    #[sea_orm(column_name = "priorityLevel")]
    pub priority_level: Priority,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
    #[sea_orm(column_name = "resolvedAt")]
    pub resolved_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::resident::Entity",
        from = "Column::ResidentId",
        to = "super::resident::Column::ResidentId"
    )]
    Resident,
    #[sea_orm(
        belongs_to = "super::community::Entity",
        from = "Column::CommunityId",
        to = "super::community::Column::CommunityId"
    )]
    Community,
}

impl Related<super::resident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resident.def()
    }
}

impl Related<super::community::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Community.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` Entity for issuevote table
//!
//! One row per (issue, resident); enforced by a unique index.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::VoteType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "issuevote")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "voteID")]
    pub vote_id: i32,
    #[sea_orm(column_name = "issueID")]
    pub issue_id: i32,
    #[sea_orm(column_name = "residentID")]
    pub resident_id: i32,
    #[sea_orm(column_name = "voteType")]
    pub vote_type: VoteType,
    #[sea_orm(column_name = "votedAt")]
    pub voted_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::issuereport::Entity",
        from = "Column::IssueId",
        to = "super::issuereport::Column::IssueId"
    )]
    Issuereport,
    #[sea_orm(
        belongs_to = "super::resident::Entity",
        from = "Column::ResidentId",
        to = "super::resident::Column::ResidentId"
    )]
    Resident,
}

impl Related<super::issuereport::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Issuereport.def()
    }
}

impl Related<super::resident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resident.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

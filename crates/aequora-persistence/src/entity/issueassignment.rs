//! `SeaORM` Entity for issueassignment table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::AssignmentStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "issueassignment")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "assignmentID")]
    pub assignment_id: i32,
    #[sea_orm(column_name = "issueID")]
    pub issue_id: i32,
    #[sea_orm(column_name = "authorityID")]
    pub authority_id: i32,
    #[sea_orm(column_name = "providerID")]
    pub provider_id: Option<i32>,
    #[sea_orm(column_name = "assignedDate")]
    pub assigned_date: DateTime,
    #[sea_orm(column_type = "Text", nullable)]
    pub remarks: Option<String>,
    pub status: AssignmentStatus,
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
        belongs_to = "super::authority::Entity",
        from = "Column::AuthorityId",
        to = "super::authority::Column::AuthorityId"
    )]
    Authority,
    #[sea_orm(
        belongs_to = "super::serviceprovider::Entity",
        from = "Column::ProviderId",
        to = "super::serviceprovider::Column::ProviderId"
    )]
    Serviceprovider,
}

impl Related<super::issuereport::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Issuereport.def()
    }
}

impl Related<super::authority::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Authority.def()
    }
}

impl Related<super::serviceprovider::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Serviceprovider.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

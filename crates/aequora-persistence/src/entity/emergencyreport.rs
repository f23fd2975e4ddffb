//! `SeaORM` Entity for emergencyreport table (SOS alerts)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{EmergencyStatus, EmergencyType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "emergencyreport")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "sosID")]
    pub sos_id: i32,
    #[sea_orm(column_name = "residentID")]
    pub resident_id: i32,
    #[sea_orm(column_name = "communityID")]
    pub community_id: i32,
    #[sea_orm(column_name = "emergencyType")]
    pub emergency_type: EmergencyType,
    pub photo: Option<String>,
    pub location: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub status: EmergencyStatus,
    pub timestamp: DateTime,
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

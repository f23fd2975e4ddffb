//! `SeaORM` Entity for eventparticipation table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::InterestType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "eventparticipation")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "participationID")]
    pub participation_id: i32,
    #[sea_orm(column_name = "eventID")]
    pub event_id: i32,
    #[sea_orm(column_name = "residentID")]
    pub resident_id: i32,
    #[sea_orm(column_name = "interestType")]
    pub interest_type: InterestType,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::EventId"
    )]
    Event,
    #[sea_orm(
        belongs_to = "super::resident::Entity",
        from = "Column::ResidentId",
        to = "super::resident::Column::ResidentId"
    )]
    Resident,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::resident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resident.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` Entity for review table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "review")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "reviewID")]
    pub review_id: i32,
    #[sea_orm(column_name = "bookingID", unique)]
    pub booking_id: i32,
    #[sea_orm(column_name = "residentID")]
    pub resident_id: i32,
    #[sea_orm(column_name = "providerID")]
    pub provider_id: i32,
    /// 1 to 5
    pub rating: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub comment: Option<String>,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::booking::Entity",
        from = "Column::BookingId",
        to = "super::booking::Column::BookingId"
    )]
    Booking,
    #[sea_orm(
        belongs_to = "super::resident::Entity",
        from = "Column::ResidentId",
        to = "super::resident::Column::ResidentId"
    )]
    Resident,
    #[sea_orm(
        belongs_to = "super::serviceprovider::Entity",
        from = "Column::ProviderId",
        to = "super::serviceprovider::Column::ProviderId"
    )]
    Serviceprovider,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booking.def()
    }
}

impl Related<super::resident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resident.def()
    }
}

impl Related<super::serviceprovider::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Serviceprovider.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` Entity for booking table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{BookingStatus, PaymentStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booking")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "bookingID")]
    pub booking_id: i32,
    #[sea_orm(column_name = "serviceID")]
    pub service_id: i32,
    #[sea_orm(column_name = "residentID")]
    pub resident_id: i32,
    #[sea_orm(column_name = "providerID")]
    pub provider_id: i32,
    #[sea_orm(column_name = "communityID")]
    pub community_id: i32,
    #[sea_orm(column_name = "bookingDate")]
    pub booking_date: Date,
    #[sea_orm(column_name = "serviceDate")]
    pub service_date: Date,
    pub status: BookingStatus,
    /// Service price at the time of booking
    pub price: f64,
    #[sea_orm(column_name = "paymentStatus")]
    pub payment_status: PaymentStatus,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::service::Entity",
        from = "Column::ServiceId",
        to = "super::service::Column::ServiceId"
    )]
    Service,
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
    #[sea_orm(
        belongs_to = "super::community::Entity",
        from = "Column::CommunityId",
        to = "super::community::Column::CommunityId"
    )]
    Community,
}

impl Related<super::service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Service.def()
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

impl Related<super::community::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Community.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` Entity for payment table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{PaymentMethod, PaymentStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "paymentID")]
    pub payment_id: i32,
    #[sea_orm(column_name = "bookingID", unique)]
    pub booking_id: i32,
    pub amount: f64,
    pub method: PaymentMethod,
    /// Gateway reference
    #[sea_orm(column_name = "transactionID")]
    pub transaction_id: Option<String>,
    #[sea_orm(column_name = "paymentDate")]
    pub payment_date: Option<DateTime>,
    pub status: PaymentStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::booking::Entity",
        from = "Column::BookingId",
        to = "super::booking::Column::BookingId"
    )]
    Booking,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booking.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

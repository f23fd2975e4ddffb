//! `SeaORM` Entity for service table
//!
//! A service provider's bookable offering. `availability` counts the
//! remaining bookable units and never drops below zero.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "serviceID")]
    pub service_id: i32,
    #[sea_orm(column_name = "providerID")]
    pub provider_id: i32,
    #[sea_orm(column_name = "communityID")]
    pub community_id: i32,
    #[sea_orm(column_name = "serviceName")]
    pub service_name: String,
    pub category: String,
    pub price: f64,
    pub availability: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_name = "isActive")]
    pub is_active: bool,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
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

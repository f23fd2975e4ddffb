//! Service catalog managed by service providers

use sea_orm::*;
use serde::Serialize;

use aequora_auth::Principal;
use aequora_common::{AequoraError, non_blank, round_money};
use aequora_persistence::entity::sea_orm_active_enums::BookingStatus;
use aequora_persistence::entity::{booking, service};

use crate::model::{CreateServiceRequest, ServiceFilter, ServiceInfo, UpdateServiceRequest, validate};

use super::activity::{self, ActivityEntry, action};
use super::scope;

/// Units offered when a new service does not say
const DEFAULT_AVAILABILITY: i32 = 1;

/// How a service left the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Removal {
    /// Never booked, row deleted
    Deleted,
    /// Booking history exists, row kept inactive
    Deactivated,
}

pub async fn list_own(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<Vec<ServiceInfo>> {
    let provider = scope::provider_of(db, principal).await?;

    let services = service::Entity::find()
        .filter(service::Column::ProviderId.eq(provider.provider_id))
        .order_by_desc(service::Column::CreatedAt)
        .order_by_desc(service::Column::ServiceId)
        .all(db)
        .await?;

    Ok(services
        .into_iter()
        .map(|s| {
            let mut info = ServiceInfo::from(s);
            info.provider_name = Some(principal.full_name());
            info
        })
        .collect())
}

pub async fn create(
    db: &DatabaseConnection,
    principal: &Principal,
    req: CreateServiceRequest,
) -> anyhow::Result<ServiceInfo> {
    validate(&req)?;
    let community_id = scope::require_community(principal)?;
    let provider = scope::provider_of(db, principal).await?;

    let service_name = req.service_name.trim().to_string();
    let category = req.category.trim().to_string();
    if service_name.is_empty() || category.is_empty() {
        return Err(AequoraError::ValidationFailed(
            "service_name and category must not be blank".to_string(),
        )
        .into());
    }

    let created = service::ActiveModel {
        provider_id: Set(provider.provider_id),
        community_id: Set(community_id),
        service_name: Set(service_name),
        category: Set(category),
        price: Set(round_money(req.price)),
        availability: Set(req.availability.unwrap_or(DEFAULT_AVAILABILITY)),
        description: Set(non_blank(req.description)),
        is_active: Set(req.is_active.unwrap_or(true)),
        created_at: Set(super::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(
        service_id = created.service_id,
        provider_id = provider.provider_id,
        "Service created"
    );
    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::CREATE_SERVICE)
            .entity("service", created.service_id)
            .description(created.service_name.clone()),
    )
    .await;

    let mut info = ServiceInfo::from(created);
    info.provider_name = Some(principal.full_name());
    Ok(info)
}

async fn find_own(
    db: &DatabaseConnection,
    principal: &Principal,
    service_id: i32,
) -> anyhow::Result<service::Model> {
    let provider = scope::provider_of(db, principal).await?;

    service::Entity::find_by_id(service_id)
        .filter(service::Column::ProviderId.eq(provider.provider_id))
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("service {}", service_id)).into())
}

/// Partial update of one of the caller's services
pub async fn update(
    db: &DatabaseConnection,
    principal: &Principal,
    service_id: i32,
    req: UpdateServiceRequest,
) -> anyhow::Result<ServiceInfo> {
    validate(&req)?;
    let found = find_own(db, principal, service_id).await?;

    let mut active: service::ActiveModel = found.into();
    if let Some(name) = non_blank(req.service_name) {
        active.service_name = Set(name);
    }
    if let Some(category) = non_blank(req.category) {
        active.category = Set(category);
    }
    if let Some(price) = req.price {
        active.price = Set(round_money(price));
    }
    if let Some(availability) = req.availability {
        active.availability = Set(availability);
    }
    if let Some(description) = req.description {
        active.description = Set(non_blank(Some(description)));
    }
    if let Some(is_active) = req.is_active {
        active.is_active = Set(is_active);
    }
    let updated = active.update(db).await?;

    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::UPDATE_SERVICE).entity("service", service_id),
    )
    .await;

    let mut info = ServiceInfo::from(updated);
    info.provider_name = Some(principal.full_name());
    Ok(info)
}

/// Remove a service from the catalog.
///
/// Refused while a booking still holds a unit. Services with booking
/// history are deactivated so their bookings keep a valid reference.
pub async fn delete(db: &DatabaseConnection, principal: &Principal, service_id: i32) -> anyhow::Result<Removal> {
    let found = find_own(db, principal, service_id).await?;

    let (active_bookings, all_bookings) = tokio::join!(
        booking::Entity::find()
            .filter(booking::Column::ServiceId.eq(service_id))
            .filter(booking::Column::Status.is_in(BookingStatus::ACTIVE))
            .count(db),
        booking::Entity::find()
            .filter(booking::Column::ServiceId.eq(service_id))
            .count(db)
    );

    let active_bookings = active_bookings?;
    if active_bookings > 0 {
        return Err(AequoraError::ResourceConflict(format!(
            "service {} has {} pending or accepted bookings",
            service_id, active_bookings
        ))
        .into());
    }

    let removal = if all_bookings? > 0 {
        let mut active: service::ActiveModel = found.into();
        active.is_active = Set(false);
        active.update(db).await?;
        Removal::Deactivated
    } else {
        service::Entity::delete_by_id(service_id).exec(db).await?;
        Removal::Deleted
    };

    tracing::info!(service_id, removal = ?removal, "Service removed");
    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::DELETE_SERVICE)
            .entity("service", service_id)
            .description(format!("{:?}", removal).to_lowercase()),
    )
    .await;

    Ok(removal)
}

/// Active services of the caller's community
pub async fn list_for_resident(
    db: &DatabaseConnection,
    principal: &Principal,
    filter: &ServiceFilter,
) -> anyhow::Result<Vec<ServiceInfo>> {
    let community_id = scope::require_community(principal)?;

    let mut query = service::Entity::find()
        .filter(service::Column::CommunityId.eq(community_id))
        .filter(service::Column::IsActive.eq(true));
    if let Some(category) = filter.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        query = query.filter(service::Column::Category.eq(category));
    }

    let services = query
        .order_by_asc(service::Column::Category)
        .order_by_asc(service::Column::ServiceName)
        .all(db)
        .await?;

    let names = scope::provider_names(db, services.iter().map(|s| s.provider_id)).await?;

    Ok(services
        .into_iter()
        .map(|s| {
            let provider_id = s.provider_id;
            let mut info = ServiceInfo::from(s);
            info.provider_name = names.get(&provider_id).cloned();
            info
        })
        .collect())
}

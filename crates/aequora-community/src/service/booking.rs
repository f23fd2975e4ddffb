//! Bookings
//!
//! A Pending or Accepted booking holds one unit of its service's
//! availability. Units are taken with a conditional decrement and handed
//! back when the booking is rejected or cancelled.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use sea_orm::{prelude::Expr, *};

use aequora_auth::Principal;
use aequora_common::AequoraError;
use aequora_persistence::entity::sea_orm_active_enums::{BookingStatus, NotificationType, PaymentStatus, Role};
use aequora_persistence::entity::{booking, review, service};

use crate::model::{BookingFilter, BookingInfo, BookingStatusRequest, CreateBookingRequest, parse_field};

use super::activity::{self, ActivityEntry, action};
use super::notification::{self, Notice};
use super::payment::{self, PaymentGateway};
use super::scope;

/// Booking rules configured at startup
#[derive(Debug, Clone)]
pub struct BookingPolicy {
    /// Repeat bookings of one service by one resident inside this window
    /// are refused
    pub duplicate_window: Duration,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            duplicate_window: Duration::from_secs(60),
        }
    }
}

/// Take one unit of availability. Returns false when none is left.
async fn reserve_unit<C: ConnectionTrait>(db: &C, service_id: i32) -> Result<bool, DbErr> {
    let result = service::Entity::update_many()
        .col_expr(
            service::Column::Availability,
            Expr::col(service::Column::Availability).sub(1),
        )
        .filter(service::Column::ServiceId.eq(service_id))
        .filter(service::Column::Availability.gt(0))
        .exec(db)
        .await?;

    Ok(result.rows_affected == 1)
}

async fn release_unit<C: ConnectionTrait>(db: &C, service_id: i32) -> Result<(), DbErr> {
    service::Entity::update_many()
        .col_expr(
            service::Column::Availability,
            Expr::col(service::Column::Availability).add(1),
        )
        .filter(service::Column::ServiceId.eq(service_id))
        .exec(db)
        .await?;

    Ok(())
}

/// Attach service, client and provider names plus the reviewed flag
pub(crate) async fn enrich(db: &DatabaseConnection, bookings: Vec<booking::Model>) -> anyhow::Result<Vec<BookingInfo>> {
    if bookings.is_empty() {
        return Ok(Vec::new());
    }

    let service_ids: Vec<i32> = bookings.iter().map(|b| b.service_id).collect();
    let booking_ids: Vec<i32> = bookings.iter().map(|b| b.booking_id).collect();

    let (services, reviewed, clients, providers) = tokio::join!(
        service::Entity::find()
            .select_only()
            .column(service::Column::ServiceId)
            .column(service::Column::ServiceName)
            .filter(service::Column::ServiceId.is_in(service_ids))
            .into_tuple::<(i32, String)>()
            .all(db),
        review::Entity::find()
            .select_only()
            .column(review::Column::BookingId)
            .filter(review::Column::BookingId.is_in(booking_ids))
            .into_tuple::<i32>()
            .all(db),
        scope::resident_names(db, bookings.iter().map(|b| b.resident_id)),
        scope::provider_names(db, bookings.iter().map(|b| b.provider_id))
    );

    let services: HashMap<i32, String> = services?.into_iter().collect();
    let reviewed: HashSet<i32> = reviewed?.into_iter().collect();
    let (clients, providers) = (clients?, providers?);

    Ok(bookings
        .into_iter()
        .map(|b| {
            let mut info = BookingInfo::from(b);
            info.service_name = services.get(&info.service_id).cloned();
            info.client_name = clients.get(&info.resident_id).cloned();
            info.provider_name = providers.get(&info.provider_id).cloned();
            info.reviewed = reviewed.contains(&info.booking_id);
            info
        })
        .collect())
}

async fn enrich_one(db: &DatabaseConnection, found: booking::Model) -> anyhow::Result<BookingInfo> {
    enrich(db, vec![found])
        .await?
        .pop()
        .ok_or_else(|| AequoraError::InternalError("booking vanished while loading".to_string()).into())
}

/// Book a service of the caller's community
pub async fn create(
    db: &DatabaseConnection,
    policy: &BookingPolicy,
    principal: &Principal,
    req: CreateBookingRequest,
) -> anyhow::Result<BookingInfo> {
    let community_id = scope::require_community(principal)?;
    let resident = scope::resident_of(db, principal).await?;

    if req.service_date < super::today() {
        return Err(AequoraError::ValidationFailed(format!(
            "service_date {} is in the past",
            req.service_date
        ))
        .into());
    }

    let tx = db.begin().await?;

    let offered = service::Entity::find_by_id(req.service_id)
        .filter(service::Column::CommunityId.eq(community_id))
        .filter(service::Column::IsActive.eq(true))
        .one(&tx)
        .await?
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("service {}", req.service_id)))?;

    // Takes the row lock, serializing concurrent bookings of this service
    if !reserve_unit(&tx, offered.service_id).await? {
        return Err(AequoraError::ServiceUnavailable(format!(
            "service {} has no availability left",
            offered.service_id
        ))
        .into());
    }

    let same_day = booking::Entity::find()
        .filter(booking::Column::ResidentId.eq(resident.resident_id))
        .filter(booking::Column::ServiceId.eq(offered.service_id))
        .filter(booking::Column::ServiceDate.eq(req.service_date))
        .filter(booking::Column::Status.is_in(BookingStatus::ACTIVE))
        .count(&tx)
        .await?;
    if same_day > 0 {
        return Err(AequoraError::DuplicateBooking(format!(
            "service {} is already booked for {}",
            offered.service_id, req.service_date
        ))
        .into());
    }

    let now = super::now();
    if let Ok(window) = chrono::Duration::from_std(policy.duplicate_window)
        && !window.is_zero()
        && booking::Entity::find()
            .filter(booking::Column::ResidentId.eq(resident.resident_id))
            .filter(booking::Column::ServiceId.eq(offered.service_id))
            .filter(booking::Column::CreatedAt.gte(now - window))
            .count(&tx)
            .await?
            > 0
    {
        return Err(AequoraError::DuplicateBooking(format!(
            "service {} was booked less than {} seconds ago",
            offered.service_id,
            policy.duplicate_window.as_secs()
        ))
        .into());
    }

    let created = booking::ActiveModel {
        service_id: Set(offered.service_id),
        resident_id: Set(resident.resident_id),
        provider_id: Set(offered.provider_id),
        community_id: Set(community_id),
        booking_date: Set(super::today()),
        service_date: Set(req.service_date),
        status: Set(BookingStatus::Pending),
        price: Set(offered.price),
        payment_status: Set(PaymentStatus::Unpaid),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&tx)
    .await?;

    if let Some(provider_user) = scope::user_of_provider(&tx, offered.provider_id).await? {
        let notice = Notice::new(
            NotificationType::Booking,
            format!(
                "New booking for {} on {} from {}",
                offered.service_name,
                req.service_date,
                principal.full_name()
            ),
        )
        .community(community_id)
        .link("/service-provider/bookings");
        notification::notify(&tx, &[provider_user], &notice).await?;
    }

    tx.commit().await?;

    tracing::info!(
        booking_id = created.booking_id,
        service_id = offered.service_id,
        resident_id = resident.resident_id,
        "Booking created"
    );
    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::CREATE_BOOKING)
            .entity("booking", created.booking_id)
            .description(format!("{} on {}", offered.service_name, req.service_date)),
    )
    .await;

    let mut info = BookingInfo::from(created);
    info.service_name = Some(offered.service_name);
    info.client_name = Some(principal.full_name());
    info.provider_name = scope::provider_names(db, [offered.provider_id])
        .await?
        .remove(&offered.provider_id);
    Ok(info)
}

/// The caller's bookings, newest first
pub async fn list_own(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<Vec<BookingInfo>> {
    let resident = scope::resident_of(db, principal).await?;

    let bookings = booking::Entity::find()
        .filter(booking::Column::ResidentId.eq(resident.resident_id))
        .order_by_desc(booking::Column::CreatedAt)
        .order_by_desc(booking::Column::BookingId)
        .all(db)
        .await?;

    enrich(db, bookings).await
}

/// Conditionally move a booking out of `from`. Fails when another request
/// got there first.
async fn claim<C: ConnectionTrait>(
    db: &C,
    booking_id: i32,
    from: BookingStatus,
    to: BookingStatus,
) -> anyhow::Result<()> {
    let moved = booking::Entity::update_many()
        .col_expr(booking::Column::Status, Expr::value(to))
        .filter(booking::Column::BookingId.eq(booking_id))
        .filter(booking::Column::Status.eq(from))
        .exec(db)
        .await?;

    if moved.rows_affected == 0 {
        return Err(AequoraError::IllegalState(format!(
            "booking {} was changed by another request",
            booking_id
        ))
        .into());
    }

    Ok(())
}

/// Move a booking to a new status on behalf of `actor`, releasing its unit
/// and refunding a settled payment where the move withdraws it.
///
/// A refund is only sent once the booking has been claimed, so of two
/// racing withdrawals exactly one reaches the gateway.
async fn apply_transition(
    db: &DatabaseConnection,
    gateway: &dyn PaymentGateway,
    actor: Role,
    found: booking::Model,
    next: BookingStatus,
    notify_user: Option<i32>,
    message: String,
) -> anyhow::Result<booking::Model> {
    let current = found.status;
    let booking_id = found.booking_id;
    if !current.can_transition_to(next, actor) {
        return Err(AequoraError::IllegalState(format!(
            "booking {} cannot move from {} to {}",
            booking_id,
            current.to_value(),
            next.to_value()
        ))
        .into());
    }

    let settled = if next.releases_availability() {
        payment::settled_payment(db, booking_id).await?
    } else {
        None
    };

    // The claim is committed on its own so the gateway never runs inside a
    // transaction; a failed refund puts the booking back.
    let refunded = match settled {
        Some(paid) => {
            claim(db, booking_id, current, next).await?;
            if let Err(e) = payment::refund(gateway, &paid).await {
                if let Err(restore) = claim(db, booking_id, next, current).await {
                    tracing::error!(error = %restore, booking_id, "Failed to restore booking after refund failure");
                }
                return Err(e);
            }
            Some(paid)
        }
        None => None,
    };

    let finished = async {
        let tx = db.begin().await?;

        if refunded.is_none() {
            claim(&tx, booking_id, current, next).await?;
        }
        if next.releases_availability() {
            release_unit(&tx, found.service_id).await?;
        }
        if let Some(paid) = &refunded {
            payment::mark_refunded(&tx, paid.clone()).await?;
        }
        if next == BookingStatus::Completed {
            payment::collect_cash(&tx, booking_id).await?;
        }
        if let Some(user_id) = notify_user {
            let notice = Notice::new(NotificationType::Booking, message).community(found.community_id);
            notification::notify(&tx, &[user_id], &notice).await?;
        }

        tx.commit().await?;
        Ok::<(), anyhow::Error>(())
    }
    .await;

    if let Err(e) = finished {
        if let Some(paid) = refunded {
            // Money already went back; record it outside the failed transaction
            tracing::error!(
                error = %e,
                booking_id,
                transaction_id = paid.transaction_id.as_deref().unwrap_or_default(),
                "Booking update failed after refund, recording refund"
            );
            if let Err(e) = release_unit(db, found.service_id).await {
                tracing::error!(error = %e, booking_id, "Failed to release unit after refund");
            }
            if let Err(e) = payment::mark_refunded(db, paid).await {
                tracing::error!(error = %e, booking_id, "Failed to record refund");
            }
        }
        return Err(e);
    }

    tracing::info!(
        booking_id,
        from = %current.to_value(),
        to = %next.to_value(),
        "Booking status changed"
    );

    booking::Entity::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("booking {}", booking_id)).into())
}

/// Resident cancellation of a Pending or Accepted booking
pub async fn cancel(
    db: &DatabaseConnection,
    gateway: &dyn PaymentGateway,
    principal: &Principal,
    booking_id: i32,
) -> anyhow::Result<BookingInfo> {
    let resident = scope::resident_of(db, principal).await?;

    let found = booking::Entity::find_by_id(booking_id)
        .filter(booking::Column::ResidentId.eq(resident.resident_id))
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("booking {}", booking_id)))?;

    let provider_user = scope::user_of_provider(db, found.provider_id).await?;
    let message = format!(
        "Booking #{} for {} was cancelled by {}",
        booking_id,
        found.service_date,
        principal.full_name()
    );
    let updated = apply_transition(
        db,
        gateway,
        Role::Resident,
        found,
        BookingStatus::Cancelled,
        provider_user,
        message,
    )
    .await?;

    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::CANCEL_BOOKING).entity("booking", booking_id),
    )
    .await;

    enrich_one(db, updated).await
}

/// Bookings of the caller's services
pub async fn list_for_provider(
    db: &DatabaseConnection,
    principal: &Principal,
    filter: &BookingFilter,
) -> anyhow::Result<Vec<BookingInfo>> {
    let provider = scope::provider_of(db, principal).await?;

    let mut query = booking::Entity::find().filter(booking::Column::ProviderId.eq(provider.provider_id));
    if let Some(status) = filter.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let status: BookingStatus = parse_field("status", status)?;
        query = query.filter(booking::Column::Status.eq(status));
    }

    let bookings = query
        .order_by_asc(booking::Column::ServiceDate)
        .order_by_desc(booking::Column::BookingId)
        .all(db)
        .await?;

    enrich(db, bookings).await
}

/// Provider decision on one of its bookings
pub async fn update_status(
    db: &DatabaseConnection,
    gateway: &dyn PaymentGateway,
    principal: &Principal,
    booking_id: i32,
    req: BookingStatusRequest,
) -> anyhow::Result<BookingInfo> {
    let next: BookingStatus = parse_field("status", &req.status)?;
    let provider = scope::provider_of(db, principal).await?;

    let found = booking::Entity::find_by_id(booking_id)
        .filter(booking::Column::ProviderId.eq(provider.provider_id))
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("booking {}", booking_id)))?;

    let resident_user = scope::user_of_resident(db, found.resident_id).await?;
    let message = format!(
        "Your booking #{} for {} is now {}",
        booking_id,
        found.service_date,
        next.to_value()
    );
    let updated = apply_transition(db, gateway, Role::ServiceProvider, found, next, resident_user, message).await?;

    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::UPDATE_BOOKING)
            .entity("booking", booking_id)
            .description(next.to_value()),
    )
    .await;

    enrich_one(db, updated).await
}

//! Reviews of completed bookings

use std::collections::HashMap;

use sea_orm::*;

use aequora_auth::Principal;
use aequora_common::{AequoraError, non_blank};
use aequora_persistence::entity::sea_orm_active_enums::{BookingStatus, NotificationType};
use aequora_persistence::entity::{booking, review, service};

use crate::model::{ProviderReviews, ReviewInfo, ReviewRequest, ReviewStats, validate};

use super::activity::{self, ActivityEntry, action};
use super::notification::{self, Notice};
use super::scope;

/// Review one of the caller's completed bookings
pub async fn create(
    db: &DatabaseConnection,
    principal: &Principal,
    booking_id: i32,
    req: ReviewRequest,
) -> anyhow::Result<ReviewInfo> {
    validate(&req)?;
    let resident = scope::resident_of(db, principal).await?;

    let found = booking::Entity::find_by_id(booking_id)
        .filter(booking::Column::ResidentId.eq(resident.resident_id))
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("booking {}", booking_id)))?;

    if found.status != BookingStatus::Completed {
        return Err(AequoraError::IllegalState(format!(
            "booking {} is {}; only completed bookings can be reviewed",
            booking_id,
            found.status.to_value()
        ))
        .into());
    }

    let tx = db.begin().await?;

    let existing = review::Entity::find()
        .filter(review::Column::BookingId.eq(booking_id))
        .count(&tx)
        .await?;
    if existing > 0 {
        return Err(AequoraError::ResourceConflict(format!("booking {} is already reviewed", booking_id)).into());
    }

    let created = review::ActiveModel {
        booking_id: Set(booking_id),
        resident_id: Set(resident.resident_id),
        provider_id: Set(found.provider_id),
        rating: Set(req.rating),
        comment: Set(non_blank(req.comment)),
        created_at: Set(super::now()),
        ..Default::default()
    }
    .insert(&tx)
    .await?;

    if let Some(provider_user) = scope::user_of_provider(&tx, found.provider_id).await? {
        let notice = Notice::new(
            NotificationType::Booking,
            format!(
                "{} rated booking #{} {} out of 5",
                principal.full_name(),
                booking_id,
                req.rating
            ),
        )
        .community(found.community_id)
        .link("/service-provider/reviews");
        notification::notify(&tx, &[provider_user], &notice).await?;
    }

    tx.commit().await?;

    tracing::info!(
        review_id = created.review_id,
        booking_id,
        rating = created.rating,
        "Review created"
    );
    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::REVIEW)
            .entity("booking", booking_id)
            .description(format!("rating {}", created.rating)),
    )
    .await;

    let service_name = service::Entity::find_by_id(found.service_id)
        .one(db)
        .await?
        .map(|s| s.service_name);

    let mut info = ReviewInfo::from(created);
    info.client_name = Some(principal.full_name());
    info.service_name = service_name;
    Ok(info)
}

/// Ratings of a provider, used by the review list and the dashboard
pub(crate) async fn stats_of<C: ConnectionTrait>(db: &C, provider_id: i32) -> anyhow::Result<ReviewStats> {
    let ratings: Vec<i32> = review::Entity::find()
        .select_only()
        .column(review::Column::Rating)
        .filter(review::Column::ProviderId.eq(provider_id))
        .into_tuple()
        .all(db)
        .await?;

    Ok(ReviewStats::from_ratings(&ratings))
}

/// Reviews received by the caller, newest first, with rating statistics
pub async fn list_for_provider(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<ProviderReviews> {
    let provider = scope::provider_of(db, principal).await?;

    let reviews = review::Entity::find()
        .filter(review::Column::ProviderId.eq(provider.provider_id))
        .order_by_desc(review::Column::CreatedAt)
        .order_by_desc(review::Column::ReviewId)
        .all(db)
        .await?;

    let booking_ids: Vec<i32> = reviews.iter().map(|r| r.booking_id).collect();
    let (clients, services) = tokio::join!(
        scope::resident_names(db, reviews.iter().map(|r| r.resident_id)),
        booking::Entity::find()
            .select_only()
            .column(booking::Column::BookingId)
            .column(service::Column::ServiceName)
            .inner_join(service::Entity)
            .filter(booking::Column::BookingId.is_in(booking_ids))
            .into_tuple::<(i32, String)>()
            .all(db)
    );
    let clients = clients?;
    let services: HashMap<i32, String> = services?.into_iter().collect();

    let ratings: Vec<i32> = reviews.iter().map(|r| r.rating).collect();
    let stats = ReviewStats::from_ratings(&ratings);

    let reviews = reviews
        .into_iter()
        .map(|r| {
            let resident_id = r.resident_id;
            let mut info = ReviewInfo::from(r);
            info.client_name = clients.get(&resident_id).cloned();
            info.service_name = services.get(&info.booking_id).cloned();
            info
        })
        .collect();

    Ok(ProviderReviews { reviews, stats })
}

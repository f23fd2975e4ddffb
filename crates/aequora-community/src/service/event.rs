//! Community events: requests, publication and participation

use std::collections::HashMap;

use sea_orm::*;

use aequora_auth::Principal;
use aequora_common::{AequoraError, non_blank};
use aequora_persistence::entity::sea_orm_active_enums::{
    EventCategory, EventStatus, InterestType, NotificationType,
};
use aequora_persistence::entity::{event, eventparticipation, resident};

use crate::model::{
    EventActionRequest, EventInfo, EventRequest, ParticipateRequest, ParticipationInfo,
    parse_field, parse_field_or, validate,
};

use super::activity::{self, ActivityEntry, action};
use super::notification::{self, Notice};
use super::scope;

#[derive(Debug, Clone, Copy, Default)]
struct InterestCounts {
    going: u64,
    interested: u64,
}

async fn interest_counts<C: ConnectionTrait>(
    db: &C,
    event_ids: &[i32],
) -> anyhow::Result<HashMap<i32, InterestCounts>> {
    if event_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, String, i64)> = eventparticipation::Entity::find()
        .select_only()
        .column(eventparticipation::Column::EventId)
        .column(eventparticipation::Column::InterestType)
        .column_as(eventparticipation::Column::ParticipationId.count(), "count")
        .filter(eventparticipation::Column::EventId.is_in(event_ids.iter().copied()))
        .group_by(eventparticipation::Column::EventId)
        .group_by(eventparticipation::Column::InterestType)
        .into_tuple()
        .all(db)
        .await?;

    let going = InterestType::Going.to_value();
    let interested = InterestType::Interested.to_value();
    let mut result: HashMap<i32, InterestCounts> = HashMap::new();
    for (event_id, interest, count) in rows {
        let counts = result.entry(event_id).or_default();
        if interest == going {
            counts.going += count as u64;
        } else if interest == interested {
            counts.interested += count as u64;
        }
    }

    Ok(result)
}

async fn enrich<C: ConnectionTrait>(
    db: &C,
    events: Vec<event::Model>,
    viewer: Option<i32>,
) -> anyhow::Result<Vec<EventInfo>> {
    let ids: Vec<i32> = events.iter().map(|e| e.event_id).collect();
    let counts = interest_counts(db, &ids).await?;
    let names = scope::user_names(db, events.iter().map(|e| e.posted_by_id)).await?;

    let mine: HashMap<i32, InterestType> = match viewer {
        Some(resident_id) if !ids.is_empty() => eventparticipation::Entity::find()
            .filter(eventparticipation::Column::ResidentId.eq(resident_id))
            .filter(eventparticipation::Column::EventId.is_in(ids.iter().copied()))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.event_id, p.interest_type))
            .collect(),
        _ => HashMap::new(),
    };

    Ok(events
        .into_iter()
        .map(|e| {
            let event_id = e.event_id;
            let posted_by = e.posted_by_id;
            let counts = counts.get(&event_id).copied().unwrap_or_default();
            let mut info = EventInfo::from(e);
            info.posted_by_name = names.get(&posted_by).cloned();
            info.going_count = counts.going;
            info.interested_count = counts.interested;
            info.my_interest = mine.get(&event_id).copied();
            info
        })
        .collect())
}

fn check_event_request(req: &EventRequest) -> anyhow::Result<EventCategory> {
    validate(req)?;
    if req.title.trim().is_empty() {
        return Err(AequoraError::ValidationFailed("title: must not be blank".to_string()).into());
    }
    if req.date < super::today() {
        return Err(AequoraError::IllegalArgument("event date must not be in the past".to_string()).into());
    }

    Ok(parse_field_or("category", req.category.as_deref(), EventCategory::Other)?)
}

fn new_event(
    req: EventRequest,
    posted_by: i32,
    community_id: i32,
    category: EventCategory,
    status: EventStatus,
) -> event::ActiveModel {
    event::ActiveModel {
        posted_by_id: Set(posted_by),
        community_id: Set(community_id),
        title: Set(req.title.trim().to_string()),
        description: Set(non_blank(req.description)),
        photo: Set(non_blank(req.photo)),
        date: Set(req.date),
        time: Set(req.time),
        location: Set(non_blank(req.location)),
        category: Set(category),
        status: Set(status),
        created_at: Set(super::now()),
        ..Default::default()
    }
}

/// Approved upcoming events of the caller's community
pub async fn upcoming_for_resident(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<Vec<EventInfo>> {
    let community_id = scope::require_community(principal)?;
    let resident = scope::resident_of(db, principal).await?;

    let events = event::Entity::find()
        .filter(event::Column::CommunityId.eq(community_id))
        .filter(event::Column::Status.eq(EventStatus::Approved))
        .filter(event::Column::Date.gte(super::today()))
        .order_by_asc(event::Column::Date)
        .order_by_asc(event::Column::Time)
        .all(db)
        .await?;

    enrich(db, events, Some(resident.resident_id)).await
}

/// A resident asks the authorities to publish an event
pub async fn request(db: &DatabaseConnection, principal: &Principal, req: EventRequest) -> anyhow::Result<EventInfo> {
    let category = check_event_request(&req)?;
    let community_id = scope::require_community(principal)?;

    let tx = db.begin().await?;

    let created = new_event(req, principal.user_id, community_id, category, EventStatus::Pending)
        .insert(&tx)
        .await?;

    let recipients = notification::authority_users(&tx, community_id).await?;
    let link = format!("/authority/events/requests/{}", created.event_id);
    let notice = Notice::new(
        NotificationType::Event,
        format!("{} requested the event '{}'", principal.full_name(), created.title),
    )
    .community(community_id)
    .link(&link);
    notification::notify(&tx, &recipients, &notice).await?;

    tx.commit().await?;

    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::REQUEST_EVENT)
            .entity("event", created.event_id)
            .description(created.title.clone()),
    )
    .await;

    let mut info = EventInfo::from(created);
    info.posted_by_name = Some(principal.full_name());
    Ok(info)
}

/// Record the caller's interest in an approved community event
pub async fn participate(
    db: &DatabaseConnection,
    principal: &Principal,
    req: ParticipateRequest,
) -> anyhow::Result<ParticipationInfo> {
    let interest: InterestType = parse_field("interest_type", &req.interest_type)?;
    let community_id = scope::require_community(principal)?;
    let resident = scope::resident_of(db, principal).await?;

    let found = event::Entity::find_by_id(req.event_id)
        .filter(event::Column::CommunityId.eq(community_id))
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("event {}", req.event_id)))?;

    if found.status != EventStatus::Approved {
        return Err(AequoraError::IllegalState(format!(
            "event {} is {} and does not take participants",
            found.event_id,
            found.status.to_value()
        ))
        .into());
    }

    let existing = eventparticipation::Entity::find()
        .filter(eventparticipation::Column::EventId.eq(found.event_id))
        .filter(eventparticipation::Column::ResidentId.eq(resident.resident_id))
        .one(db)
        .await?;

    match existing {
        Some(participation) if participation.interest_type == interest => {}
        Some(participation) => {
            let mut active: eventparticipation::ActiveModel = participation.into();
            active.interest_type = Set(interest);
            active.update(db).await?;
        }
        None => {
            eventparticipation::ActiveModel {
                event_id: Set(found.event_id),
                resident_id: Set(resident.resident_id),
                interest_type: Set(interest),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }

    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::PARTICIPATE_EVENT)
            .entity("event", found.event_id)
            .description(interest.to_value()),
    )
    .await;

    let counts = interest_counts(db, &[found.event_id])
        .await?
        .remove(&found.event_id)
        .unwrap_or_default();

    Ok(ParticipationInfo {
        event_id: found.event_id,
        interest_type: interest,
        going_count: counts.going,
        interested_count: counts.interested,
    })
}

/// Approved events of the caller's communities
pub async fn list_for_authority(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<Vec<EventInfo>> {
    let communities = scope::authority_communities(db, principal).await?;
    if communities.is_empty() {
        return Ok(Vec::new());
    }

    let events = event::Entity::find()
        .filter(event::Column::CommunityId.is_in(communities))
        .filter(event::Column::Status.eq(EventStatus::Approved))
        .order_by_desc(event::Column::Date)
        .order_by_desc(event::Column::Time)
        .all(db)
        .await?;

    enrich(db, events, None).await
}

/// Pending event requests of the caller's communities, oldest first
pub async fn pending_requests(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<Vec<EventInfo>> {
    let communities = scope::authority_communities(db, principal).await?;
    if communities.is_empty() {
        return Ok(Vec::new());
    }

    let events = event::Entity::find()
        .filter(event::Column::CommunityId.is_in(communities))
        .filter(event::Column::Status.eq(EventStatus::Pending))
        .order_by_asc(event::Column::CreatedAt)
        .all(db)
        .await?;

    enrich(db, events, None).await
}

async fn announce_published<C: ConnectionTrait>(db: &C, published: &event::Model) -> anyhow::Result<()> {
    let recipients = notification::resident_users(db, published.community_id).await?;
    let link = format!("/resident/events/{}", published.event_id);
    let notice = Notice::new(
        NotificationType::Event,
        format!(
            "New event: {} on {} at {}",
            published.title,
            published.date,
            published.time.format("%H:%M")
        ),
    )
    .community(published.community_id)
    .link(&link);
    notification::notify(db, &recipients, &notice).await?;

    Ok(())
}

/// Publish an event directly into a served community
pub async fn publish(db: &DatabaseConnection, principal: &Principal, req: EventRequest) -> anyhow::Result<EventInfo> {
    let category = check_event_request(&req)?;
    let communities = scope::require_authority_communities(db, principal).await?;
    let community_id = match req.community_id {
        Some(id) if communities.contains(&id) => id,
        Some(id) => return Err(AequoraError::ResourceNotFound(format!("community {}", id)).into()),
        None => communities[0],
    };

    let tx = db.begin().await?;

    let created = new_event(req, principal.user_id, community_id, category, EventStatus::Approved)
        .insert(&tx)
        .await?;
    announce_published(&tx, &created).await?;

    tx.commit().await?;

    tracing::info!(event_id = created.event_id, community_id, "Event published");
    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::PUBLISH_EVENT)
            .entity("event", created.event_id)
            .description(created.title.clone()),
    )
    .await;

    let mut info = EventInfo::from(created);
    info.posted_by_name = Some(principal.full_name());
    Ok(info)
}

async fn find_for_authority(
    db: &DatabaseConnection,
    principal: &Principal,
    event_id: i32,
) -> anyhow::Result<event::Model> {
    let communities = scope::authority_communities(db, principal).await?;

    event::Entity::find_by_id(event_id)
        .filter(event::Column::CommunityId.is_in(communities))
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("event {}", event_id)).into())
}

/// Approve or reject a pending event request
pub async fn act(
    db: &DatabaseConnection,
    principal: &Principal,
    event_id: i32,
    req: EventActionRequest,
) -> anyhow::Result<EventInfo> {
    let next = match req.action.trim().to_lowercase().as_str() {
        "approve" | "approved" => EventStatus::Approved,
        "reject" | "rejected" => EventStatus::Rejected,
        other => {
            return Err(AequoraError::ValidationFailed(format!(
                "action: unsupported value '{}'",
                other
            ))
            .into());
        }
    };

    let found = find_for_authority(db, principal, event_id).await?;
    if found.status != EventStatus::Pending {
        return Err(AequoraError::IllegalState(format!(
            "event {} is already {}",
            event_id,
            found.status.to_value()
        ))
        .into());
    }

    let tx = db.begin().await?;

    let mut active: event::ActiveModel = found.into();
    active.status = Set(next);
    let updated = active.update(&tx).await?;

    if next == EventStatus::Approved {
        announce_published(&tx, &updated).await?;
    }

    let notice = Notice::new(
        NotificationType::Event,
        format!(
            "Your event request '{}' was {}",
            updated.title,
            next.to_value().to_lowercase()
        ),
    )
    .community(updated.community_id);
    notification::notify(&tx, &[updated.posted_by_id], &notice).await?;

    tx.commit().await?;

    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::REVIEW_EVENT)
            .entity("event", event_id)
            .description(next.to_value()),
    )
    .await;

    let mut infos = enrich(db, vec![updated], None).await?;
    infos
        .pop()
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("event {}", event_id)).into())
}

/// Cancel an event and tell everyone who responded to it
pub async fn cancel(db: &DatabaseConnection, principal: &Principal, event_id: i32) -> anyhow::Result<EventInfo> {
    let found = find_for_authority(db, principal, event_id).await?;
    if matches!(found.status, EventStatus::Cancelled | EventStatus::Rejected) {
        return Err(AequoraError::IllegalState(format!(
            "event {} is already {}",
            event_id,
            found.status.to_value()
        ))
        .into());
    }

    let participants: Vec<i32> = resident::Entity::find()
        .select_only()
        .column(resident::Column::UserId)
        .filter(
            resident::Column::ResidentId.in_subquery(
                eventparticipation::Entity::find()
                    .select_only()
                    .column(eventparticipation::Column::ResidentId)
                    .filter(eventparticipation::Column::EventId.eq(event_id))
                    .into_query(),
            ),
        )
        .into_tuple()
        .all(db)
        .await?;

    let tx = db.begin().await?;

    let mut active: event::ActiveModel = found.into();
    active.status = Set(EventStatus::Cancelled);
    let updated = active.update(&tx).await?;

    let mut recipients = participants;
    recipients.push(updated.posted_by_id);
    recipients.retain(|id| *id != principal.user_id);

    let notice = Notice::new(
        NotificationType::Event,
        format!("The event '{}' on {} has been cancelled", updated.title, updated.date),
    )
    .community(updated.community_id);
    notification::notify(&tx, &recipients, &notice).await?;

    tx.commit().await?;

    tracing::info!(event_id, "Event cancelled");
    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::CANCEL_EVENT).entity("event", event_id),
    )
    .await;

    let mut infos = enrich(db, vec![updated], None).await?;
    infos
        .pop()
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("event {}", event_id)).into())
}

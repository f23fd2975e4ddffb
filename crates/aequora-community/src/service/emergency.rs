//! Emergency (SOS) alerts

use std::collections::HashMap;

use sea_orm::*;

use aequora_auth::Principal;
use aequora_common::{AequoraError, non_blank};
use aequora_persistence::entity::sea_orm_active_enums::{
    EmergencyStatus, EmergencyType, NotificationType,
};
use aequora_persistence::entity::{emergencyreport, resident, user_phonenumber};

use crate::model::{DispatchRequest, SosFilter, SosInfo, SosRequest, StatusRequest, parse_field, validate};

use super::activity::{self, ActivityEntry, action};
use super::notification::{self, Notice};
use super::scope;

/// Raise an SOS in the caller's community and alert every authority there
pub async fn raise(db: &DatabaseConnection, principal: &Principal, req: SosRequest) -> anyhow::Result<SosInfo> {
    validate(&req)?;
    let emergency_type: EmergencyType = parse_field("emergency_type", &req.emergency_type)?;
    let community_id = scope::require_community(principal)?;
    let resident = scope::resident_of(db, principal).await?;

    let tx = db.begin().await?;

    let created = emergencyreport::ActiveModel {
        resident_id: Set(resident.resident_id),
        community_id: Set(community_id),
        emergency_type: Set(emergency_type),
        photo: Set(non_blank(req.photo)),
        location: Set(non_blank(req.location)),
        description: Set(non_blank(req.description)),
        status: Set(EmergencyStatus::Active),
        timestamp: Set(super::now()),
        ..Default::default()
    }
    .insert(&tx)
    .await?;

    let recipients = notification::authority_users(&tx, community_id).await?;
    let link = format!("/authority/sos/{}", created.sos_id);
    let location = created.location.as_deref().unwrap_or("unknown location");
    let notice = Notice::new(
        NotificationType::Sos,
        format!(
            "SOS: {} emergency reported by {} at {}",
            emergency_type.to_value(),
            principal.full_name(),
            location
        ),
    )
    .community(community_id)
    .link(&link);
    let alerted = notification::notify(&tx, &recipients, &notice).await?;

    tx.commit().await?;

    tracing::warn!(
        sos_id = created.sos_id,
        community_id,
        emergency_type = %emergency_type.to_value(),
        alerted,
        "SOS raised"
    );
    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::RAISE_SOS)
            .entity("sos", created.sos_id)
            .description(emergency_type.to_value()),
    )
    .await;

    let mut info = SosInfo::from(created);
    info.resident_name = Some(principal.full_name());
    Ok(info)
}

/// The caller's own reports, newest first
pub async fn list_own(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<Vec<SosInfo>> {
    let resident = scope::resident_of(db, principal).await?;

    let reports = emergencyreport::Entity::find()
        .filter(emergencyreport::Column::ResidentId.eq(resident.resident_id))
        .order_by_desc(emergencyreport::Column::Timestamp)
        .order_by_desc(emergencyreport::Column::SosId)
        .all(db)
        .await?;

    Ok(reports.into_iter().map(SosInfo::from).collect())
}

async fn enrich<C: ConnectionTrait>(db: &C, reports: Vec<emergencyreport::Model>) -> anyhow::Result<Vec<SosInfo>> {
    let residents: HashMap<i32, resident::Model> = resident::Entity::find()
        .filter(resident::Column::ResidentId.is_in(reports.iter().map(|r| r.resident_id)))
        .all(db)
        .await?
        .into_iter()
        .map(|r| (r.resident_id, r))
        .collect();

    let names = scope::user_names(db, residents.values().map(|r| r.user_id)).await?;

    let mut phones: HashMap<i32, String> = HashMap::new();
    for phone in user_phonenumber::Entity::find()
        .filter(user_phonenumber::Column::UserId.is_in(residents.values().map(|r| r.user_id)))
        .order_by_asc(user_phonenumber::Column::PhoneId)
        .all(db)
        .await?
    {
        phones.entry(phone.user_id).or_insert(phone.phone_number);
    }

    Ok(reports
        .into_iter()
        .map(|report| {
            let reporter = residents.get(&report.resident_id);
            let mut info = SosInfo::from(report);
            if let Some(reporter) = reporter {
                info.resident_name = names.get(&reporter.user_id).cloned();
                // Emergency contact first, then the first registered phone
                info.resident_phone = reporter
                    .emergency_contact
                    .clone()
                    .or_else(|| phones.get(&reporter.user_id).cloned());
            }
            info
        })
        .collect())
}

/// Reports of the caller's communities, newest first
pub async fn list_for_authority(
    db: &DatabaseConnection,
    principal: &Principal,
    filter: &SosFilter,
) -> anyhow::Result<Vec<SosInfo>> {
    let communities = scope::authority_communities(db, principal).await?;
    if communities.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = emergencyreport::Entity::find()
        .filter(emergencyreport::Column::CommunityId.is_in(communities));
    if let Some(status) = filter.status.as_deref().filter(|v| !v.trim().is_empty()) {
        query = query.filter(
            emergencyreport::Column::Status.eq(parse_field::<EmergencyStatus>("status", status)?),
        );
    }

    let reports = query
        .order_by_desc(emergencyreport::Column::Timestamp)
        .order_by_desc(emergencyreport::Column::SosId)
        .all(db)
        .await?;

    enrich(db, reports).await
}

async fn transition(
    db: &DatabaseConnection,
    principal: &Principal,
    sos_id: i32,
    next: EmergencyStatus,
    message: impl FnOnce(&emergencyreport::Model) -> String,
) -> anyhow::Result<SosInfo> {
    let communities = scope::authority_communities(db, principal).await?;
    let found = emergencyreport::Entity::find_by_id(sos_id)
        .filter(emergencyreport::Column::CommunityId.is_in(communities))
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("emergency report {}", sos_id)))?;

    if !found.status.can_transition_to(next) {
        return Err(AequoraError::IllegalState(format!(
            "emergency report {} cannot move from {} to {}",
            sos_id,
            found.status.to_value(),
            next.to_value()
        ))
        .into());
    }

    let resident_user = scope::user_of_resident(db, found.resident_id).await?;

    let tx = db.begin().await?;

    let mut active: emergencyreport::ActiveModel = found.into();
    active.status = Set(next);
    let updated = active.update(&tx).await?;

    if let Some(resident_user) = resident_user {
        let notice = Notice::new(NotificationType::Sos, message(&updated)).community(updated.community_id);
        notification::notify(&tx, &[resident_user], &notice).await?;
    }

    tx.commit().await?;

    tracing::info!(sos_id, status = %next.to_value(), "SOS status changed");
    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::UPDATE_SOS)
            .entity("sos", sos_id)
            .description(next.to_value()),
    )
    .await;

    let mut infos = enrich(db, vec![updated]).await?;
    infos
        .pop()
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("emergency report {}", sos_id)).into())
}

/// Move a report along Active -> Dispatched -> Resolved
pub async fn update_status(
    db: &DatabaseConnection,
    principal: &Principal,
    sos_id: i32,
    req: StatusRequest,
) -> anyhow::Result<SosInfo> {
    let next: EmergencyStatus = parse_field("status", &req.status)?;

    transition(db, principal, sos_id, next, |report| {
        format!(
            "Your {} emergency report is now {}",
            report.emergency_type.to_value(),
            next.to_value()
        )
    })
    .await
}

/// Mark a report dispatched, naming the responding service
pub async fn dispatch(
    db: &DatabaseConnection,
    principal: &Principal,
    sos_id: i32,
    req: DispatchRequest,
) -> anyhow::Result<SosInfo> {
    let service = req.service.trim().to_string();
    if service.is_empty() {
        return Err(AequoraError::ValidationFailed("service: must not be blank".to_string()).into());
    }

    transition(db, principal, sos_id, EmergencyStatus::Dispatched, |report| {
        format!(
            "{} has been dispatched for your {} emergency",
            service,
            report.emergency_type.to_value()
        )
    })
    .await
}

//! User administration and platform statistics

use std::collections::HashMap;

use sea_orm::*;

use aequora_auth::Principal;
use aequora_common::{AequoraError, paging};
use aequora_persistence::Page;
use aequora_persistence::entity::sea_orm_active_enums::{
    EmergencyStatus, IssueStatus, NotificationType, Role, UserStatus,
    VerificationStatus,
};
use aequora_persistence::entity::{
    booking, community, emergencyreport, issuereport, resident, user, user_email,
};

use crate::model::{
    AdminStats, ResidentDetails, StatusRequest, UserSearch, UserSummary, parse_field,
};

use super::activity::{self, ActivityEntry, action};
use super::notification::{self, Notice};

/// Paged user listing with optional filters
pub async fn search_users(db: &DatabaseConnection, search: &UserSearch) -> anyhow::Result<Page<UserSummary>> {
    let (page_no, page_size) = paging(search.page_no, search.page_size);
    let mut query = user::Entity::find();

    if let Some(role) = search.role.as_deref().filter(|v| !v.trim().is_empty()) {
        query = query.filter(user::Column::Role.eq(parse_field::<Role>("role", role)?));
    }
    if let Some(status) = search.status.as_deref().filter(|v| !v.trim().is_empty()) {
        query = query.filter(user::Column::Status.eq(parse_field::<UserStatus>("status", status)?));
    }
    if let Some(community_id) = search.community_id {
        query = query.filter(user::Column::CommunityId.eq(community_id));
    }
    if let Some(term) = search.search.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(user::Column::FirstName.contains(term))
                .add(user::Column::LastName.contains(term))
                .add(
                    user::Column::UserId.in_subquery(
                        user_email::Entity::find()
                            .select_only()
                            .column(user_email::Column::UserId)
                            .filter(user_email::Column::Email.contains(term.to_lowercase()))
                            .into_query(),
                    ),
                ),
        );
    }

    let query = query.order_by_asc(user::Column::UserId);
    let total_count = query.clone().count(db).await?;
    if total_count == 0 {
        return Ok(Page::empty());
    }

    let users = query
        .offset((page_no - 1) * page_size)
        .limit(page_size)
        .all(db)
        .await?;

    let emails: HashMap<i32, String> = user_email::Entity::find()
        .filter(user_email::Column::UserId.is_in(users.iter().map(|u| u.user_id)))
        .order_by_desc(user_email::Column::EmailId)
        .all(db)
        .await?
        .into_iter()
        .map(|e| (e.user_id, e.email))
        .collect();

    let items = users
        .into_iter()
        .map(|u| UserSummary {
            email: emails.get(&u.user_id).cloned(),
            user_id: u.user_id,
            first_name: u.first_name,
            last_name: u.last_name,
            role: u.role,
            status: u.status,
            community_id: u.community_id,
            created_at: u.created_at,
        })
        .collect();

    Ok(Page::new(total_count, page_no, page_size, items))
}

/// Activate, deactivate or suspend a user
pub async fn set_user_status(
    db: &DatabaseConnection,
    principal: &Principal,
    user_id: i32,
    req: StatusRequest,
) -> anyhow::Result<UserSummary> {
    let status: UserStatus = parse_field("status", &req.status)?;

    if user_id == principal.user_id {
        return Err(AequoraError::IllegalArgument(
            "administrators cannot change their own status".to_string(),
        )
        .into());
    }

    let found = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("user {}", user_id)))?;

    let mut active: user::ActiveModel = found.into();
    active.status = Set(status);
    active.updated_at = Set(super::now());
    let updated = active.update(db).await?;

    tracing::info!(
        admin = principal.user_id,
        user_id,
        status = %status.to_value(),
        "User status changed"
    );
    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::UPDATE_USER_STATUS)
            .entity("user", user_id)
            .description(format!("status set to {}", status.to_value())),
    )
    .await;

    Ok(UserSummary {
        email: super::scope::email_of(db, user_id).await?,
        user_id: updated.user_id,
        first_name: updated.first_name,
        last_name: updated.last_name,
        role: updated.role,
        status: updated.status,
        community_id: updated.community_id,
        created_at: updated.created_at,
    })
}

/// Set a resident's verification status and tell the resident
pub async fn set_verification(
    db: &DatabaseConnection,
    principal: &Principal,
    resident_id: i32,
    req: StatusRequest,
) -> anyhow::Result<ResidentDetails> {
    let status: VerificationStatus = parse_field("verification_status", &req.status)?;

    let found = resident::Entity::find_by_id(resident_id)
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("resident {}", resident_id)))?;
    let user_id = found.user_id;

    let tx = db.begin().await?;

    let mut active: resident::ActiveModel = found.into();
    active.verification_status = Set(status);
    let updated = active.update(&tx).await?;

    let notice = Notice::new(
        NotificationType::System,
        format!("Your residency verification is now {}", status.to_value()),
    );
    notification::notify(&tx, &[user_id], &notice).await?;

    tx.commit().await?;

    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::VERIFY_RESIDENT)
            .entity("resident", resident_id)
            .description(status.to_value()),
    )
    .await;

    Ok(ResidentDetails {
        resident_id: updated.resident_id,
        house_no: updated.house_no,
        street: updated.street,
        thana: updated.thana,
        district: updated.district,
        emergency_contact: updated.emergency_contact,
        verification_status: updated.verification_status,
    })
}

/// Platform-wide counters for the admin dashboard
pub async fn stats(db: &DatabaseConnection) -> anyhow::Result<AdminStats> {
    let count_role = |role: Role| {
        user::Entity::find()
            .filter(user::Column::Role.eq(role))
            .count(db)
    };

    let (communities, users, residents, authorities, providers, suspended) = tokio::join!(
        community::Entity::find().count(db),
        user::Entity::find().count(db),
        count_role(Role::Resident),
        count_role(Role::Authority),
        count_role(Role::ServiceProvider),
        user::Entity::find()
            .filter(user::Column::Status.eq(UserStatus::Suspended))
            .count(db)
    );

    let (open_issues, active_sos, bookings) = tokio::join!(
        issuereport::Entity::find()
            .filter(issuereport::Column::Status.is_in([IssueStatus::Pending, IssueStatus::InProgress]))
            .count(db),
        emergencyreport::Entity::find()
            .filter(
                emergencyreport::Column::Status
                    .is_in([EmergencyStatus::Active, EmergencyStatus::Dispatched]),
            )
            .count(db),
        booking::Entity::find().count(db)
    );

    Ok(AdminStats {
        total_communities: communities?,
        total_users: users?,
        residents: residents?,
        authorities: authorities?,
        service_providers: providers?,
        suspended_users: suspended?,
        open_issues: open_issues?,
        active_sos: active_sos?,
        total_bookings: bookings?,
    })
}

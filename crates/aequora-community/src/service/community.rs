//! Community administration

use std::collections::HashMap;

use sea_orm::{prelude::Expr, *};

use aequora_auth::Principal;
use aequora_common::AequoraError;
use aequora_persistence::entity::sea_orm_active_enums::Role;
use aequora_persistence::entity::{
    authoritycommunity, booking, community, emergencyreport, event, issuereport, notification,
    service, user,
};

use crate::model::{CommunityInfo, CommunityRef, CommunityRequest, validate};

use super::activity::{self, ActivityEntry, action};

/// Public community picker used by registration
pub async fn list_public(db: &DatabaseConnection) -> anyhow::Result<Vec<CommunityRef>> {
    let rows: Vec<(i32, String)> = community::Entity::find()
        .select_only()
        .column(community::Column::CommunityId)
        .column(community::Column::Name)
        .order_by_asc(community::Column::Name)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(community_id, name)| CommunityRef { community_id, name })
        .collect())
}

async fn resident_counts(db: &DatabaseConnection) -> HashMap<i32, u64> {
    let counts = user::Entity::find()
        .select_only()
        .column(user::Column::CommunityId)
        .column_as(user::Column::UserId.count(), "count")
        .filter(user::Column::Role.eq(Role::Resident))
        .filter(user::Column::CommunityId.is_not_null())
        .group_by(user::Column::CommunityId)
        .into_tuple::<(i32, i64)>()
        .all(db)
        .await;

    match counts {
        Ok(rows) => rows.into_iter().map(|(id, n)| (id, n as u64)).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to count residents per community");
            HashMap::new()
        }
    }
}

/// All communities with their resident counts
pub async fn list(db: &DatabaseConnection) -> anyhow::Result<Vec<CommunityInfo>> {
    let (communities, counts) = tokio::join!(
        community::Entity::find()
            .order_by_asc(community::Column::Name)
            .all(db),
        resident_counts(db)
    );

    Ok(communities?
        .into_iter()
        .map(|c| {
            let count = counts.get(&c.community_id).copied().unwrap_or_default();
            CommunityInfo::from_model(c, count)
        })
        .collect())
}

async fn find(db: &DatabaseConnection, community_id: i32) -> anyhow::Result<community::Model> {
    community::Entity::find_by_id(community_id)
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::ResourceNotFound(format!("community {}", community_id)).into())
}

pub async fn get(db: &DatabaseConnection, community_id: i32) -> anyhow::Result<CommunityInfo> {
    let found = find(db, community_id).await?;
    let residents = user::Entity::find()
        .filter(user::Column::Role.eq(Role::Resident))
        .filter(user::Column::CommunityId.eq(community_id))
        .count(db)
        .await?;

    Ok(CommunityInfo::from_model(found, residents))
}

async fn ensure_unique(
    db: &DatabaseConnection,
    name: &str,
    postal_code: &str,
    except: Option<i32>,
) -> anyhow::Result<()> {
    let mut query = community::Entity::find()
        .filter(community::Column::Name.eq(name))
        .filter(community::Column::PostalCode.eq(postal_code));
    if let Some(id) = except {
        query = query.filter(community::Column::CommunityId.ne(id));
    }

    if query.one(db).await?.is_some() {
        return Err(AequoraError::ResourceConflict(format!(
            "community '{}' with postal code '{}' already exists",
            name, postal_code
        ))
        .into());
    }

    Ok(())
}

pub async fn create(
    db: &DatabaseConnection,
    principal: &Principal,
    req: CommunityRequest,
) -> anyhow::Result<CommunityInfo> {
    validate(&req)?;

    let name = req.name.trim().to_string();
    let postal_code = req.postal_code.trim().to_string();
    if name.is_empty() {
        return Err(AequoraError::ValidationFailed("name: must not be blank".to_string()).into());
    }
    ensure_unique(db, &name, &postal_code, None).await?;

    let created = community::ActiveModel {
        name: Set(name),
        city: Set(req.city.trim().to_string()),
        district: Set(req.district.trim().to_string()),
        thana: Set(req.thana.trim().to_string()),
        postal_code: Set(postal_code),
        created_at: Set(super::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::CREATE_COMMUNITY)
            .entity("community", created.community_id)
            .description(created.name.clone()),
    )
    .await;

    Ok(CommunityInfo::from_model(created, 0))
}

pub async fn update(
    db: &DatabaseConnection,
    principal: &Principal,
    community_id: i32,
    req: CommunityRequest,
) -> anyhow::Result<CommunityInfo> {
    validate(&req)?;

    let found = find(db, community_id).await?;
    let name = req.name.trim().to_string();
    let postal_code = req.postal_code.trim().to_string();
    ensure_unique(db, &name, &postal_code, Some(community_id)).await?;

    let mut active: community::ActiveModel = found.into();
    active.name = Set(name);
    active.city = Set(req.city.trim().to_string());
    active.district = Set(req.district.trim().to_string());
    active.thana = Set(req.thana.trim().to_string());
    active.postal_code = Set(postal_code);
    active.update(db).await?;

    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::UPDATE_COMMUNITY)
            .entity("community", community_id),
    )
    .await;

    get(db, community_id).await
}

/// Delete a community nothing references any more
pub async fn delete(
    db: &DatabaseConnection,
    principal: &Principal,
    community_id: i32,
) -> anyhow::Result<()> {
    let found = find(db, community_id).await?;

    let (users, issues, services, bookings, events, reports) = tokio::join!(
        user::Entity::find()
            .filter(user::Column::CommunityId.eq(community_id))
            .count(db),
        issuereport::Entity::find()
            .filter(issuereport::Column::CommunityId.eq(community_id))
            .count(db),
        service::Entity::find()
            .filter(service::Column::CommunityId.eq(community_id))
            .count(db),
        booking::Entity::find()
            .filter(booking::Column::CommunityId.eq(community_id))
            .count(db),
        event::Entity::find()
            .filter(event::Column::CommunityId.eq(community_id))
            .count(db),
        emergencyreport::Entity::find()
            .filter(emergencyreport::Column::CommunityId.eq(community_id))
            .count(db)
    );

    let referenced = [
        ("users", users?),
        ("issues", issues?),
        ("services", services?),
        ("bookings", bookings?),
        ("events", events?),
        ("emergency reports", reports?),
    ];
    if let Some((what, count)) = referenced.iter().find(|(_, count)| *count > 0) {
        return Err(AequoraError::ResourceConflict(format!(
            "community '{}' is still referenced by {} {}",
            found.name, count, what
        ))
        .into());
    }

    let tx = db.begin().await?;

    authoritycommunity::Entity::delete_many()
        .filter(authoritycommunity::Column::CommunityId.eq(community_id))
        .exec(&tx)
        .await?;

    notification::Entity::update_many()
        .col_expr(notification::Column::CommunityId, Expr::value(Option::<i32>::None))
        .filter(notification::Column::CommunityId.eq(community_id))
        .exec(&tx)
        .await?;

    community::Entity::delete_by_id(community_id).exec(&tx).await?;

    tx.commit().await?;

    tracing::info!(community_id, name = %found.name, "Community deleted");
    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::DELETE_COMMUNITY)
            .entity("community", community_id)
            .description(found.name),
    )
    .await;

    Ok(())
}

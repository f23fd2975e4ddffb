//! Caller scoping
//!
//! Resolves the role profile behind a principal and the communities the
//! caller may see. Records outside those communities are reported as not
//! found.

use std::collections::HashMap;

use sea_orm::*;

use aequora_auth::Principal;
use aequora_common::AequoraError;
use aequora_persistence::entity::sea_orm_active_enums::Role;
use aequora_persistence::entity::{
    authority, authoritycommunity, resident, serviceprovider, user, user_email, user_phonenumber,
};

/// The caller's own community, required for resident and provider writes
pub fn require_community(principal: &Principal) -> Result<i32, AequoraError> {
    principal.community_id.ok_or_else(|| {
        AequoraError::IllegalArgument("caller is not a member of any community".to_string())
    })
}

pub async fn resident_of<C: ConnectionTrait>(
    db: &C,
    principal: &Principal,
) -> anyhow::Result<resident::Model> {
    resident::Entity::find()
        .filter(resident::Column::UserId.eq(principal.user_id))
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::ResourceNotFound("resident profile".to_string()).into())
}

pub async fn authority_of<C: ConnectionTrait>(
    db: &C,
    principal: &Principal,
) -> anyhow::Result<authority::Model> {
    authority::Entity::find()
        .filter(authority::Column::UserId.eq(principal.user_id))
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::ResourceNotFound("authority profile".to_string()).into())
}

pub async fn provider_of<C: ConnectionTrait>(
    db: &C,
    principal: &Principal,
) -> anyhow::Result<serviceprovider::Model> {
    serviceprovider::Entity::find()
        .filter(serviceprovider::Column::UserId.eq(principal.user_id))
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::ResourceNotFound("service provider profile".to_string()).into())
}

/// Communities served by an authority: its explicit mappings plus the
/// community on its user record
pub async fn authority_communities<C: ConnectionTrait>(
    db: &C,
    principal: &Principal,
) -> anyhow::Result<Vec<i32>> {
    let authority = authority_of(db, principal).await?;

    let mut communities: Vec<i32> = authoritycommunity::Entity::find()
        .select_only()
        .column(authoritycommunity::Column::CommunityId)
        .filter(authoritycommunity::Column::AuthorityId.eq(authority.authority_id))
        .into_tuple::<i32>()
        .all(db)
        .await?;

    if let Some(own) = principal.community_id {
        communities.push(own);
    }
    communities.sort_unstable();
    communities.dedup();

    Ok(communities)
}

/// Like [`authority_communities`], but refuses an authority serving nothing
pub async fn require_authority_communities<C: ConnectionTrait>(
    db: &C,
    principal: &Principal,
) -> anyhow::Result<Vec<i32>> {
    let communities = authority_communities(db, principal).await?;
    if communities.is_empty() {
        return Err(AequoraError::IllegalArgument(
            "authority does not serve any community".to_string(),
        )
        .into());
    }

    Ok(communities)
}

/// Whether the caller may see records of `community_id`
pub async fn can_access_community<C: ConnectionTrait>(
    db: &C,
    principal: &Principal,
    community_id: i32,
) -> anyhow::Result<bool> {
    match principal.role {
        Role::Admin => Ok(true),
        Role::Authority => Ok(authority_communities(db, principal)
            .await?
            .contains(&community_id)),
        _ => Ok(principal.community_id == Some(community_id)),
    }
}

/// Full names keyed by user id
pub async fn user_names<C: ConnectionTrait>(
    db: &C,
    user_ids: impl IntoIterator<Item = i32>,
) -> anyhow::Result<HashMap<i32, String>> {
    let ids: Vec<i32> = user_ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users = user::Entity::find()
        .filter(user::Column::UserId.is_in(ids))
        .all(db)
        .await?;

    Ok(users.into_iter().map(|u| (u.user_id, u.full_name())).collect())
}

/// Full names keyed by resident id
pub async fn resident_names<C: ConnectionTrait>(
    db: &C,
    resident_ids: impl IntoIterator<Item = i32>,
) -> anyhow::Result<HashMap<i32, String>> {
    let ids: Vec<i32> = resident_ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let pairs: Vec<(i32, i32)> = resident::Entity::find()
        .select_only()
        .column(resident::Column::ResidentId)
        .column(resident::Column::UserId)
        .filter(resident::Column::ResidentId.is_in(ids))
        .into_tuple()
        .all(db)
        .await?;

    let names = user_names(db, pairs.iter().map(|(_, user_id)| *user_id)).await?;

    Ok(pairs
        .into_iter()
        .filter_map(|(resident_id, user_id)| {
            names.get(&user_id).map(|name| (resident_id, name.clone()))
        })
        .collect())
}

/// Full names keyed by provider id
pub async fn provider_names<C: ConnectionTrait>(
    db: &C,
    provider_ids: impl IntoIterator<Item = i32>,
) -> anyhow::Result<HashMap<i32, String>> {
    let ids: Vec<i32> = provider_ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let pairs: Vec<(i32, i32)> = serviceprovider::Entity::find()
        .select_only()
        .column(serviceprovider::Column::ProviderId)
        .column(serviceprovider::Column::UserId)
        .filter(serviceprovider::Column::ProviderId.is_in(ids))
        .into_tuple()
        .all(db)
        .await?;

    let names = user_names(db, pairs.iter().map(|(_, user_id)| *user_id)).await?;

    Ok(pairs
        .into_iter()
        .filter_map(|(provider_id, user_id)| {
            names.get(&user_id).map(|name| (provider_id, name.clone()))
        })
        .collect())
}

pub async fn user_of_resident<C: ConnectionTrait>(
    db: &C,
    resident_id: i32,
) -> anyhow::Result<Option<i32>> {
    Ok(resident::Entity::find_by_id(resident_id)
        .one(db)
        .await?
        .map(|r| r.user_id))
}

pub async fn user_of_provider<C: ConnectionTrait>(
    db: &C,
    provider_id: i32,
) -> anyhow::Result<Option<i32>> {
    Ok(serviceprovider::Entity::find_by_id(provider_id)
        .one(db)
        .await?
        .map(|p| p.user_id))
}

/// Login email of a user
pub async fn email_of<C: ConnectionTrait>(db: &C, user_id: i32) -> anyhow::Result<Option<String>> {
    Ok(user_email::Entity::find()
        .filter(user_email::Column::UserId.eq(user_id))
        .order_by_asc(user_email::Column::EmailId)
        .one(db)
        .await?
        .map(|e| e.email))
}

/// Primary phone number of a user
pub async fn phone_of<C: ConnectionTrait>(db: &C, user_id: i32) -> anyhow::Result<Option<String>> {
    Ok(user_phonenumber::Entity::find()
        .filter(user_phonenumber::Column::UserId.eq(user_id))
        .order_by_asc(user_phonenumber::Column::PhoneId)
        .one(db)
        .await?
        .map(|p| p.phone_number))
}

/// Replace the primary phone number of a user, inserting one when missing
pub async fn set_phone<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    phone_number: String,
) -> anyhow::Result<()> {
    let existing = user_phonenumber::Entity::find()
        .filter(user_phonenumber::Column::UserId.eq(user_id))
        .order_by_asc(user_phonenumber::Column::PhoneId)
        .one(db)
        .await?;

    match existing {
        Some(phone) => {
            let mut active: user_phonenumber::ActiveModel = phone.into();
            active.phone_number = Set(phone_number);
            active.update(db).await?;
        }
        None => {
            user_phonenumber::ActiveModel {
                user_id: Set(user_id),
                phone_number: Set(phone_number),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }

    Ok(())
}

//! Authority and service-provider profiles

use sea_orm::*;

use aequora_auth::Principal;
use aequora_common::{AequoraError, is_valid_phone, non_blank};
use aequora_persistence::entity::sea_orm_active_enums::ProviderAvailability;
use aequora_persistence::entity::{authority, authoritycommunity, community, serviceprovider, user};

use crate::model::{
    AuthorityProfile, CommunityRef, ProviderProfile, UpdateAuthorityProfileRequest,
    UpdateProviderProfileRequest, parse_field, validate,
};

use super::activity::{self, ActivityEntry, action};
use super::scope;

fn checked_phone(phone: Option<String>) -> Result<Option<String>, AequoraError> {
    match non_blank(phone) {
        Some(p) if !is_valid_phone(&p) => Err(AequoraError::ValidationFailed(format!(
            "phone_number: '{}' is not a valid phone number",
            p
        ))),
        other => Ok(other),
    }
}

async fn load_user<C: ConnectionTrait>(db: &C, user_id: i32) -> anyhow::Result<user::Model> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::UserNotExist(format!("user {}", user_id)).into())
}

async fn rename_user<C: ConnectionTrait>(
    db: &C,
    found: user::Model,
    first_name: Option<String>,
    last_name: Option<String>,
) -> anyhow::Result<()> {
    let first_name = non_blank(first_name);
    let last_name = non_blank(last_name);
    if first_name.is_none() && last_name.is_none() {
        return Ok(());
    }

    let mut active: user::ActiveModel = found.into();
    if let Some(v) = first_name {
        active.first_name = Set(v);
    }
    if let Some(v) = last_name {
        active.last_name = Set(v);
    }
    active.updated_at = Set(super::now());
    active.update(db).await?;

    Ok(())
}

pub async fn authority_profile(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<AuthorityProfile> {
    let found = load_user(db, principal.user_id).await?;
    let profile = scope::authority_of(db, principal).await?;
    let community_ids = scope::authority_communities(db, principal).await?;

    let communities = community::Entity::find()
        .filter(community::Column::CommunityId.is_in(community_ids))
        .order_by_asc(community::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(|c| CommunityRef {
            community_id: c.community_id,
            name: c.name,
        })
        .collect();

    Ok(AuthorityProfile {
        user_id: found.user_id,
        authority_id: profile.authority_id,
        first_name: found.first_name,
        last_name: found.last_name,
        email: scope::email_of(db, found.user_id).await?,
        phone_number: scope::phone_of(db, found.user_id).await?,
        department_name: profile.department_name,
        designation: profile.designation,
        house_no: profile.house_no,
        street: profile.street,
        thana: profile.thana,
        district: profile.district,
        assigned_area: profile.assigned_area,
        profile_certificate: profile.profile_certificate,
        date_joined: profile.date_joined,
        communities,
    })
}

pub async fn update_authority_profile(
    db: &DatabaseConnection,
    principal: &Principal,
    req: UpdateAuthorityProfileRequest,
) -> anyhow::Result<AuthorityProfile> {
    validate(&req)?;
    let phone_number = checked_phone(req.phone_number)?;

    if let Some(ids) = &req.community_ids {
        let known = community::Entity::find()
            .filter(community::Column::CommunityId.is_in(ids.iter().copied()))
            .count(db)
            .await?;
        let mut wanted = ids.clone();
        wanted.sort_unstable();
        wanted.dedup();
        if known != wanted.len() as u64 {
            return Err(AequoraError::ResourceNotFound("one or more communities".to_string()).into());
        }
    }

    let found = load_user(db, principal.user_id).await?;
    let profile = scope::authority_of(db, principal).await?;
    let authority_id = profile.authority_id;

    let tx = db.begin().await?;

    rename_user(&tx, found, req.first_name, req.last_name).await?;
    if let Some(phone_number) = phone_number {
        scope::set_phone(&tx, principal.user_id, phone_number).await?;
    }

    let mut active: authority::ActiveModel = profile.into();
    macro_rules! patch {
        ($($field:ident),+) => {
            $(
                if let Some(v) = req.$field {
                    active.$field = Set(non_blank(Some(v)));
                }
            )+
        };
    }
    patch!(
        department_name,
        designation,
        house_no,
        street,
        thana,
        district,
        assigned_area,
        profile_certificate
    );
    if active.is_changed() {
        active.update(&tx).await?;
    }

    if let Some(mut ids) = req.community_ids {
        ids.sort_unstable();
        ids.dedup();

        authoritycommunity::Entity::delete_many()
            .filter(authoritycommunity::Column::AuthorityId.eq(authority_id))
            .exec(&tx)
            .await?;

        if !ids.is_empty() {
            authoritycommunity::Entity::insert_many(ids.into_iter().map(|community_id| {
                authoritycommunity::ActiveModel {
                    authority_id: Set(authority_id),
                    community_id: Set(community_id),
                    ..Default::default()
                }
            }))
            .exec(&tx)
            .await?;
        }
    }

    tx.commit().await?;

    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::UPDATE_PROFILE)
            .entity("authority", authority_id),
    )
    .await;

    authority_profile(db, principal).await
}

pub async fn provider_profile(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<ProviderProfile> {
    let found = load_user(db, principal.user_id).await?;
    let profile = scope::provider_of(db, principal).await?;

    let community = match found.community_id {
        Some(id) => community::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(|c| CommunityRef {
                community_id: c.community_id,
                name: c.name,
            }),
        None => None,
    };

    Ok(ProviderProfile {
        user_id: found.user_id,
        provider_id: profile.provider_id,
        first_name: found.first_name,
        last_name: found.last_name,
        email: scope::email_of(db, found.user_id).await?,
        phone_number: scope::phone_of(db, found.user_id).await?,
        community,
        service_area: profile.service_area,
        working_hours: profile.working_hours,
        certification_file: profile.certification_file,
        availability_status: profile.availability_status,
        sub_role: profile.sub_role,
    })
}

pub async fn update_provider_profile(
    db: &DatabaseConnection,
    principal: &Principal,
    req: UpdateProviderProfileRequest,
) -> anyhow::Result<ProviderProfile> {
    validate(&req)?;
    let phone_number = checked_phone(req.phone_number)?;
    let availability = match req.availability_status.as_deref() {
        Some(v) => Some(parse_field::<ProviderAvailability>("availability_status", v)?),
        None => None,
    };

    let found = load_user(db, principal.user_id).await?;
    let profile = scope::provider_of(db, principal).await?;
    let provider_id = profile.provider_id;

    let tx = db.begin().await?;

    rename_user(&tx, found, req.first_name, req.last_name).await?;
    if let Some(phone_number) = phone_number {
        scope::set_phone(&tx, principal.user_id, phone_number).await?;
    }

    let mut active: serviceprovider::ActiveModel = profile.into();
    if let Some(v) = req.service_area {
        active.service_area = Set(non_blank(Some(v)));
    }
    if let Some(v) = req.working_hours {
        active.working_hours = Set(non_blank(Some(v)));
    }
    if let Some(v) = req.certification_file {
        active.certification_file = Set(non_blank(Some(v)));
    }
    if let Some(v) = req.sub_role {
        active.sub_role = Set(non_blank(Some(v)));
    }
    if let Some(v) = availability {
        active.availability_status = Set(v);
    }
    if active.is_changed() {
        active.update(&tx).await?;
    }

    tx.commit().await?;

    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::UPDATE_PROFILE)
            .entity("provider", provider_id),
    )
    .await;

    provider_profile(db, principal).await
}

//! Identity workflows: registration, login, logout and the caller's profile

use sea_orm::*;

use aequora_auth::{
    AuthRateLimiter, INVALID_CREDENTIALS_MESSAGE, Principal, TokenService, check_password_policy,
    hash_password, verify_password,
};
use aequora_common::{AequoraError, is_valid_phone, non_blank, normalize_email};
use aequora_persistence::entity::sea_orm_active_enums::{
    ProviderAvailability, Role, TwoFactorStatus, UserStatus, VerificationStatus,
};
use aequora_persistence::entity::{
    authority, authoritycommunity, community, loginlog, resident, serviceprovider, user,
    user_email, user_phonenumber,
};

use crate::model::{
    ClientInfo, CommunityRef, LoginRequest, LoginResponse, ProfileInfo, RegisterRequest,
    ResidentDetails, SetPasswordRequest, UpdateProfileRequest, parse_field, validate,
};

use super::activity::{self, ActivityEntry, action};
use super::scope;

fn check_phone(phone: Option<String>) -> Result<Option<String>, AequoraError> {
    match non_blank(phone) {
        Some(p) if !is_valid_phone(&p) => Err(AequoraError::ValidationFailed(format!(
            "phone_number: '{}' is not a valid phone number",
            p
        ))),
        other => Ok(other),
    }
}

async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> anyhow::Result<Option<user::Model>> {
    let Some(found) = user_email::Entity::find()
        .filter(user_email::Column::Email.eq(email))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    Ok(user::Entity::find_by_id(found.user_id).one(db).await?)
}

async fn require_community_exists<C: ConnectionTrait>(db: &C, community_id: i32) -> anyhow::Result<()> {
    if community::Entity::find_by_id(community_id).one(db).await?.is_none() {
        return Err(AequoraError::ResourceNotFound(format!("community {}", community_id)).into());
    }
    Ok(())
}

/// Register a Resident, Authority or ServiceProvider together with its
/// role profile
pub async fn register(db: &DatabaseConnection, req: RegisterRequest) -> anyhow::Result<ProfileInfo> {
    validate(&req)?;
    check_password_policy(&req.password)?;

    let role: Role = parse_field("role", &req.role)?;
    if role == Role::Admin {
        return Err(AequoraError::IllegalArgument(
            "admin accounts cannot be self-registered".to_string(),
        )
        .into());
    }

    let email = normalize_email(&req.email);
    let phone_number = check_phone(req.phone_number)?;

    if find_by_email(db, &email).await?.is_some() {
        return Err(AequoraError::ResourceConflict(format!("email '{}' is already registered", email)).into());
    }
    if let Some(community_id) = req.community_id {
        require_community_exists(db, community_id).await?;
    }

    let password = hash_password(&req.password)?;
    let now = super::now();

    let tx = db.begin().await?;

    let created = user::ActiveModel {
        community_id: Set(req.community_id),
        first_name: Set(req.first_name.trim().to_string()),
        last_name: Set(req.last_name.trim().to_string()),
        password: Set(password),
        role: Set(role),
        status: Set(UserStatus::Active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&tx)
    .await?;

    user_email::ActiveModel {
        user_id: Set(created.user_id),
        email: Set(email.clone()),
        ..Default::default()
    }
    .insert(&tx)
    .await?;

    if let Some(phone_number) = phone_number {
        user_phonenumber::ActiveModel {
            user_id: Set(created.user_id),
            phone_number: Set(phone_number),
            ..Default::default()
        }
        .insert(&tx)
        .await?;
    }

    match role {
        Role::Resident => {
            resident::ActiveModel {
                user_id: Set(created.user_id),
                house_no: Set(non_blank(req.house_no)),
                street: Set(non_blank(req.street)),
                thana: Set(non_blank(req.thana)),
                district: Set(non_blank(req.district)),
                verification_status: Set(VerificationStatus::Pending),
                registered_date: Set(now),
                ..Default::default()
            }
            .insert(&tx)
            .await?;
        }
        Role::Authority => {
            let profile = authority::ActiveModel {
                user_id: Set(created.user_id),
                department_name: Set(non_blank(req.department_name)),
                designation: Set(non_blank(req.designation)),
                house_no: Set(non_blank(req.house_no)),
                street: Set(non_blank(req.street)),
                thana: Set(non_blank(req.thana)),
                district: Set(non_blank(req.district)),
                date_joined: Set(Some(super::today())),
                ..Default::default()
            }
            .insert(&tx)
            .await?;

            if let Some(community_id) = req.community_id {
                authoritycommunity::ActiveModel {
                    authority_id: Set(profile.authority_id),
                    community_id: Set(community_id),
                    ..Default::default()
                }
                .insert(&tx)
                .await?;
            }
        }
        Role::ServiceProvider => {
            serviceprovider::ActiveModel {
                user_id: Set(created.user_id),
                service_area: Set(non_blank(req.service_area)),
                working_hours: Set(non_blank(req.working_hours)),
                availability_status: Set(ProviderAvailability::Available),
                sub_role: Set(non_blank(req.sub_role)),
                ..Default::default()
            }
            .insert(&tx)
            .await?;
        }
        // Refused before the transaction
        Role::Admin => {}
    }

    tx.commit().await?;

    tracing::info!(user_id = created.user_id, role = %role.to_value(), "User registered");
    activity::record(
        db,
        ActivityEntry::builder(created.user_id, action::REGISTER)
            .entity("user", created.user_id)
            .description(format!("registered as {}", role.to_value())),
    )
    .await;

    profile_info(db, created).await
}

/// Authenticate by email and password, returning a signed token
pub async fn login(
    db: &DatabaseConnection,
    tokens: &TokenService,
    limiter: &AuthRateLimiter,
    req: LoginRequest,
    client: ClientInfo,
) -> anyhow::Result<LoginResponse> {
    let email = normalize_email(&req.username);

    let outcome = limiter.check(&email);
    if !outcome.allowed {
        return Err(AequoraError::TooManyAttempts(outcome.lockout_secs).into());
    }

    let refuse = |limiter: &AuthRateLimiter| -> anyhow::Error {
        let outcome = limiter.record_failure(&email);
        if outcome.allowed {
            AequoraError::AuthError(INVALID_CREDENTIALS_MESSAGE.to_string()).into()
        } else {
            AequoraError::TooManyAttempts(outcome.lockout_secs).into()
        }
    };

    let user = match find_by_email(db, &email).await? {
        Some(u) if verify_password(&req.password, &u.password) => u,
        _ => {
            tracing::info!(email = %email, "Login refused: bad credentials");
            return Err(refuse(limiter));
        }
    };

    if user.status != UserStatus::Active {
        tracing::info!(user_id = user.user_id, "Login refused: account not active");
        return Err(refuse(limiter));
    }

    let two_factor_status = match non_blank(user.two_factor_code.clone()) {
        Some(expected) => {
            let given = req.two_factor_code.as_deref().map(str::trim).unwrap_or_default();
            if given == expected {
                TwoFactorStatus::Passed
            } else {
                TwoFactorStatus::Failed
            }
        }
        None => TwoFactorStatus::Skipped,
    };

    let now = super::now();
    let log_row = loginlog::ActiveModel {
        user_id: Set(user.user_id),
        user_role: Set(user.role),
        login_time: Set(now),
        ip_address: Set(client.ip_address),
        device_info: Set(client.device_info),
        two_factor_status: Set(two_factor_status),
        ..Default::default()
    };

    if two_factor_status == TwoFactorStatus::Failed {
        let log_row = loginlog::ActiveModel {
            logout_time: Set(Some(now)),
            ..log_row
        };
        log_row.insert(db).await?;
        tracing::info!(user_id = user.user_id, "Login refused: two-factor code mismatch");
        return Err(refuse(limiter));
    }

    let issued = tokens
        .issue(user.user_id, user.role)
        .map_err(|e| AequoraError::InternalError(format!("failed to sign token: {}", e)))?;

    log_row.insert(db).await?;
    limiter.record_success(&email);

    tracing::info!(user_id = user.user_id, role = %user.role.to_value(), "User logged in");
    activity::record(
        db,
        ActivityEntry::builder(user.user_id, action::LOGIN).entity("user", user.user_id),
    )
    .await;

    Ok(LoginResponse {
        auth_token: issued.token,
        token_ttl: issued.expires_in,
        user_id: user.user_id,
        role: user.role,
        first_name: user.first_name,
        last_name: user.last_name,
    })
}

/// Revoke the caller's token and close the latest open login record
pub async fn logout(
    db: &DatabaseConnection,
    tokens: &TokenService,
    principal: &Principal,
    token: &str,
) -> anyhow::Result<()> {
    tokens.revoke(token);

    let open = loginlog::Entity::find()
        .filter(loginlog::Column::UserId.eq(principal.user_id))
        .filter(loginlog::Column::LogoutTime.is_null())
        .order_by_desc(loginlog::Column::LoginTime)
        .order_by_desc(loginlog::Column::LogId)
        .one(db)
        .await?;

    if let Some(open) = open {
        let mut active: loginlog::ActiveModel = open.into();
        active.logout_time = Set(Some(super::now()));
        active.update(db).await?;
    }

    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::LOGOUT).entity("user", principal.user_id),
    )
    .await;

    Ok(())
}

/// Load the caller behind a verified token. Only active users pass.
pub async fn load_principal(db: &DatabaseConnection, user_id: i32) -> anyhow::Result<Principal> {
    let found = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::UserNotExist(format!("user {}", user_id)))?;

    if found.status != UserStatus::Active {
        return Err(AequoraError::AccessDenied(format!(
            "account is {}",
            found.status.to_value().to_lowercase()
        ))
        .into());
    }

    Ok(Principal {
        user_id: found.user_id,
        role: found.role,
        first_name: found.first_name,
        last_name: found.last_name,
        community_id: found.community_id,
    })
}

async fn profile_info<C: ConnectionTrait>(db: &C, found: user::Model) -> anyhow::Result<ProfileInfo> {
    let email = scope::email_of(db, found.user_id).await?;
    let phone_number = scope::phone_of(db, found.user_id).await?;

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

    let resident = if found.role == Role::Resident {
        resident::Entity::find()
            .filter(resident::Column::UserId.eq(found.user_id))
            .one(db)
            .await?
            .map(|r| ResidentDetails {
                resident_id: r.resident_id,
                house_no: r.house_no,
                street: r.street,
                thana: r.thana,
                district: r.district,
                emergency_contact: r.emergency_contact,
                verification_status: r.verification_status,
            })
    } else {
        None
    };

    Ok(ProfileInfo {
        user_id: found.user_id,
        email,
        phone_number,
        two_factor_enabled: non_blank(found.two_factor_code).is_some(),
        first_name: found.first_name,
        last_name: found.last_name,
        role: found.role,
        status: found.status,
        date_of_birth: found.date_of_birth,
        gender: found.gender,
        community,
        resident,
        created_at: found.created_at,
    })
}

async fn load_user<C: ConnectionTrait>(db: &C, user_id: i32) -> anyhow::Result<user::Model> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AequoraError::UserNotExist(format!("user {}", user_id)).into())
}

pub async fn me(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<ProfileInfo> {
    let found = load_user(db, principal.user_id).await?;
    profile_info(db, found).await
}

/// Partially update the caller's own profile
pub async fn update_me(
    db: &DatabaseConnection,
    principal: &Principal,
    req: UpdateProfileRequest,
) -> anyhow::Result<ProfileInfo> {
    validate(&req)?;
    let phone_number = check_phone(req.phone_number)?;

    if let Some(community_id) = req.community_id {
        require_community_exists(db, community_id).await?;
    }

    let found = load_user(db, principal.user_id).await?;
    let role = found.role;

    let tx = db.begin().await?;

    let mut active: user::ActiveModel = found.into();
    if let Some(first_name) = non_blank(req.first_name) {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = non_blank(req.last_name) {
        active.last_name = Set(last_name);
    }
    if let Some(date_of_birth) = req.date_of_birth {
        active.date_of_birth = Set(Some(date_of_birth));
    }
    if let Some(gender) = req.gender {
        active.gender = Set(non_blank(Some(gender)));
    }
    if let Some(code) = req.two_factor_code {
        active.two_factor_code = Set(non_blank(Some(code)));
    }
    if let Some(community_id) = req.community_id {
        active.community_id = Set(Some(community_id));
    }
    active.updated_at = Set(super::now());
    let updated = active.update(&tx).await?;

    if let Some(phone_number) = phone_number {
        scope::set_phone(&tx, updated.user_id, phone_number).await?;
    }

    if role == Role::Resident {
        let profile = resident::Entity::find()
            .filter(resident::Column::UserId.eq(updated.user_id))
            .one(&tx)
            .await?;

        if let Some(profile) = profile {
            let mut active: resident::ActiveModel = profile.into();
            if let Some(v) = req.house_no {
                active.house_no = Set(non_blank(Some(v)));
            }
            if let Some(v) = req.street {
                active.street = Set(non_blank(Some(v)));
            }
            if let Some(v) = req.thana {
                active.thana = Set(non_blank(Some(v)));
            }
            if let Some(v) = req.district {
                active.district = Set(non_blank(Some(v)));
            }
            if let Some(v) = req.emergency_contact {
                active.emergency_contact = Set(non_blank(Some(v)));
            }
            if active.is_changed() {
                active.update(&tx).await?;
            }
        }
    }

    tx.commit().await?;

    activity::record(
        db,
        ActivityEntry::builder(updated.user_id, action::UPDATE_PROFILE).entity("user", updated.user_id),
    )
    .await;

    profile_info(db, updated).await
}

/// Change the caller's password after checking the current one
pub async fn set_password(
    db: &DatabaseConnection,
    principal: &Principal,
    req: SetPasswordRequest,
) -> anyhow::Result<()> {
    let found = load_user(db, principal.user_id).await?;

    if !verify_password(&req.current_password, &found.password) {
        return Err(AequoraError::AuthError("current password is incorrect".to_string()).into());
    }
    check_password_policy(&req.new_password)?;
    if req.new_password == req.current_password {
        return Err(AequoraError::IllegalArgument(
            "new password must differ from the current one".to_string(),
        )
        .into());
    }

    let password = hash_password(&req.new_password)?;
    let mut active: user::ActiveModel = found.into();
    active.password = Set(password);
    active.updated_at = Set(super::now());
    active.update(db).await?;

    activity::record(
        db,
        ActivityEntry::builder(principal.user_id, action::CHANGE_PASSWORD)
            .entity("user", principal.user_id),
    )
    .await;

    Ok(())
}

/// Create the configured admin account unless the email is already taken.
///
/// Returns whether an account was created.
pub async fn bootstrap_admin(db: &DatabaseConnection, email: &str, password: &str) -> anyhow::Result<bool> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Ok(false);
    }

    if find_by_email(db, &email).await?.is_some() {
        tracing::debug!(email = %email, "Admin account already present");
        return Ok(false);
    }

    check_password_policy(password)?;
    let password = hash_password(password)?;
    let now = super::now();

    let tx = db.begin().await?;

    let created = user::ActiveModel {
        community_id: Set(None),
        first_name: Set("Admin".to_string()),
        last_name: Set(String::new()),
        password: Set(password),
        role: Set(Role::Admin),
        status: Set(UserStatus::Active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&tx)
    .await?;

    user_email::ActiveModel {
        user_id: Set(created.user_id),
        email: Set(email.clone()),
        ..Default::default()
    }
    .insert(&tx)
    .await?;

    tx.commit().await?;

    tracing::info!(user_id = created.user_id, email = %email, "Bootstrap admin account created");

    Ok(true)
}

//! Registration, login and account administration

mod common;

use std::time::Duration;

use aequora_auth::{AuthRateLimitConfig, AuthRateLimiter, TokenService};
use aequora_common::AequoraError;
use aequora_community::service::{account, activity, admin, notification, profile};
use aequora_community::{
    ActivitySearch, ClientInfo, LoginRequest, SetPasswordRequest, StatusRequest, UpdateAuthorityProfileRequest,
    UpdateProfileRequest, UpdateProviderProfileRequest, UserSearch,
};
use aequora_persistence::entity::sea_orm_active_enums::{ProviderAvailability, Role, VerificationStatus};

use common::{PASSWORD, domain_error, register_request};

const SECRET: &str = "YWVxdW9yYS10ZXN0LXNlY3JldC1rZXktd2l0aC1lbm91Z2gtYnl0ZXM=";

fn tokens() -> TokenService {
    TokenService::new(SECRET, 3600).unwrap()
}

fn limiter(max_attempts: u32) -> AuthRateLimiter {
    AuthRateLimiter::new(AuthRateLimitConfig {
        max_attempts,
        window_duration: Duration::from_secs(60),
        lockout_duration: Duration::from_secs(300),
        enabled: true,
    })
}

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        username: email.to_string(),
        password: password.to_string(),
        two_factor_code: None,
    }
}

#[tokio::test]
async fn test_register_and_login() {
    let db = common::setup_db().await;
    let community_id = common::seed_community(&db, "Uttara").await;

    let profile = account::register(&db, register_request("Rima@Example.com", "Resident", Some(community_id)))
        .await
        .unwrap();
    assert_eq!(profile.email.as_deref(), Some("rima@example.com"));
    assert_eq!(profile.role, Role::Resident);
    assert_eq!(
        profile.resident.as_ref().map(|r| r.verification_status),
        Some(VerificationStatus::Pending)
    );
    assert!(!profile.two_factor_enabled);

    let tokens = tokens();
    let response = account::login(
        &db,
        &tokens,
        &limiter(5),
        login_request(" RIMA@example.com ", PASSWORD),
        ClientInfo::default(),
    )
    .await
    .unwrap();

    assert_eq!(response.user_id, profile.user_id);
    let claims = tokens.verify(&response.auth_token).unwrap();
    assert_eq!(claims.user_id(), Some(profile.user_id));
    assert_eq!(claims.role, Role::Resident);
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_admins() {
    let db = common::setup_db().await;
    let community_id = common::seed_community(&db, "Uttara").await;

    account::register(&db, register_request("a@b.com", "Resident", Some(community_id)))
        .await
        .unwrap();

    let err = account::register(&db, register_request("A@B.com", "ServiceProvider", Some(community_id)))
        .await
        .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::ResourceConflict(_)));

    let err = account::register(&db, register_request("root@b.com", "Admin", None))
        .await
        .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::IllegalArgument(_)));

    let err = account::register(&db, register_request("c@b.com", "Resident", Some(999)))
        .await
        .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::ResourceNotFound(_)));
}

#[tokio::test]
async fn test_repeated_failures_lock_the_account() {
    let db = common::setup_db().await;
    let community_id = common::seed_community(&db, "Uttara").await;
    common::resident(&db, "locked@b.com", community_id).await;

    let tokens = tokens();
    let limiter = limiter(2);

    let err = account::login(&db, &tokens, &limiter, login_request("locked@b.com", "wrong-1"), ClientInfo::default())
        .await
        .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::AuthError(_)));

    let err = account::login(&db, &tokens, &limiter, login_request("locked@b.com", "wrong-2"), ClientInfo::default())
        .await
        .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::TooManyAttempts(300)));

    // Even the right password is refused while locked
    let err = account::login(&db, &tokens, &limiter, login_request("locked@b.com", PASSWORD), ClientInfo::default())
        .await
        .unwrap_err();
    assert_eq!(domain_error(&err).http_status(), 429);
}

#[tokio::test]
async fn test_two_factor_code_is_checked() {
    let db = common::setup_db().await;
    let community_id = common::seed_community(&db, "Uttara").await;
    let principal = common::resident(&db, "2fa@b.com", community_id).await;

    let profile = account::update_me(
        &db,
        &principal,
        UpdateProfileRequest {
            two_factor_code: Some("424242".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(profile.two_factor_enabled);

    let tokens = tokens();
    let limiter = limiter(5);

    let err = account::login(&db, &tokens, &limiter, login_request("2fa@b.com", PASSWORD), ClientInfo::default())
        .await
        .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::AuthError(_)));

    let mut request = login_request("2fa@b.com", PASSWORD);
    request.two_factor_code = Some("424242".to_string());
    assert!(account::login(&db, &tokens, &limiter, request, ClientInfo::default()).await.is_ok());
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let db = common::setup_db().await;
    let community_id = common::seed_community(&db, "Uttara").await;
    let principal = common::resident(&db, "out@b.com", community_id).await;

    let tokens = tokens();
    let response = account::login(&db, &tokens, &limiter(5), login_request("out@b.com", PASSWORD), ClientInfo::default())
        .await
        .unwrap();

    account::logout(&db, &tokens, &principal, &response.auth_token).await.unwrap();
    assert!(tokens.verify(&response.auth_token).is_err());
}

#[tokio::test]
async fn test_set_password() {
    let db = common::setup_db().await;
    let community_id = common::seed_community(&db, "Uttara").await;
    let principal = common::resident(&db, "pw@b.com", community_id).await;

    let err = account::set_password(
        &db,
        &principal,
        SetPasswordRequest {
            current_password: "not-it".to_string(),
            new_password: "brand-new-pass".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::AuthError(_)));

    account::set_password(
        &db,
        &principal,
        SetPasswordRequest {
            current_password: PASSWORD.to_string(),
            new_password: "brand-new-pass".to_string(),
        },
    )
    .await
    .unwrap();

    let tokens = tokens();
    let limiter = limiter(5);
    assert!(
        account::login(&db, &tokens, &limiter, login_request("pw@b.com", PASSWORD), ClientInfo::default())
            .await
            .is_err()
    );
    assert!(
        account::login(&db, &tokens, &limiter, login_request("pw@b.com", "brand-new-pass"), ClientInfo::default())
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_suspended_user_loses_access() {
    let db = common::setup_db().await;
    let community_id = common::seed_community(&db, "Uttara").await;
    let resident = common::resident(&db, "sus@b.com", community_id).await;

    assert!(account::bootstrap_admin(&db, "admin@aequora.test", "admin-pass").await.unwrap());
    assert!(!account::bootstrap_admin(&db, "admin@aequora.test", "admin-pass").await.unwrap());

    let admins = admin::search_users(
        &db,
        &UserSearch {
            role: Some("Admin".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(admins.total_count, 1);
    let admin = account::load_principal(&db, admins.page_items[0].user_id).await.unwrap();

    admin::set_user_status(
        &db,
        &admin,
        resident.user_id,
        StatusRequest {
            status: "Suspended".to_string(),
        },
    )
    .await
    .unwrap();

    let err = account::load_principal(&db, resident.user_id).await.unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::AccessDenied(_)));

    // Admins cannot change their own status
    let err = admin::set_user_status(
        &db,
        &admin,
        admin.user_id,
        StatusRequest {
            status: "Inactive".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::IllegalArgument(_)));
}

#[tokio::test]
async fn test_authority_profile_and_served_communities() {
    let db = common::setup_db().await;
    let home = common::seed_community(&db, "Mirpur").await;
    let extra = common::seed_community(&db, "Badda").await;
    let officer = common::authority(&db, "officer@b.com", home).await;

    let before = profile::authority_profile(&db, &officer).await.unwrap();
    assert_eq!(before.department_name.as_deref(), Some("Roads"));
    assert_eq!(before.email.as_deref(), Some("officer@b.com"));
    assert_eq!(before.communities.len(), 1);

    let updated = profile::update_authority_profile(
        &db,
        &officer,
        UpdateAuthorityProfileRequest {
            designation: Some("Executive Engineer".to_string()),
            phone_number: Some("+8801712345678".to_string()),
            community_ids: Some(vec![extra, extra]),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.designation.as_deref(), Some("Executive Engineer"));
    assert_eq!(updated.phone_number.as_deref(), Some("+8801712345678"));
    let names: Vec<&str> = updated.communities.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Badda", "Mirpur"]);

    let err = profile::update_authority_profile(
        &db,
        &officer,
        UpdateAuthorityProfileRequest {
            community_ids: Some(vec![extra, 999]),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::ResourceNotFound(_)));

    let err = profile::update_authority_profile(
        &db,
        &officer,
        UpdateAuthorityProfileRequest {
            phone_number: Some("call me".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::ValidationFailed(_)));

    // Only the authority role has this profile
    let resident = common::resident(&db, "resident@b.com", home).await;
    assert!(profile::authority_profile(&db, &resident).await.is_err());
}

#[tokio::test]
async fn test_provider_profile_update() {
    let db = common::setup_db().await;
    let community_id = common::seed_community(&db, "Uttara").await;
    let provider = common::provider(&db, "fixer@b.com", community_id).await;

    let before = profile::provider_profile(&db, &provider).await.unwrap();
    assert_eq!(before.community.as_ref().map(|c| c.community_id), Some(community_id));
    assert_eq!(before.availability_status, ProviderAvailability::Available);

    let updated = profile::update_provider_profile(
        &db,
        &provider,
        UpdateProviderProfileRequest {
            first_name: Some("Karim".to_string()),
            service_area: Some("Sector 4-7".to_string()),
            working_hours: Some("09:00-18:00".to_string()),
            availability_status: Some("busy".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.first_name, "Karim");
    assert_eq!(updated.service_area.as_deref(), Some("Sector 4-7"));
    assert_eq!(updated.availability_status, ProviderAvailability::Busy);

    let err = profile::update_provider_profile(
        &db,
        &provider,
        UpdateProviderProfileRequest {
            availability_status: Some("asleep".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::ValidationFailed(_)));
    assert_eq!(
        profile::provider_profile(&db, &provider).await.unwrap().availability_status,
        ProviderAvailability::Busy
    );
}

#[tokio::test]
async fn test_admin_verifies_resident() {
    let db = common::setup_db().await;
    let community_id = common::seed_community(&db, "Uttara").await;
    let registered = account::register(&db, register_request("new@b.com", "Resident", Some(community_id)))
        .await
        .unwrap();
    let resident_id = registered.resident.as_ref().unwrap().resident_id;
    let resident = account::load_principal(&db, registered.user_id).await.unwrap();
    let admin = common::admin(&db).await;

    let verified = admin::set_verification(
        &db,
        &admin,
        resident_id,
        StatusRequest {
            status: "Verified".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(verified.verification_status, VerificationStatus::Verified);

    let inbox = notification::list(&db, &resident).await.unwrap();
    assert_eq!(inbox.unread_count, 1);
    assert!(inbox.notifications[0].message.contains("Verified"));

    let err = admin::set_verification(
        &db,
        &admin,
        resident_id,
        StatusRequest {
            status: "maybe".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::ValidationFailed(_)));

    let err = admin::set_verification(
        &db,
        &admin,
        999,
        StatusRequest {
            status: "Rejected".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(domain_error(&err), AequoraError::ResourceNotFound(_)));
}

#[tokio::test]
async fn test_activity_log_paging() {
    let db = common::setup_db().await;
    let community_id = common::seed_community(&db, "Uttara").await;
    let registered = account::register(&db, register_request("paged@b.com", "Resident", Some(community_id)))
        .await
        .unwrap();
    let resident_id = registered.resident.as_ref().unwrap().resident_id;
    let admin = common::admin(&db).await;

    for status in ["Verified", "Rejected", "Verified"] {
        admin::set_verification(
            &db,
            &admin,
            resident_id,
            StatusRequest {
                status: status.to_string(),
            },
        )
        .await
        .unwrap();
    }
    admin::set_user_status(
        &db,
        &admin,
        registered.user_id,
        StatusRequest {
            status: "Inactive".to_string(),
        },
    )
    .await
    .unwrap();

    let search = |page_no: u64| ActivitySearch {
        user_id: Some(admin.user_id),
        page_no: Some(page_no),
        page_size: Some(3),
        ..Default::default()
    };

    let first = activity::search(&db, &search(1)).await.unwrap();
    assert_eq!(first.total_count, 4);
    assert_eq!(first.pages_available, 2);
    assert_eq!(first.page_items.len(), 3);
    // Newest first
    assert_eq!(first.page_items[0].action_type, "UPDATE_USER_STATUS");
    assert_eq!(first.page_items[0].entity_affected.as_deref(), Some(format!("user:{}", registered.user_id).as_str()));

    let second = activity::search(&db, &search(2)).await.unwrap();
    assert_eq!(second.page_items.len(), 1);
    assert_eq!(second.page_items[0].action_type, "VERIFY_RESIDENT");

    let filtered = activity::search(
        &db,
        &ActivitySearch {
            action_type: Some("verify_resident".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(filtered.total_count, 3);

    let beyond = activity::search(&db, &search(5)).await.unwrap();
    assert!(beyond.page_items.is_empty());
}

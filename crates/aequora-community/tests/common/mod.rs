//! Shared fixtures for community workflow tests
//!
//! Every test gets its own in-memory SQLite database with the full schema.

#![allow(dead_code)]

use aequora_auth::Principal;
use aequora_common::AequoraError;
use aequora_community::service::{account, activity};
use aequora_community::{ActivitySearch, RegisterRequest};
use aequora_migration::{Migrator, MigratorTrait};
use aequora_persistence::entity::sea_orm_active_enums::Role;
use aequora_persistence::entity::{community, user};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, QueryFilter, Set};

pub const PASSWORD: &str = "secret-pass";

pub async fn setup_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn seed_community(db: &DatabaseConnection, name: &str) -> i32 {
    community::ActiveModel {
        name: Set(name.to_string()),
        city: Set("Dhaka".to_string()),
        district: Set("Dhaka".to_string()),
        thana: Set("Gulshan".to_string()),
        postal_code: Set("1212".to_string()),
        created_at: Set(chrono::Local::now().naive_local()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .community_id
}

pub fn register_request(email: &str, role: &str, community_id: Option<i32>) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: PASSWORD.to_string(),
        first_name: "Test".to_string(),
        last_name: role.to_string(),
        role: role.to_string(),
        community_id,
        department_name: (role == "Authority").then(|| "Roads".to_string()),
        ..Default::default()
    }
}

/// Register a user and load it as an authenticated caller
pub async fn user(db: &DatabaseConnection, email: &str, role: &str, community_id: i32) -> Principal {
    let profile = account::register(db, register_request(email, role, Some(community_id)))
        .await
        .unwrap();
    account::load_principal(db, profile.user_id).await.unwrap()
}

pub async fn resident(db: &DatabaseConnection, email: &str, community_id: i32) -> Principal {
    user(db, email, "Resident", community_id).await
}

pub async fn authority(db: &DatabaseConnection, email: &str, community_id: i32) -> Principal {
    user(db, email, "Authority", community_id).await
}

pub async fn provider(db: &DatabaseConnection, email: &str, community_id: i32) -> Principal {
    user(db, email, "ServiceProvider", community_id).await
}

/// Bootstrap the admin account and load it as a caller
pub async fn admin(db: &DatabaseConnection) -> Principal {
    account::bootstrap_admin(db, "admin@aequora.test", "admin-pass")
        .await
        .unwrap();
    let found = user::Entity::find()
        .filter(user::Column::Role.eq(Role::Admin))
        .one(db)
        .await
        .unwrap()
        .unwrap();
    account::load_principal(db, found.user_id).await.unwrap()
}

/// The domain error behind a workflow failure
pub fn domain_error(err: &anyhow::Error) -> &AequoraError {
    err.downcast_ref::<AequoraError>()
        .unwrap_or_else(|| panic!("expected a domain error, got {:?}", err))
}

pub fn tomorrow() -> chrono::NaiveDate {
    chrono::Local::now().date_naive() + chrono::Duration::days(1)
}

/// Action types a user has written to the audit trail, oldest first
pub async fn actions_of(db: &DatabaseConnection, user_id: i32) -> Vec<String> {
    let page = activity::search(
        db,
        &ActivitySearch {
            user_id: Some(user_id),
            page_size: Some(200),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    page.page_items
        .into_iter()
        .rev()
        .map(|entry| entry.action_type)
        .collect()
}

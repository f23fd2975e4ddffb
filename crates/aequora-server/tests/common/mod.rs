//! Shared fixtures for HTTP API tests
//!
//! Each test builds the full route table on top of an in-memory SQLite
//! database with the schema applied.

#![allow(dead_code)]

use actix_web::{
    body::MessageBody,
    dev::ServiceResponse,
    http::StatusCode,
};
use base64::Engine;
use config::Config;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use serde_json::Value;

use aequora_migration::{Migrator, MigratorTrait};
use aequora_persistence::entity::community;
use aequora_server::model::{AppState, Configuration};

pub const PASSWORD: &str = "secret-pass";
pub const ADMIN_EMAIL: &str = "admin@aequora.test";
pub const ADMIN_PASSWORD: &str = "admin-pass";

/// Build the app under `/api` with the authentication middleware
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(aequora_server::middleware::auth::Authentication)
                .app_data(actix_web::web::Data::new($state))
                .configure(aequora_server::startup::extractor_config)
                .service(
                    actix_web::web::scope("/api").configure(aequora_server::api::route::routes),
                ),
        )
        .await
    };
}

pub fn configuration(overrides: &[(&str, &str)]) -> Configuration {
    let secret = base64::engine::general_purpose::STANDARD
        .encode("aequora-test-secret-key-for-http-tests-0123456789");

    let mut builder = Config::builder()
        .set_override("aequora.auth.token.secretKey", secret)
        .unwrap()
        .set_override("aequora.booking.duplicateWindowSeconds", "0")
        .unwrap();
    for (key, value) in overrides {
        builder = builder.set_override(*key, *value).unwrap();
    }

    Configuration::from_config(builder.build().unwrap())
}

pub async fn setup_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

/// Fresh database plus the state every handler sees
pub async fn setup_state() -> AppState {
    setup_state_with(&[]).await
}

pub async fn setup_state_with(overrides: &[(&str, &str)]) -> AppState {
    let db = setup_db().await;
    AppState::new(configuration(overrides), db).unwrap()
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

pub fn register_body(email: &str, role: &str, community_id: i32) -> Value {
    serde_json::json!({
        "email": email,
        "password": PASSWORD,
        "first_name": "Test",
        "last_name": role,
        "role": role,
        "community_id": community_id,
        "department_name": "Roads",
    })
}

/// Status plus the decoded response envelope
pub async fn read_envelope<B: MessageBody>(resp: ServiceResponse<B>) -> (StatusCode, Value) {
    let status = resp.status();
    let bytes = actix_web::test::read_body(resp).await;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub fn tomorrow() -> chrono::NaiveDate {
    chrono::Local::now().date_naive() + chrono::Duration::days(1)
}

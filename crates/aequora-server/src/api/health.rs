use actix_web::{HttpResponse, get, web};
use serde::Serialize;

use aequora_common::error::{DATA_ACCESS_ERROR, SUCCESS};

use crate::model::{AppState, Result};

pub const HEALTH_MESSAGE: &str = "AEQUORA API is working";

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub message: String,
    pub database: String,
}

impl HealthStatus {
    fn new(database_up: bool) -> Self {
        Self {
            message: HEALTH_MESSAGE.to_string(),
            database: if database_up { "UP" } else { "DOWN" }.to_string(),
        }
    }
}

#[get("/health/")]
pub async fn health(data: web::Data<AppState>) -> HttpResponse {
    match data.db().ping().await {
        Ok(()) => Result::<()>::http_response(
            200,
            SUCCESS.code,
            SUCCESS.message.to_string(),
            HealthStatus::new(true),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "database ping failed");
            Result::<()>::http_response(
                503,
                DATA_ACCESS_ERROR.code,
                DATA_ACCESS_ERROR.message.to_string(),
                HealthStatus::new(false),
            )
        }
    }
}

//! Service catalog models

use serde::{Deserialize, Serialize};
use validator::Validate;

use aequora_persistence::entity::service;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateServiceRequest {
    #[serde(alias = "servicename")]
    #[validate(length(min = 1, max = 100))]
    pub service_name: String,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(range(min = 0))]
    pub availability: Option<i32>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateServiceRequest {
    #[serde(alias = "servicename")]
    #[validate(length(min = 1, max = 100))]
    pub service_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub category: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[validate(range(min = 0))]
    pub availability: Option<i32>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceFilter {
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub service_id: i32,
    pub provider_id: i32,
    pub provider_name: Option<String>,
    pub community_id: i32,
    pub service_name: String,
    pub category: String,
    pub price: f64,
    pub availability: i32,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: chrono::NaiveDateTime,
}

impl From<service::Model> for ServiceInfo {
    fn from(value: service::Model) -> Self {
        Self {
            service_id: value.service_id,
            provider_id: value.provider_id,
            provider_name: None,
            community_id: value.community_id,
            service_name: value.service_name,
            category: value.category,
            price: value.price,
            availability: value.availability,
            description: value.description,
            is_active: value.is_active,
            created_at: value.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::validate;

    #[test]
    fn test_negative_price_is_rejected() {
        let req = CreateServiceRequest {
            service_name: "Plumbing".to_string(),
            category: "Home".to_string(),
            price: -1.0,
            ..Default::default()
        };
        assert!(validate(&req).is_err());

        let req = CreateServiceRequest { price: 0.0, ..req };
        assert!(validate(&req).is_ok());
    }

    #[test]
    fn test_negative_availability_is_rejected() {
        let req = UpdateServiceRequest {
            availability: Some(-2),
            ..Default::default()
        };
        assert!(validate(&req).is_err());
    }
}

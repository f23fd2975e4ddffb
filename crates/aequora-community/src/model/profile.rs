//! Role profile models for authorities and service providers

use serde::{Deserialize, Serialize};
use validator::Validate;

use aequora_persistence::entity::sea_orm_active_enums::ProviderAvailability;

use super::account::CommunityRef;

#[derive(Debug, Clone, Serialize)]
pub struct AuthorityProfile {
    pub user_id: i32,
    pub authority_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub department_name: Option<String>,
    pub designation: Option<String>,
    pub house_no: Option<String>,
    pub street: Option<String>,
    pub thana: Option<String>,
    pub district: Option<String>,
    pub assigned_area: Option<String>,
    pub profile_certificate: Option<String>,
    pub date_joined: Option<chrono::NaiveDate>,
    pub communities: Vec<CommunityRef>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAuthorityProfileRequest {
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    #[validate(length(max = 100))]
    pub department_name: Option<String>,
    #[validate(length(max = 50))]
    pub designation: Option<String>,
    #[validate(length(max = 20))]
    pub house_no: Option<String>,
    #[validate(length(max = 50))]
    pub street: Option<String>,
    #[validate(length(max = 50))]
    pub thana: Option<String>,
    #[validate(length(max = 50))]
    pub district: Option<String>,
    #[validate(length(max = 100))]
    pub assigned_area: Option<String>,
    #[validate(length(max = 255))]
    pub profile_certificate: Option<String>,
    /// Replaces the served communities when present
    pub community_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderProfile {
    pub user_id: i32,
    pub provider_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub community: Option<CommunityRef>,
    pub service_area: Option<String>,
    pub working_hours: Option<String>,
    pub certification_file: Option<String>,
    pub availability_status: ProviderAvailability,
    pub sub_role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProviderProfileRequest {
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    #[validate(length(max = 100))]
    pub service_area: Option<String>,
    #[validate(length(max = 50))]
    pub working_hours: Option<String>,
    #[validate(length(max = 255))]
    pub certification_file: Option<String>,
    pub availability_status: Option<String>,
    #[validate(length(max = 50))]
    pub sub_role: Option<String>,
}

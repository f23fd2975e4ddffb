//! Identity models: registration, login and the caller's own profile

use serde::{Deserialize, Serialize};
use validator::Validate;

use aequora_persistence::entity::sea_orm_active_enums::{Role, UserStatus, VerificationStatus};

/// Registration payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email, length(max = 100))]
    pub email: String,
    #[validate(length(min = 6, max = 72))]
    pub password: String,
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    pub role: String,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    pub community_id: Option<i32>,
    #[validate(length(max = 20))]
    pub house_no: Option<String>,
    #[validate(length(max = 50))]
    pub street: Option<String>,
    #[validate(length(max = 50))]
    pub thana: Option<String>,
    #[validate(length(max = 50))]
    pub district: Option<String>,
    #[validate(length(max = 100))]
    pub department_name: Option<String>,
    #[validate(length(max = 50))]
    pub designation: Option<String>,
    #[validate(length(max = 100))]
    pub service_area: Option<String>,
    #[validate(length(max = 50))]
    pub working_hours: Option<String>,
    #[validate(length(max = 50))]
    pub sub_role: Option<String>,
}

/// Login payload; `username` carries the email address
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "email")]
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub two_factor_code: Option<String>,
}

/// Request metadata recorded in the login log
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub device_info: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub auth_token: String,
    pub token_ttl: i64,
    pub user_id: i32,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommunityRef {
    pub community_id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResidentDetails {
    pub resident_id: i32,
    pub house_no: Option<String>,
    pub street: Option<String>,
    pub thana: Option<String>,
    pub district: Option<String>,
    pub emergency_contact: Option<String>,
    pub verification_status: VerificationStatus,
}

/// The caller's own profile
#[derive(Debug, Clone, Serialize)]
pub struct ProfileInfo {
    pub user_id: i32,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub status: UserStatus,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub gender: Option<String>,
    pub two_factor_enabled: bool,
    pub community: Option<CommunityRef>,
    pub resident: Option<ResidentDetails>,
    pub created_at: chrono::NaiveDateTime,
}

/// Partial update of the caller's own profile
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
    pub date_of_birth: Option<chrono::NaiveDate>,
    #[validate(length(max = 6))]
    pub gender: Option<String>,
    /// Empty string disables two-factor login
    #[validate(length(max = 10))]
    pub two_factor_code: Option<String>,
    pub community_id: Option<i32>,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    #[validate(length(max = 20))]
    pub house_no: Option<String>,
    #[validate(length(max = 50))]
    pub street: Option<String>,
    #[validate(length(max = 50))]
    pub thana: Option<String>,
    #[validate(length(max = 50))]
    pub district: Option<String>,
    #[validate(length(max = 20))]
    pub emergency_contact: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetPasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

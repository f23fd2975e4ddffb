//! Community and administration models

use serde::{Deserialize, Serialize};
use validator::Validate;

use aequora_persistence::entity::{activitylog, community};
use aequora_persistence::entity::sea_orm_active_enums::{Role, UserStatus};

#[derive(Debug, Clone, Serialize)]
pub struct CommunityInfo {
    pub community_id: i32,
    pub name: String,
    pub city: String,
    pub district: String,
    pub thana: String,
    pub postal_code: String,
    pub created_at: chrono::NaiveDateTime,
    pub resident_count: u64,
}

impl CommunityInfo {
    pub fn from_model(value: community::Model, resident_count: u64) -> Self {
        Self {
            community_id: value.community_id,
            name: value.name,
            city: value.city,
            district: value.district,
            thana: value.thana,
            postal_code: value.postal_code,
            created_at: value.created_at,
            resident_count,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CommunityRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub city: String,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub district: String,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub thana: String,
    #[validate(length(max = 20))]
    #[serde(default)]
    pub postal_code: String,
}

/// Query parameters of the admin user listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSearch {
    pub role: Option<String>,
    pub community_id: Option<i32>,
    pub status: Option<String>,
    /// Matches first name, last name or email
    pub search: Option<String>,
    pub page_no: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub user_id: i32,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub status: UserStatus,
    pub community_id: Option<i32>,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivitySearch {
    pub user_id: Option<i32>,
    pub action_type: Option<String>,
    pub page_no: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityLogInfo {
    pub log_id: i32,
    pub user_id: i32,
    pub action_type: String,
    pub description: Option<String>,
    pub entity_affected: Option<String>,
    pub timestamp: chrono::NaiveDateTime,
}

impl From<activitylog::Model> for ActivityLogInfo {
    fn from(value: activitylog::Model) -> Self {
        Self {
            log_id: value.log_id,
            user_id: value.user_id,
            action_type: value.action_type,
            description: value.description,
            entity_affected: value.entity_affected,
            timestamp: value.timestamp,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AdminStats {
    pub total_communities: u64,
    pub total_users: u64,
    pub residents: u64,
    pub authorities: u64,
    pub service_providers: u64,
    pub suspended_users: u64,
    pub open_issues: u64,
    pub active_sos: u64,
    pub total_bookings: u64,
}

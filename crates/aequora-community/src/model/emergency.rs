//! Emergency (SOS) models

use serde::{Deserialize, Serialize};
use validator::Validate;

use aequora_persistence::entity::emergencyreport;
use aequora_persistence::entity::sea_orm_active_enums::{EmergencyStatus, EmergencyType};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SosRequest {
    #[serde(alias = "emergencytype")]
    pub emergency_type: String,
    pub description: Option<String>,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    #[validate(length(max = 255))]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SosFilter {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchRequest {
    /// Responding service, e.g. "Fire Service"
    pub service: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SosInfo {
    pub sos_id: i32,
    pub resident_id: i32,
    pub resident_name: Option<String>,
    pub resident_phone: Option<String>,
    pub community_id: i32,
    pub emergency_type: EmergencyType,
    pub photo: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub status: EmergencyStatus,
    pub timestamp: chrono::NaiveDateTime,
}

impl From<emergencyreport::Model> for SosInfo {
    fn from(value: emergencyreport::Model) -> Self {
        Self {
            sos_id: value.sos_id,
            resident_id: value.resident_id,
            resident_name: None,
            resident_phone: None,
            community_id: value.community_id,
            emergency_type: value.emergency_type,
            photo: value.photo,
            location: value.location,
            description: value.description,
            status: value.status,
            timestamp: value.timestamp,
        }
    }
}

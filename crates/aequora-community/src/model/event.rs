//! Event models

use serde::{Deserialize, Serialize};
use validator::Validate;

use aequora_persistence::entity::event;
use aequora_persistence::entity::sea_orm_active_enums::{EventCategory, EventStatus, InterestType};

/// Event request (resident) or publication (authority)
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct EventRequest {
    #[validate(length(min = 1, max = 150))]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(max = 255))]
    pub photo: Option<String>,
    pub date: chrono::NaiveDate,
    pub time: chrono::NaiveTime,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    pub category: Option<String>,
    /// Target community for authorities serving several
    pub community_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParticipateRequest {
    #[serde(alias = "eventid")]
    pub event_id: i32,
    #[serde(alias = "interesttype")]
    pub interest_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventActionRequest {
    /// `approve` or `reject`
    pub action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventInfo {
    pub event_id: i32,
    pub posted_by_id: i32,
    pub posted_by_name: Option<String>,
    pub community_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub photo: Option<String>,
    pub date: chrono::NaiveDate,
    pub time: chrono::NaiveTime,
    pub location: Option<String>,
    pub category: EventCategory,
    pub status: EventStatus,
    pub created_at: chrono::NaiveDateTime,
    pub going_count: u64,
    pub interested_count: u64,
    pub my_interest: Option<InterestType>,
}

impl From<event::Model> for EventInfo {
    fn from(value: event::Model) -> Self {
        Self {
            event_id: value.event_id,
            posted_by_id: value.posted_by_id,
            posted_by_name: None,
            community_id: value.community_id,
            title: value.title,
            description: value.description,
            photo: value.photo,
            date: value.date,
            time: value.time,
            location: value.location,
            category: value.category,
            status: value.status,
            created_at: value.created_at,
            going_count: 0,
            interested_count: 0,
            my_interest: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipationInfo {
    pub event_id: i32,
    pub interest_type: InterestType,
    pub going_count: u64,
    pub interested_count: u64,
}

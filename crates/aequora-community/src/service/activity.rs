//! Activity log
//!
//! Every successful mutating workflow appends one row. Writing the row is
//! best effort: a failure is logged and never fails the request.

use sea_orm::*;

use aequora_common::paging;
use aequora_persistence::Page;
use aequora_persistence::entity::activitylog;

use crate::model::{ActivityLogInfo, ActivitySearch};

/// Action type constants
pub mod action {
    pub const REGISTER: &str = "REGISTER";
    pub const LOGIN: &str = "LOGIN";
    pub const LOGOUT: &str = "LOGOUT";
    pub const UPDATE_PROFILE: &str = "UPDATE_PROFILE";
    pub const CHANGE_PASSWORD: &str = "CHANGE_PASSWORD";
    pub const CREATE_ISSUE: &str = "CREATE_ISSUE";
    pub const UPDATE_ISSUE: &str = "UPDATE_ISSUE";
    pub const VOTE_ISSUE: &str = "VOTE_ISSUE";
    pub const REQUEST_EVENT: &str = "REQUEST_EVENT";
    pub const PUBLISH_EVENT: &str = "PUBLISH_EVENT";
    pub const REVIEW_EVENT: &str = "REVIEW_EVENT";
    pub const CANCEL_EVENT: &str = "CANCEL_EVENT";
    pub const PARTICIPATE_EVENT: &str = "PARTICIPATE_EVENT";
    pub const RAISE_SOS: &str = "RAISE_SOS";
    pub const UPDATE_SOS: &str = "UPDATE_SOS";
    pub const CREATE_SERVICE: &str = "CREATE_SERVICE";
    pub const UPDATE_SERVICE: &str = "UPDATE_SERVICE";
    pub const DELETE_SERVICE: &str = "DELETE_SERVICE";
    pub const CREATE_BOOKING: &str = "CREATE_BOOKING";
    pub const UPDATE_BOOKING: &str = "UPDATE_BOOKING";
    pub const CANCEL_BOOKING: &str = "CANCEL_BOOKING";
    pub const PAYMENT: &str = "PAYMENT";
    pub const REVIEW: &str = "REVIEW";
    pub const CREATE_COMMUNITY: &str = "CREATE_COMMUNITY";
    pub const UPDATE_COMMUNITY: &str = "UPDATE_COMMUNITY";
    pub const DELETE_COMMUNITY: &str = "DELETE_COMMUNITY";
    pub const UPDATE_USER_STATUS: &str = "UPDATE_USER_STATUS";
    pub const VERIFY_RESIDENT: &str = "VERIFY_RESIDENT";
    pub const ANNOUNCE: &str = "ANNOUNCE";
}

/// Activity log entry
#[derive(Debug, Clone, Default)]
pub struct ActivityEntry {
    pub user_id: i32,
    pub action_type: String,
    pub entity_affected: Option<String>,
    pub description: Option<String>,
}

impl ActivityEntry {
    pub fn builder(user_id: i32, action_type: &str) -> ActivityBuilder {
        ActivityBuilder {
            entry: ActivityEntry {
                user_id,
                action_type: action_type.to_string(),
                ..Default::default()
            },
        }
    }
}

/// Builder for ActivityEntry
pub struct ActivityBuilder {
    entry: ActivityEntry,
}

impl ActivityBuilder {
    /// Affected record, written as `kind:id`
    pub fn entity(mut self, kind: &str, id: i32) -> Self {
        self.entry.entity_affected = Some(format!("{}:{}", kind, id));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.entry.description = Some(description.into());
        self
    }

    pub fn build(self) -> ActivityEntry {
        self.entry
    }
}

/// Insert an activity row
pub async fn log_activity<C: ConnectionTrait>(db: &C, entry: ActivityEntry) -> anyhow::Result<i32> {
    let active = activitylog::ActiveModel {
        user_id: Set(entry.user_id),
        action_type: Set(entry.action_type),
        description: Set(entry.description),
        entity_affected: Set(entry.entity_affected),
        timestamp: Set(super::now()),
        ..Default::default()
    };

    let inserted = active.insert(db).await?;
    Ok(inserted.log_id)
}

/// Insert an activity row, logging instead of failing
pub async fn record<C: ConnectionTrait>(db: &C, entry: ActivityBuilder) {
    let entry = entry.build();
    let user_id = entry.user_id;
    let action_type = entry.action_type.clone();

    if let Err(e) = log_activity(db, entry).await {
        tracing::warn!(
            error = %e,
            user_id,
            action_type = %action_type,
            "Failed to write activity log"
        );
    }
}

/// Search the activity log, newest first
pub async fn search(db: &DatabaseConnection, search: &ActivitySearch) -> anyhow::Result<Page<ActivityLogInfo>> {
    let (page_no, page_size) = paging(search.page_no, search.page_size);
    let mut query = activitylog::Entity::find();

    if let Some(user_id) = search.user_id {
        query = query.filter(activitylog::Column::UserId.eq(user_id));
    }
    if let Some(action_type) = search.action_type.as_deref().filter(|a| !a.is_empty()) {
        query = query.filter(activitylog::Column::ActionType.eq(action_type.to_uppercase()));
    }

    query = query
        .order_by(activitylog::Column::Timestamp, Order::Desc)
        .order_by(activitylog::Column::LogId, Order::Desc);

    let total_count = query.clone().count(db).await?;
    if total_count == 0 {
        return Ok(Page::empty());
    }

    let models = query
        .offset((page_no - 1) * page_size)
        .limit(page_size)
        .all(db)
        .await?;

    Ok(Page::new(
        total_count,
        page_no,
        page_size,
        models.into_iter().map(ActivityLogInfo::from).collect(),
    ))
}

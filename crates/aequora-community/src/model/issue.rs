//! Issue reporting and voting models

use serde::{Deserialize, Serialize};
use validator::Validate;

use aequora_persistence::entity::issuereport;
use aequora_persistence::entity::sea_orm_active_enums::{IssueStatus, Priority, VoteType};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateIssueRequest {
    #[validate(length(min = 1, max = 150))]
    pub title: String,
    #[serde(rename = "type")]
    #[validate(length(max = 50))]
    pub issue_type: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 255))]
    pub photo: Option<String>,
    #[serde(alias = "mapaddress")]
    #[validate(length(max = 255))]
    pub map_address: Option<String>,
    #[serde(alias = "prioritylevel")]
    pub priority_level: Option<String>,
}

/// Authority-side issue update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateIssueRequest {
    pub status: Option<String>,
    #[serde(alias = "prioritylevel")]
    pub priority_level: Option<String>,
    /// Department name of the authority to assign
    #[serde(alias = "assignedTo")]
    pub assigned_to: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoteRequest {
    #[serde(alias = "issueid")]
    pub issue_id: i32,
    #[serde(rename = "type", alias = "vote_type")]
    pub vote_type: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct VoteTally {
    pub upvotes: u64,
    pub downvotes: u64,
}

impl VoteTally {
    pub fn score(&self) -> i64 {
        self.upvotes as i64 - self.downvotes as i64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueInfo {
    pub issue_id: i32,
    pub resident_id: i32,
    pub resident_name: Option<String>,
    pub community_id: i32,
    pub title: String,
    #[serde(rename = "type")]
    pub issue_type: Option<String>,
    pub description: Option<String>,
    pub photo: Option<String>,
    pub map_address: Option<String>,
    pub status: IssueStatus,
    pub priority_level: Priority,
    pub created_at: chrono::NaiveDateTime,
    pub resolved_at: Option<chrono::NaiveDateTime>,
    pub upvotes: u64,
    pub downvotes: u64,
    /// The caller's own vote, when listed for a resident
    pub my_vote: Option<VoteType>,
    /// Department of the latest assignment
    pub assigned_department: Option<String>,
}

impl IssueInfo {
    pub fn from_model(value: issuereport::Model, tally: VoteTally) -> Self {
        Self {
            issue_id: value.issue_id,
            resident_id: value.resident_id,
            resident_name: None,
            community_id: value.community_id,
            title: value.title,
            issue_type: value.issue_type,
            description: value.description,
            photo: value.photo,
            map_address: value.map_address,
            status: value.status,
            priority_level: value.priority_level,
            created_at: value.created_at,
            resolved_at: value.resolved_at,
            upvotes: tally.upvotes,
            downvotes: tally.downvotes,
            my_vote: None,
            assigned_department: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VoteResult {
    pub issue_id: i32,
    pub upvotes: u64,
    pub downvotes: u64,
    pub my_vote: Option<VoteType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VotingResult {
    pub issue_id: i32,
    pub title: String,
    pub status: IssueStatus,
    pub upvotes: u64,
    pub downvotes: u64,
    pub score: i64,
    pub created_at: chrono::NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_request_accepts_legacy_keys() {
        let req: VoteRequest = serde_json::from_str(r#"{"issueid": 4, "type": "up"}"#).unwrap();
        assert_eq!(req.issue_id, 4);
        assert_eq!(req.vote_type, "up");
    }

    #[test]
    fn test_update_issue_accepts_assigned_to() {
        let req: UpdateIssueRequest =
            serde_json::from_str(r#"{"status": "Resolved", "assignedTo": "Water"}"#).unwrap();
        assert_eq!(req.assigned_to.as_deref(), Some("Water"));
    }

    #[test]
    fn test_vote_tally_score() {
        let tally = VoteTally {
            upvotes: 2,
            downvotes: 5,
        };
        assert_eq!(tally.score(), -3);
    }
}

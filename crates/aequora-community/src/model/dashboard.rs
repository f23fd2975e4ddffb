//! Dashboard and analytics models

use std::collections::BTreeMap;

use serde::Serialize;

use super::booking::BookingInfo;

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ResidentStats {
    pub issues_reported: u64,
    pub issues_resolved: u64,
    pub active_bookings: u64,
    pub upcoming_events: u64,
    pub active_sos: u64,
    pub unread_notifications: u64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct AuthorityStats {
    pub total_issues: u64,
    pub pending_issues: u64,
    pub in_progress_issues: u64,
    pub resolved_issues: u64,
    pub rejected_issues: u64,
    pub active_sos: u64,
    pub pending_event_requests: u64,
    pub upcoming_events: u64,
    pub total_residents: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalyticsSummary {
    pub issues_by_status: BTreeMap<String, u64>,
    pub issues_by_type: BTreeMap<String, u64>,
    pub issues_by_priority: BTreeMap<String, u64>,
    pub sos_by_type: BTreeMap<String, u64>,
    pub bookings_by_status: BTreeMap<String, u64>,
    /// `None` until at least one issue is resolved
    pub average_resolution_hours: Option<f64>,
    /// Issue counts keyed by `YYYY-MM`, last six months
    pub monthly_issues: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderSummary {
    pub total_earnings: f64,
    pub active_bookings: u64,
    pub completed_jobs: u64,
    pub rating: f64,
    pub total_reviews: u64,
    pub recent_bookings: Vec<BookingInfo>,
}

//! Dashboard counters and analytics

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use sea_orm::*;

use aequora_auth::Principal;
use aequora_common::round_money;
use aequora_persistence::entity::sea_orm_active_enums::{
    BookingStatus, EmergencyStatus, EventStatus, IssueStatus, Role,
};
use aequora_persistence::entity::{booking, emergencyreport, event, issuereport, notification, user};

use crate::model::{AnalyticsSummary, AuthorityStats, ProviderSummary, ResidentStats};

use super::{booking as bookings, review, scope};

/// Months covered by the monthly issue series
const MONTHLY_WINDOW: u32 = 6;
const RECENT_BOOKINGS: u64 = 5;
const UNSPECIFIED: &str = "Unspecified";

/// Row counts of `query` grouped by a string-backed column
async fn count_by<E, C>(db: &DatabaseConnection, query: Select<E>, column: C) -> anyhow::Result<BTreeMap<String, u64>>
where
    E: EntityTrait,
    C: ColumnTrait,
{
    let rows: Vec<(Option<String>, i64)> = query
        .select_only()
        .column(column)
        .column_as(column.count(), "count")
        .group_by(column)
        .into_tuple()
        .all(db)
        .await?;

    let mut counts = BTreeMap::new();
    for (key, count) in rows {
        let key = key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| UNSPECIFIED.to_string());
        *counts.entry(key).or_insert(0) += count as u64;
    }

    Ok(counts)
}

/// `YYYY-MM` keys of the last `months` months, oldest first
fn month_keys(today: NaiveDate, months: u32) -> Vec<String> {
    let first = today.with_day(1).unwrap_or(today);

    (0..months)
        .rev()
        .filter_map(|back| first.checked_sub_months(Months::new(back)))
        .map(|d| d.format("%Y-%m").to_string())
        .collect()
}

/// Mean hours between report and resolution, one decimal
fn average_hours(spans: &[(NaiveDateTime, NaiveDateTime)]) -> Option<f64> {
    if spans.is_empty() {
        return None;
    }

    let total_minutes: i64 = spans
        .iter()
        .map(|(created, resolved)| (*resolved - *created).num_minutes().max(0))
        .sum();
    let hours = total_minutes as f64 / 60.0 / spans.len() as f64;

    Some((hours * 10.0).round() / 10.0)
}

pub async fn resident_stats(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<ResidentStats> {
    let resident = scope::resident_of(db, principal).await?;
    let resident_id = resident.resident_id;

    let issues = issuereport::Entity::find().filter(issuereport::Column::ResidentId.eq(resident_id));
    let upcoming = async {
        match principal.community_id {
            Some(community_id) => {
                event::Entity::find()
                    .filter(event::Column::CommunityId.eq(community_id))
                    .filter(event::Column::Status.eq(EventStatus::Approved))
                    .filter(event::Column::Date.gte(super::today()))
                    .count(db)
                    .await
            }
            None => Ok(0),
        }
    };

    let (reported, resolved, active_bookings, upcoming_events, active_sos, unread) = tokio::join!(
        issues.clone().count(db),
        issues
            .filter(issuereport::Column::Status.eq(IssueStatus::Resolved))
            .count(db),
        booking::Entity::find()
            .filter(booking::Column::ResidentId.eq(resident_id))
            .filter(booking::Column::Status.is_in(BookingStatus::ACTIVE))
            .count(db),
        upcoming,
        emergencyreport::Entity::find()
            .filter(emergencyreport::Column::ResidentId.eq(resident_id))
            .filter(emergencyreport::Column::Status.ne(EmergencyStatus::Resolved))
            .count(db),
        notification::Entity::find()
            .filter(notification::Column::UserId.eq(principal.user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(db)
    );

    Ok(ResidentStats {
        issues_reported: reported?,
        issues_resolved: resolved?,
        active_bookings: active_bookings?,
        upcoming_events: upcoming_events?,
        active_sos: active_sos?,
        unread_notifications: unread?,
    })
}

/// Counters across every community the authority serves
pub async fn authority_stats(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<AuthorityStats> {
    let communities = scope::require_authority_communities(db, principal).await?;

    let issues = issuereport::Entity::find().filter(issuereport::Column::CommunityId.is_in(communities.clone()));
    let events = event::Entity::find().filter(event::Column::CommunityId.is_in(communities.clone()));

    let (by_status, active_sos, pending_events, upcoming_events, residents) = tokio::join!(
        count_by(db, issues, issuereport::Column::Status),
        emergencyreport::Entity::find()
            .filter(emergencyreport::Column::CommunityId.is_in(communities.clone()))
            .filter(emergencyreport::Column::Status.ne(EmergencyStatus::Resolved))
            .count(db),
        events
            .clone()
            .filter(event::Column::Status.eq(EventStatus::Pending))
            .count(db),
        events
            .filter(event::Column::Status.eq(EventStatus::Approved))
            .filter(event::Column::Date.gte(super::today()))
            .count(db),
        user::Entity::find()
            .filter(user::Column::Role.eq(Role::Resident))
            .filter(user::Column::CommunityId.is_in(communities.clone()))
            .count(db)
    );

    let by_status = by_status?;
    let status_count = |status: IssueStatus| by_status.get(&status.to_value()).copied().unwrap_or(0);

    Ok(AuthorityStats {
        total_issues: by_status.values().sum(),
        pending_issues: status_count(IssueStatus::Pending),
        in_progress_issues: status_count(IssueStatus::InProgress),
        resolved_issues: status_count(IssueStatus::Resolved),
        rejected_issues: status_count(IssueStatus::Rejected),
        active_sos: active_sos?,
        pending_event_requests: pending_events?,
        upcoming_events: upcoming_events?,
        total_residents: residents?,
    })
}

/// Aggregates for the authority analytics page
pub async fn analytics(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<AnalyticsSummary> {
    let communities = scope::require_authority_communities(db, principal).await?;

    let issues = issuereport::Entity::find().filter(issuereport::Column::CommunityId.is_in(communities.clone()));
    let sos = emergencyreport::Entity::find().filter(emergencyreport::Column::CommunityId.is_in(communities.clone()));
    let bookings = booking::Entity::find().filter(booking::Column::CommunityId.is_in(communities.clone()));

    let today = super::today();
    let months = month_keys(today, MONTHLY_WINDOW);
    let window_start = today
        .with_day(1)
        .and_then(|d| d.checked_sub_months(Months::new(MONTHLY_WINDOW - 1)))
        .unwrap_or(today)
        .and_time(chrono::NaiveTime::MIN);

    let (by_status, by_type, by_priority, sos_by_type, bookings_by_status, resolutions, created) = tokio::join!(
        count_by(db, issues.clone(), issuereport::Column::Status),
        count_by(db, issues.clone(), issuereport::Column::IssueType),
        count_by(db, issues.clone(), issuereport::Column::PriorityLevel),
        count_by(db, sos, emergencyreport::Column::EmergencyType),
        count_by(db, bookings, booking::Column::Status),
        issues
            .clone()
            .select_only()
            .column(issuereport::Column::CreatedAt)
            .column(issuereport::Column::ResolvedAt)
            .filter(issuereport::Column::Status.eq(IssueStatus::Resolved))
            .filter(issuereport::Column::ResolvedAt.is_not_null())
            .into_tuple::<(NaiveDateTime, Option<NaiveDateTime>)>()
            .all(db),
        issues
            .select_only()
            .column(issuereport::Column::CreatedAt)
            .filter(issuereport::Column::CreatedAt.gte(window_start))
            .into_tuple::<NaiveDateTime>()
            .all(db)
    );

    let spans: Vec<(NaiveDateTime, NaiveDateTime)> = resolutions?
        .into_iter()
        .filter_map(|(created, resolved)| resolved.map(|r| (created, r)))
        .collect();

    let mut monthly_issues: BTreeMap<String, u64> = months.into_iter().map(|m| (m, 0)).collect();
    for created_at in created? {
        if let Some(count) = monthly_issues.get_mut(&created_at.format("%Y-%m").to_string()) {
            *count += 1;
        }
    }

    Ok(AnalyticsSummary {
        issues_by_status: by_status?,
        issues_by_type: by_type?,
        issues_by_priority: by_priority?,
        sos_by_type: sos_by_type?,
        bookings_by_status: bookings_by_status?,
        average_resolution_hours: average_hours(&spans),
        monthly_issues,
    })
}

pub async fn provider_summary(db: &DatabaseConnection, principal: &Principal) -> anyhow::Result<ProviderSummary> {
    let provider = scope::provider_of(db, principal).await?;
    let own = booking::Entity::find().filter(booking::Column::ProviderId.eq(provider.provider_id));

    let (completed_prices, active, stats, recent) = tokio::join!(
        own.clone()
            .select_only()
            .column(booking::Column::Price)
            .filter(booking::Column::Status.eq(BookingStatus::Completed))
            .into_tuple::<f64>()
            .all(db),
        own.clone()
            .filter(booking::Column::Status.is_in(BookingStatus::ACTIVE))
            .count(db),
        review::stats_of(db, provider.provider_id),
        own.order_by_desc(booking::Column::CreatedAt)
            .order_by_desc(booking::Column::BookingId)
            .limit(RECENT_BOOKINGS)
            .all(db)
    );

    let completed_prices = completed_prices?;
    let stats = stats?;

    Ok(ProviderSummary {
        total_earnings: round_money(completed_prices.iter().sum()),
        active_bookings: active?,
        completed_jobs: completed_prices.len() as u64,
        rating: stats.average_rating,
        total_reviews: stats.total_reviews,
        recent_bookings: bookings::enrich(db, recent?).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_month_keys_cross_year() {
        let today = NaiveDate::from_ymd_opt(2025, 2, 17).unwrap();
        assert_eq!(
            month_keys(today, 6),
            vec!["2024-09", "2024-10", "2024-11", "2024-12", "2025-01", "2025-02"]
        );
    }

    #[test]
    fn test_month_keys_month_end() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        assert_eq!(month_keys(today, 2), vec!["2025-02", "2025-03"]);
    }

    #[test]
    fn test_average_hours() {
        assert_eq!(average_hours(&[]), None);

        let spans = [
            (at(2025, 1, 1, 0), at(2025, 1, 1, 10)),
            (at(2025, 1, 2, 0), at(2025, 1, 3, 5)),
        ];
        assert_eq!(average_hours(&spans), Some(19.5));
    }

    #[test]
    fn test_average_hours_ignores_clock_skew() {
        let spans = [(at(2025, 1, 1, 10), at(2025, 1, 1, 8))];
        assert_eq!(average_hours(&spans), Some(0.0));
    }
}

//! `SeaORM` string-backed enumerations
//!
//! Every status/type column stores the display string of its variant, so
//! rows written by other tools against the same schema stay readable.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Parse a string-backed enum leniently.
///
/// Case, spaces, underscores and hyphens are ignored, so `in_progress`,
/// `In Progress` and `INPROGRESS` all resolve to the same variant.
pub fn parse_enum<E>(value: &str) -> Option<E>
where
    E: ActiveEnum<Value = String>,
{
    let wanted = fold(value);
    if wanted.is_empty() {
        return None;
    }

    E::iter().find(|v| fold(&v.to_value()) == wanted)
}

fn fold(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

macro_rules! impl_string_enum {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl std::str::FromStr for $ty {
                type Err = String;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    parse_enum(s).ok_or_else(|| format!("invalid {} '{}'", stringify!($ty), s))
                }
            }
        )+
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(15))")]
pub enum Role {
    #[sea_orm(string_value = "Resident")]
    Resident,
    #[sea_orm(string_value = "Authority")]
    Authority,
    #[sea_orm(string_value = "ServiceProvider")]
    ServiceProvider,
    #[sea_orm(string_value = "Admin")]
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(9))")]
pub enum UserStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Inactive")]
    Inactive,
    #[sea_orm(string_value = "Suspended")]
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum VerificationStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Verified")]
    Verified,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(9))")]
pub enum ProviderAvailability {
    #[sea_orm(string_value = "Available")]
    Available,
    #[sea_orm(string_value = "Busy")]
    Busy,
    #[sea_orm(string_value = "Offline")]
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(11))")]
pub enum IssueStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    #[sea_orm(string_value = "Resolved")]
    Resolved,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
}

impl IssueStatus {
    /// Whether an issue may move from `self` to `next`
    pub fn can_transition_to(self, next: IssueStatus) -> bool {
        matches!(
            (self, next),
            (
                IssueStatus::Pending,
                IssueStatus::InProgress | IssueStatus::Resolved | IssueStatus::Rejected
            ) | (
                IssueStatus::InProgress,
                IssueStatus::Resolved | IssueStatus::Rejected
            )
        )
    }

    pub fn is_closed(self) -> bool {
        matches!(self, IssueStatus::Resolved | IssueStatus::Rejected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(6))")]
pub enum Priority {
    #[sea_orm(string_value = "Low")]
    Low,
    #[sea_orm(string_value = "Medium")]
    Medium,
    #[sea_orm(string_value = "High")]
    High,
    #[sea_orm(string_value = "Urgent")]
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum VoteType {
    #[sea_orm(string_value = "up")]
    #[serde(rename = "up")]
    Up,
    #[sea_orm(string_value = "down")]
    #[serde(rename = "down")]
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum AssignmentStatus {
    #[sea_orm(string_value = "Assigned")]
    Assigned,
    #[sea_orm(string_value = "Completed")]
    Completed,
    #[sea_orm(string_value = "Reassigned")]
    Reassigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum EventCategory {
    #[sea_orm(string_value = "Social")]
    Social,
    #[sea_orm(string_value = "Cultural")]
    Cultural,
    #[sea_orm(string_value = "Sports")]
    Sports,
    #[sea_orm(string_value = "Meeting")]
    Meeting,
    #[sea_orm(string_value = "Health")]
    Health,
    #[sea_orm(string_value = "Other")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(9))")]
pub enum EventStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Approved")]
    Approved,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum InterestType {
    #[sea_orm(string_value = "Going")]
    Going,
    #[sea_orm(string_value = "Interested")]
    Interested,
    #[sea_orm(string_value = "NotGoing")]
    NotGoing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum EmergencyType {
    #[sea_orm(string_value = "Fire")]
    Fire,
    #[sea_orm(string_value = "Medical")]
    Medical,
    #[sea_orm(string_value = "Crime")]
    Crime,
    #[sea_orm(string_value = "Accident")]
    Accident,
    #[sea_orm(string_value = "Disaster")]
    Disaster,
    #[sea_orm(string_value = "Other")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum EmergencyStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Dispatched")]
    Dispatched,
    #[sea_orm(string_value = "Resolved")]
    Resolved,
}

impl EmergencyStatus {
    pub fn can_transition_to(self, next: EmergencyStatus) -> bool {
        matches!(
            (self, next),
            (
                EmergencyStatus::Active,
                EmergencyStatus::Dispatched | EmergencyStatus::Resolved
            ) | (EmergencyStatus::Dispatched, EmergencyStatus::Resolved)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(9))")]
pub enum BookingStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Accepted")]
    Accepted,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
    #[sea_orm(string_value = "Completed")]
    Completed,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

impl BookingStatus {
    /// Statuses that hold one unit of the service's availability
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Accepted];

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    /// Whether `actor` may move a booking from `self` to `next`.
    ///
    /// Residents may only withdraw a live booking; providers decide on
    /// pending requests and close accepted ones.
    pub fn can_transition_to(self, next: BookingStatus, actor: Role) -> bool {
        match actor {
            Role::Resident => self.is_active() && next == BookingStatus::Cancelled,
            Role::ServiceProvider => matches!(
                (self, next),
                (
                    BookingStatus::Pending,
                    BookingStatus::Accepted | BookingStatus::Rejected
                ) | (
                    BookingStatus::Accepted,
                    BookingStatus::Completed | BookingStatus::Cancelled
                )
            ),
            _ => false,
        }
    }

    /// Whether entering `self` hands the reserved unit back to the service
    pub fn releases_availability(self) -> bool {
        matches!(self, BookingStatus::Rejected | BookingStatus::Cancelled)
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Older clients send "Confirmed" for an accepted booking
        if fold(s) == "confirmed" {
            return Ok(BookingStatus::Accepted);
        }

        parse_enum(s).ok_or_else(|| format!("invalid BookingStatus '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "Unpaid")]
    Unpaid,
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Paid")]
    Paid,
    #[sea_orm(string_value = "Failed")]
    Failed,
    #[sea_orm(string_value = "Refunded")]
    Refunded,
}

impl PaymentStatus {
    /// Whether a new payment attempt may be made in this state
    pub fn accepts_payment(self) -> bool {
        matches!(self, PaymentStatus::Unpaid | PaymentStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(5))")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "bKash")]
    #[serde(rename = "bKash")]
    BKash,
    #[sea_orm(string_value = "Nagad")]
    Nagad,
    #[sea_orm(string_value = "Card")]
    Card,
    #[sea_orm(string_value = "Cash")]
    Cash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(7))")]
pub enum NotificationType {
    #[sea_orm(string_value = "Issue")]
    Issue,
    #[sea_orm(string_value = "Event")]
    Event,
    #[sea_orm(string_value = "Booking")]
    Booking,
    #[sea_orm(string_value = "SOS")]
    #[serde(rename = "SOS")]
    Sos,
    #[sea_orm(string_value = "Payment")]
    Payment,
    #[sea_orm(string_value = "System")]
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(7))")]
pub enum TwoFactorStatus {
    #[sea_orm(string_value = "Passed")]
    Passed,
    #[sea_orm(string_value = "Failed")]
    Failed,
    #[sea_orm(string_value = "Skipped")]
    Skipped,
}

impl_string_enum!(
    Role,
    UserStatus,
    VerificationStatus,
    ProviderAvailability,
    IssueStatus,
    Priority,
    VoteType,
    AssignmentStatus,
    EventCategory,
    EventStatus,
    InterestType,
    EmergencyType,
    EmergencyStatus,
    PaymentStatus,
    PaymentMethod,
    NotificationType,
    TwoFactorStatus,
);

#[cfg(test)]
mod tests {
    use sea_orm::Iterable;
    use super::*;

    #[test]
    fn test_parse_is_lenient() {
        assert_eq!("in_progress".parse::<IssueStatus>(), Ok(IssueStatus::InProgress));
        assert_eq!("In Progress".parse::<IssueStatus>(), Ok(IssueStatus::InProgress));
        assert_eq!("service_provider".parse::<Role>(), Ok(Role::ServiceProvider));
        assert_eq!("BKASH".parse::<PaymentMethod>(), Ok(PaymentMethod::BKash));
        assert_eq!("sos".parse::<NotificationType>(), Ok(NotificationType::Sos));
        assert!("".parse::<Role>().is_err());
        assert!("Owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_booking_status_confirmed_alias() {
        assert_eq!("Confirmed".parse::<BookingStatus>(), Ok(BookingStatus::Accepted));
        assert_eq!("accepted".parse::<BookingStatus>(), Ok(BookingStatus::Accepted));
        assert!("Done".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_stored_values() {
        assert_eq!(IssueStatus::InProgress.to_value(), "In Progress");
        assert_eq!(VoteType::Up.to_value(), "up");
        assert_eq!(NotificationType::Sos.to_value(), "SOS");
        assert_eq!(BookingStatus::Cancelled.to_value(), "Cancelled");
    }

    #[test]
    fn test_serde_matches_stored_value() {
        assert_eq!(
            serde_json::to_string(&IssueStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
        assert_eq!(serde_json::to_string(&PaymentMethod::BKash).unwrap(), "\"bKash\"");
        for status in BookingStatus::iter() {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.to_value()));
        }
    }

    #[test]
    fn test_booking_transitions() {
        use BookingStatus::*;
        let provider = Role::ServiceProvider;

        assert!(Pending.can_transition_to(Accepted, provider));
        assert!(Pending.can_transition_to(Rejected, provider));
        assert!(Accepted.can_transition_to(Completed, provider));
        assert!(Accepted.can_transition_to(Cancelled, provider));

        assert!(!Pending.can_transition_to(Cancelled, provider));
        assert!(!Pending.can_transition_to(Completed, provider));
        assert!(!Accepted.can_transition_to(Rejected, provider));
        assert!(!Accepted.can_transition_to(Pending, provider));
        for terminal in [Rejected, Completed, Cancelled] {
            for next in BookingStatus::iter() {
                assert!(!terminal.can_transition_to(next, provider));
                assert!(!terminal.can_transition_to(next, Role::Resident));
            }
        }
    }

    #[test]
    fn test_residents_can_only_cancel() {
        use BookingStatus::*;

        assert!(Pending.can_transition_to(Cancelled, Role::Resident));
        assert!(Accepted.can_transition_to(Cancelled, Role::Resident));
        assert!(!Pending.can_transition_to(Accepted, Role::Resident));
        assert!(!Accepted.can_transition_to(Completed, Role::Resident));
        assert!(!Pending.can_transition_to(Cancelled, Role::Authority));
    }

    #[test]
    fn test_booking_availability_rules() {
        assert!(BookingStatus::Pending.is_active());
        assert!(BookingStatus::Accepted.is_active());
        assert!(!BookingStatus::Completed.is_active());
        assert!(BookingStatus::Rejected.releases_availability());
        assert!(BookingStatus::Cancelled.releases_availability());
        assert!(!BookingStatus::Completed.releases_availability());
    }

    #[test]
    fn test_issue_transitions() {
        use IssueStatus::*;

        assert!(Pending.can_transition_to(InProgress));
        assert!(Pending.can_transition_to(Resolved));
        assert!(InProgress.can_transition_to(Resolved));
        assert!(!InProgress.can_transition_to(Pending));
        assert!(!Resolved.can_transition_to(InProgress));
        assert!(!Rejected.can_transition_to(Resolved));
        assert!(Resolved.is_closed());
        assert!(!Pending.is_closed());
    }

    #[test]
    fn test_emergency_transitions() {
        use EmergencyStatus::*;

        assert!(Active.can_transition_to(Dispatched));
        assert!(Active.can_transition_to(Resolved));
        assert!(Dispatched.can_transition_to(Resolved));
        assert!(!Resolved.can_transition_to(Active));
        assert!(!Dispatched.can_transition_to(Active));
    }

    #[test]
    fn test_payment_acceptance() {
        assert!(PaymentStatus::Unpaid.accepts_payment());
        assert!(PaymentStatus::Failed.accepts_payment());
        assert!(!PaymentStatus::Paid.accepts_payment());
        assert!(!PaymentStatus::Pending.accepts_payment());
        assert!(!PaymentStatus::Refunded.accepts_payment());
    }
}

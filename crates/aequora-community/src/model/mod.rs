//! Request and response models for community workflows

pub mod account;
pub mod booking;
pub mod catalog;
pub mod community;
pub mod dashboard;
pub mod emergency;
pub mod event;
pub mod issue;
pub mod notification;
pub mod profile;

use std::str::FromStr;

use validator::Validate;

use aequora_common::AequoraError;

pub use account::*;
pub use booking::*;
pub use catalog::*;
pub use community::*;
pub use dashboard::*;
pub use emergency::*;
pub use event::*;
pub use issue::*;
pub use notification::*;
pub use profile::*;

/// Run derive-based validation, mapping failures to `ValidationFailed`
pub fn validate<T: Validate>(value: &T) -> Result<(), AequoraError> {
    value
        .validate()
        .map_err(|e| AequoraError::ValidationFailed(e.to_string()))
}

/// Parse an enumerated request field such as a status or category
pub fn parse_field<E>(field: &str, value: &str) -> Result<E, AequoraError>
where
    E: FromStr<Err = String>,
{
    value
        .parse::<E>()
        .map_err(|_| AequoraError::ValidationFailed(format!("{}: unsupported value '{}'", field, value)))
}

/// Parse an optional enumerated field, falling back to `default`
pub fn parse_field_or<E>(field: &str, value: Option<&str>, default: E) -> Result<E, AequoraError>
where
    E: FromStr<Err = String>,
{
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse_field(field, v),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aequora_persistence::entity::sea_orm_active_enums::{BookingStatus, Priority};

    #[test]
    fn test_parse_field() {
        let status: BookingStatus = parse_field("status", "Confirmed").unwrap();
        assert_eq!(status, BookingStatus::Accepted);

        let err = parse_field::<BookingStatus>("status", "Done").unwrap_err();
        assert_eq!(err.to_string(), "status: unsupported value 'Done'");
    }

    #[test]
    fn test_parse_field_or_default() {
        assert_eq!(
            parse_field_or("priority", None, Priority::Medium).unwrap(),
            Priority::Medium
        );
        assert_eq!(
            parse_field_or("priority", Some("  "), Priority::Medium).unwrap(),
            Priority::Medium
        );
        assert_eq!(
            parse_field_or("priority", Some("urgent"), Priority::Medium).unwrap(),
            Priority::Urgent
        );
        assert!(parse_field_or("priority", Some("whenever"), Priority::Medium).is_err());
    }
}

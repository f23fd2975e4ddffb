//! Utility functions for Aequora
//!
//! Input normalisation helpers shared by the service and HTTP layers.

use std::sync::LazyLock;

/// Phone numbers: optional leading '+', then 6 to 15 digits with optional separators
static PHONE_PATTERN: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^\+?[0-9][0-9 \-]{4,18}[0-9]$").expect("Invalid regex pattern")
});

/// Lowercase and trim an email address before it is stored or compared.
///
/// # Examples
///
/// ```
/// use aequora_common::normalize_email;
///
/// assert_eq!(normalize_email("  Jane.Doe@Example.COM "), "jane.doe@example.com");
/// ```
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate a phone number
///
/// # Examples
///
/// ```
/// use aequora_common::is_valid_phone;
///
/// assert!(is_valid_phone("+8801712345678"));
/// assert!(is_valid_phone("017-1234-5678"));
/// assert!(!is_valid_phone("call me"));
/// ```
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();

    PHONE_PATTERN.is_match(phone.trim()) && (6..=15).contains(&digits)
}

/// Round a monetary amount to two decimal places
pub fn round_money(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Trim an optional string, mapping blank values to `None`
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("A@B.com"), "a@b.com");
        assert_eq!(normalize_email("  x@y.org\t"), "x@y.org");
    }

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("01712345678"));
        assert!(is_valid_phone("+1 555 123 4567"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("+12345678901234567"));
        assert!(!is_valid_phone("0171234567a"));
        assert!(!is_valid_phone(""));
    }

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(10.006), 10.01);
        assert_eq!(round_money(99.994), 99.99);
        assert_eq!(round_money(0.0), 0.0);
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(Some(" Dhaka ".to_string())), Some("Dhaka".to_string()));
    }

    proptest! {
        #[test]
        fn prop_normalize_email_is_idempotent(email in "[A-Za-z0-9._ ]{0,20}@[A-Za-z]{1,10}\\.[a-z]{2,3}") {
            let once = normalize_email(&email);
            prop_assert_eq!(normalize_email(&once), once.clone());
        }

        #[test]
        fn prop_round_money_has_two_decimals(cents in 0i64..10_000_000) {
            let amount = cents as f64 / 100.0;
            prop_assert!((round_money(amount) - amount).abs() < 1e-9);
        }
    }
}

//! Aequora Common - Shared types and utilities
//!
//! This crate provides the foundational types used across all Aequora components:
//! - Error types and error codes
//! - Input normalisation helpers
//! - Common constants

pub mod error;
pub mod utils;

// Re-exports for convenience
pub use error::{AequoraError, ErrorCode};
pub use utils::{is_valid_phone, non_blank, normalize_email, round_money};

/// Minimum accepted password length for registration and password changes
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Default page size for paged listings
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Upper bound for a requested page size
pub const MAX_PAGE_SIZE: u64 = 200;

/// Message returned by the health endpoint
pub const HEALTH_MESSAGE: &str = "AEQUORA API is working";

/// Clamp paging parameters into a usable `(page_no, page_size)` pair.
///
/// Page numbers start at 1.
pub fn paging(page_no: Option<u64>, page_size: Option<u64>) -> (u64, u64) {
    let page_no = page_no.unwrap_or(1).max(1);
    let page_size = page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    (page_no, page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_defaults() {
        assert_eq!(paging(None, None), (1, DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn test_paging_clamps() {
        assert_eq!(paging(Some(0), Some(0)), (1, 1));
        assert_eq!(paging(Some(3), Some(10_000)), (3, MAX_PAGE_SIZE));
    }
}

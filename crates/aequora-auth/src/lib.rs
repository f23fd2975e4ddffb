//! Aequora Auth - Authentication primitives
//!
//! This crate provides:
//! - JWT token issuing, verification and revocation
//! - Password hashing
//! - Login attempt rate limiting
//! - The authenticated principal model

pub mod model;
pub mod service;

// Re-export commonly used types
pub use model::*;
pub use service::password::{check_password_policy, hash_password, verify_password};
pub use service::rate_limit::{AttemptOutcome, AuthRateLimitConfig, AuthRateLimiter};
pub use service::token::{IssuedToken, TokenService};

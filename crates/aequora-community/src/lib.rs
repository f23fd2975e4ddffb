//! Aequora Community - Community workflows
//!
//! This crate provides:
//! - Identity workflows (registration, login, profiles)
//! - Issue reporting, voting and triage
//! - Event requests, publication and participation
//! - Emergency (SOS) alerts
//! - Service catalog, bookings, payments and reviews
//! - Notifications, dashboards and the activity log

pub mod model;
pub mod service;

// Re-export commonly used types
pub use model::*;
pub use service::booking::BookingPolicy;
pub use service::catalog::Removal;
pub use service::payment::{
    ChargeOutcome, ChargeRequest, ChargeStatus, HttpGateway, HttpGatewayConfig, PaymentGateway,
    SandboxGateway,
};

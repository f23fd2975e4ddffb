//! HTTP API handlers grouped by audience

pub mod admin;
pub mod auth;
pub mod authority;
pub mod community;
pub mod health;
pub mod notification;
pub mod provider;
pub mod resident;
pub mod route;

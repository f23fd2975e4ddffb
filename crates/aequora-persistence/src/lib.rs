//! Aequora Persistence - Database entities and persistence layer
//!
//! This crate provides:
//! - SeaORM entity definitions for the community schema
//! - String-backed enumerations stored in status/type columns
//! - Domain model types shared by paged queries

pub mod entity;
pub mod model;

// Re-export sea-orm for convenience
pub use sea_orm;

// Re-export entity prelude
pub use entity::prelude::*;

// Re-export model types
pub use model::Page;

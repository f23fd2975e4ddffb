//! Community service layer
//!
//! Free functions over a SeaORM connection, one module per workflow.

pub mod account;
pub mod activity;
pub mod admin;
pub mod booking;
pub mod catalog;
pub mod community;
pub mod dashboard;
pub mod emergency;
pub mod event;
pub mod issue;
pub mod notification;
pub mod payment;
pub mod profile;
pub mod review;
pub mod scope;

/// Local wall-clock time used for every stored timestamp
pub(crate) fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

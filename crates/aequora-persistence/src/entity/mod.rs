//! `SeaORM` entities for the community schema
//!
//! Table and column names follow the legacy database layout
//! (`issuereport.issueID`, `user.communityID`, ...).

pub mod prelude;

pub mod activitylog;
pub mod authority;
pub mod authoritycommunity;
pub mod booking;
pub mod community;
pub mod emergencyreport;
pub mod event;
pub mod eventparticipation;
pub mod issueassignment;
pub mod issuereport;
pub mod issuevote;
pub mod loginlog;
pub mod notification;
pub mod payment;
pub mod resident;
pub mod review;
pub mod sea_orm_active_enums;
pub mod service;
pub mod serviceprovider;
pub mod user;
pub mod user_email;
pub mod user_phonenumber;

pub use super::activitylog::Entity as Activitylog;
pub use super::authority::Entity as Authority;
pub use super::authoritycommunity::Entity as Authoritycommunity;
pub use super::booking::Entity as Booking;
pub use super::community::Entity as Community;
pub use super::emergencyreport::Entity as Emergencyreport;
pub use super::event::Entity as Event;
pub use super::eventparticipation::Entity as Eventparticipation;
pub use super::issueassignment::Entity as Issueassignment;
pub use super::issuereport::Entity as Issuereport;
pub use super::issuevote::Entity as Issuevote;
pub use super::loginlog::Entity as Loginlog;
pub use super::notification::Entity as Notification;
pub use super::payment::Entity as Payment;
pub use super::resident::Entity as Resident;
pub use super::review::Entity as Review;
pub use super::service::Entity as Service;
pub use super::serviceprovider::Entity as Serviceprovider;
pub use super::user::Entity as User;
pub use super::user_email::Entity as UserEmail;
pub use super::user_phonenumber::Entity as UserPhonenumber;

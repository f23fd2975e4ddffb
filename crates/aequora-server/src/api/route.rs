//! HTTP route table
//!
//! Everything here is mounted below the configured context path (`/api`).

use actix_web::web;

use aequora_persistence::entity::sea_orm_active_enums::Role;

use super::{admin, auth, authority, community, health, notification, provider, resident};

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(auth::register)
        .service(auth::login)
        .service(auth::logout)
        .service(auth::me)
        .service(auth::update_me)
        .service(auth::set_password)
        .service(community::list_public)
        .service(community::list)
        .service(community::create)
        .service(community::get)
        .service(community::update)
        .service(community::remove)
        .service(notification::mark_read)
        .service(authority::issues)
        .service(authority::issue_detail)
        .service(authority::update_issue)
        .service(authority::analytics)
        .service(admin_routes())
        .service(resident_routes())
        .service(authority_routes())
        .service(provider_routes());
}

fn admin_routes() -> actix_web::Scope {
    web::scope("/admin")
        .service(admin::users)
        .service(admin::user_status)
        .service(admin::resident_verification)
        .service(admin::dashboard_stats)
        .service(admin::activity_logs)
}

fn resident_routes() -> actix_web::Scope {
    web::scope("/resident")
        .service(resident::create_issue)
        .service(resident::issues)
        .service(resident::community_issues)
        .service(resident::vote)
        .service(resident::events)
        .service(resident::request_event)
        .service(resident::participate)
        .service(resident::raise_sos)
        .service(resident::sos)
        .service(resident::services)
        .service(resident::create_booking)
        .service(resident::bookings)
        .service(resident::cancel_booking)
        .service(resident::pay)
        .service(resident::review_booking)
        .service(resident::payments)
        .service(resident::dashboard_stats)
        .service(notification::inbox(Role::Resident))
}

fn authority_routes() -> actix_web::Scope {
    web::scope("/authority")
        .service(authority::departments)
        .service(authority::voting_results)
        .service(authority::events)
        .service(authority::publish_event)
        .service(authority::event_requests)
        .service(authority::event_action)
        .service(authority::cancel_event)
        .service(authority::sos)
        .service(authority::update_sos)
        .service(authority::dispatch_sos)
        .service(authority::announce)
        .service(authority::dashboard_stats)
        .service(authority::profile)
        .service(authority::update_profile)
        .service(notification::inbox(Role::Authority))
}

fn provider_routes() -> actix_web::Scope {
    web::scope("/service-provider")
        .service(provider::services)
        .service(provider::create_service)
        .service(provider::update_service)
        .service(provider::delete_service)
        .service(provider::bookings)
        .service(provider::update_booking_status)
        .service(provider::reviews)
        .service(provider::dashboard_summary)
        .service(provider::profile)
        .service(provider::update_profile)
        .service(notification::inbox(Role::ServiceProvider))
}

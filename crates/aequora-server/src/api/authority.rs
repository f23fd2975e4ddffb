//! Authority endpoints
//!
//! Issue triage and analytics live at the top level (`/issues/`,
//! `/analytics/summary/`); everything else is mounted under `/authority`.

use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, put, web};

use aequora_community::model::{
    AnnouncementRequest, DispatchRequest, EventActionRequest, EventRequest, IssueFilter, SosFilter,
    StatusRequest, UpdateAuthorityProfileRequest, UpdateIssueRequest,
};
use aequora_community::service::{dashboard, emergency, event, issue, notification, profile as profile_service};
use aequora_persistence::entity::sea_orm_active_enums::Role;

use crate::{
    Secured,
    error::AppError,
    model::{AppState, Result},
    secured,
};

macro_rules! authority {
    ($req:expr, $data:expr) => {
        secured!(Secured::builder(&$req, &$data).role(Role::Authority).build())
    };
}

// ---------------------------------------------------------------------------
// Issue triage
// ---------------------------------------------------------------------------

#[get("/issues/")]
pub async fn issues(
    req: HttpRequest,
    data: web::Data<AppState>,
    params: web::Query<IssueFilter>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = authority!(req, data);

    Ok(Result::<()>::http_success(
        issue::list_for_authority(data.db(), &principal, &params).await?,
    ))
}

#[get("/issues/{id}/")]
pub async fn issue_detail(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = authority!(req, data);

    Ok(Result::<()>::http_success(
        issue::get_for_authority(data.db(), &principal, path.into_inner()).await?,
    ))
}

#[patch("/issues/{id}/")]
pub async fn update_issue(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<UpdateIssueRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = authority!(req, data);

    Ok(Result::<()>::http_success(
        issue::update(data.db(), &principal, path.into_inner(), body.into_inner()).await?,
    ))
}

#[get("/analytics/summary/")]
pub async fn analytics(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = authority!(req, data);

    Ok(Result::<()>::http_success(
        dashboard::analytics(data.db(), &principal).await?,
    ))
}

#[get("/departments/")]
pub async fn departments(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = authority!(req, data);

    Ok(Result::<()>::http_success(
        issue::departments(data.db(), &principal).await?,
    ))
}

#[get("/voting-results/")]
pub async fn voting_results(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = authority!(req, data);

    Ok(Result::<()>::http_success(
        issue::voting_results(data.db(), &principal).await?,
    ))
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[get("/events/")]
pub async fn events(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = authority!(req, data);

    Ok(Result::<()>::http_success(
        event::list_for_authority(data.db(), &principal).await?,
    ))
}

#[post("/events/")]
pub async fn publish_event(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<EventRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = authority!(req, data);

    Ok(Result::<()>::http_created(
        event::publish(data.db(), &principal, body.into_inner()).await?,
    ))
}

#[get("/events/requests/")]
pub async fn event_requests(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = authority!(req, data);

    Ok(Result::<()>::http_success(
        event::pending_requests(data.db(), &principal).await?,
    ))
}

#[post("/events/{id}/action/")]
pub async fn event_action(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<EventActionRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = authority!(req, data);

    Ok(Result::<()>::http_success(
        event::act(data.db(), &principal, path.into_inner(), body.into_inner()).await?,
    ))
}

#[delete("/events/{id}/")]
pub async fn cancel_event(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = authority!(req, data);

    Ok(Result::<()>::http_success(
        event::cancel(data.db(), &principal, path.into_inner()).await?,
    ))
}

// ---------------------------------------------------------------------------
// SOS
// ---------------------------------------------------------------------------

#[get("/sos/")]
pub async fn sos(
    req: HttpRequest,
    data: web::Data<AppState>,
    params: web::Query<SosFilter>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = authority!(req, data);

    Ok(Result::<()>::http_success(
        emergency::list_for_authority(data.db(), &principal, &params).await?,
    ))
}

#[patch("/sos/{id}/")]
pub async fn update_sos(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<StatusRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = authority!(req, data);

    Ok(Result::<()>::http_success(
        emergency::update_status(data.db(), &principal, path.into_inner(), body.into_inner())
            .await?,
    ))
}

#[post("/sos/{id}/dispatch/")]
pub async fn dispatch_sos(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<DispatchRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = authority!(req, data);

    Ok(Result::<()>::http_success(
        emergency::dispatch(data.db(), &principal, path.into_inner(), body.into_inner()).await?,
    ))
}

// ---------------------------------------------------------------------------
// Announcements, dashboard and profile
// ---------------------------------------------------------------------------

#[post("/announcements/")]
pub async fn announce(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<AnnouncementRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = authority!(req, data);
    let recipients = notification::announce(data.db(), &principal, body.into_inner()).await?;

    Ok(Result::<()>::http_success(
        serde_json::json!({ "recipients": recipients }),
    ))
}

#[get("/dashboard-stats/")]
pub async fn dashboard_stats(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = authority!(req, data);

    Ok(Result::<()>::http_success(
        dashboard::authority_stats(data.db(), &principal).await?,
    ))
}

#[get("/profile/")]
pub async fn profile(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = authority!(req, data);

    Ok(Result::<()>::http_success(
        profile_service::authority_profile(data.db(), &principal).await?,
    ))
}

#[put("/profile/")]
pub async fn update_profile(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<UpdateAuthorityProfileRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = authority!(req, data);

    Ok(Result::<()>::http_success(
        profile_service::update_authority_profile(data.db(), &principal, body.into_inner()).await?,
    ))
}

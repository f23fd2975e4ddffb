//! Resident endpoints, mounted under `/resident`

use actix_web::{HttpRequest, HttpResponse, get, post, web};

use aequora_community::model::{
    CreateBookingRequest, CreateIssueRequest, EventRequest, ParticipateRequest, PayRequest,
    ReviewRequest, ServiceFilter, SosRequest, VoteRequest,
};
use aequora_community::service::{
    booking, catalog, dashboard, emergency, event, issue, payment, review,
};
use aequora_persistence::entity::sea_orm_active_enums::Role;

use crate::{
    Secured,
    error::AppError,
    model::{AppState, Result},
    secured,
};

macro_rules! resident {
    ($req:expr, $data:expr) => {
        secured!(Secured::builder(&$req, &$data).role(Role::Resident).build())
    };
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

#[post("/issues/")]
pub async fn create_issue(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<CreateIssueRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = resident!(req, data);

    Ok(Result::<()>::http_created(
        issue::create(data.db(), &principal, body.into_inner()).await?,
    ))
}

#[get("/issues/")]
pub async fn issues(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = resident!(req, data);

    Ok(Result::<()>::http_success(
        issue::list_own(data.db(), &principal).await?,
    ))
}

#[get("/community-issues/")]
pub async fn community_issues(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = resident!(req, data);

    Ok(Result::<()>::http_success(
        issue::list_community(data.db(), &principal).await?,
    ))
}

#[post("/vote/")]
pub async fn vote(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<VoteRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = resident!(req, data);

    Ok(Result::<()>::http_success(
        issue::vote(data.db(), &principal, body.into_inner()).await?,
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
    let principal = resident!(req, data);

    Ok(Result::<()>::http_success(
        event::upcoming_for_resident(data.db(), &principal).await?,
    ))
}

#[post("/events/request/")]
pub async fn request_event(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<EventRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = resident!(req, data);

    Ok(Result::<()>::http_created(
        event::request(data.db(), &principal, body.into_inner()).await?,
    ))
}

#[post("/events/participate/")]
pub async fn participate(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<ParticipateRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = resident!(req, data);

    Ok(Result::<()>::http_success(
        event::participate(data.db(), &principal, body.into_inner()).await?,
    ))
}

// ---------------------------------------------------------------------------
// SOS
// ---------------------------------------------------------------------------

#[post("/sos/")]
pub async fn raise_sos(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<SosRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = resident!(req, data);

    Ok(Result::<()>::http_created(
        emergency::raise(data.db(), &principal, body.into_inner()).await?,
    ))
}

#[get("/sos/")]
pub async fn sos(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = resident!(req, data);

    Ok(Result::<()>::http_success(
        emergency::list_own(data.db(), &principal).await?,
    ))
}

// ---------------------------------------------------------------------------
// Services, bookings, payments and reviews
// ---------------------------------------------------------------------------

#[get("/services/")]
pub async fn services(
    req: HttpRequest,
    data: web::Data<AppState>,
    params: web::Query<ServiceFilter>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = resident!(req, data);

    Ok(Result::<()>::http_success(
        catalog::list_for_resident(data.db(), &principal, &params).await?,
    ))
}

#[post("/bookings/")]
pub async fn create_booking(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<CreateBookingRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = resident!(req, data);

    Ok(Result::<()>::http_created(
        booking::create(
            data.db(),
            &data.booking_policy,
            &principal,
            body.into_inner(),
        )
        .await?,
    ))
}

#[get("/bookings/")]
pub async fn bookings(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = resident!(req, data);

    Ok(Result::<()>::http_success(
        booking::list_own(data.db(), &principal).await?,
    ))
}

#[post("/bookings/{id}/cancel/")]
pub async fn cancel_booking(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = resident!(req, data);

    Ok(Result::<()>::http_success(
        booking::cancel(data.db(), data.gateway(), &principal, path.into_inner()).await?,
    ))
}

#[post("/bookings/{id}/pay/")]
pub async fn pay(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<PayRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = resident!(req, data);

    Ok(Result::<()>::http_success(
        payment::pay(
            data.db(),
            data.gateway(),
            &principal,
            path.into_inner(),
            body.into_inner(),
        )
        .await?,
    ))
}

#[post("/bookings/{id}/review/")]
pub async fn review_booking(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<ReviewRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = resident!(req, data);

    Ok(Result::<()>::http_created(
        review::create(data.db(), &principal, path.into_inner(), body.into_inner()).await?,
    ))
}

#[get("/payments/")]
pub async fn payments(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = resident!(req, data);

    Ok(Result::<()>::http_success(
        payment::list_payments(data.db(), &principal).await?,
    ))
}

#[get("/dashboard-stats/")]
pub async fn dashboard_stats(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = resident!(req, data);

    Ok(Result::<()>::http_success(
        dashboard::resident_stats(data.db(), &principal).await?,
    ))
}

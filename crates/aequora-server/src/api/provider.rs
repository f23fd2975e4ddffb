//! Service provider endpoints, mounted under `/service-provider`

use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, put, route, web};

use aequora_community::Removal;
use aequora_community::model::{
    BookingFilter, BookingStatusRequest, CreateServiceRequest, UpdateProviderProfileRequest,
    UpdateServiceRequest,
};
use aequora_community::service::{booking, catalog, dashboard, profile as profile_service, review};
use aequora_persistence::entity::sea_orm_active_enums::Role;

use crate::{
    Secured,
    error::AppError,
    model::{AppState, Message, Result},
    secured,
};

macro_rules! provider {
    ($req:expr, $data:expr) => {
        secured!(
            Secured::builder(&$req, &$data)
                .role(Role::ServiceProvider)
                .build()
        )
    };
}

#[get("/services/")]
pub async fn services(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = provider!(req, data);

    Ok(Result::<()>::http_success(
        catalog::list_own(data.db(), &principal).await?,
    ))
}

#[post("/services/")]
pub async fn create_service(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<CreateServiceRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = provider!(req, data);

    Ok(Result::<()>::http_created(
        catalog::create(data.db(), &principal, body.into_inner()).await?,
    ))
}

#[route("/services/{id}/", method = "PUT", method = "PATCH")]
pub async fn update_service(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<UpdateServiceRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = provider!(req, data);

    Ok(Result::<()>::http_success(
        catalog::update(data.db(), &principal, path.into_inner(), body.into_inner()).await?,
    ))
}

#[delete("/services/{id}/")]
pub async fn delete_service(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = provider!(req, data);

    let message = match catalog::delete(data.db(), &principal, path.into_inner()).await? {
        Removal::Deleted => "service deleted",
        Removal::Deactivated => "service has booking history and was deactivated",
    };

    Ok(Result::<()>::http_success(Message::new(message)))
}

#[get("/bookings/")]
pub async fn bookings(
    req: HttpRequest,
    data: web::Data<AppState>,
    params: web::Query<BookingFilter>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = provider!(req, data);

    Ok(Result::<()>::http_success(
        booking::list_for_provider(data.db(), &principal, &params).await?,
    ))
}

#[patch("/bookings/{id}/update-status/")]
pub async fn update_booking_status(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<BookingStatusRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = provider!(req, data);

    Ok(Result::<()>::http_success(
        booking::update_status(
            data.db(),
            data.gateway(),
            &principal,
            path.into_inner(),
            body.into_inner(),
        )
        .await?,
    ))
}

#[get("/reviews/")]
pub async fn reviews(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = provider!(req, data);

    Ok(Result::<()>::http_success(
        review::list_for_provider(data.db(), &principal).await?,
    ))
}

#[get("/dashboard-summary/")]
pub async fn dashboard_summary(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = provider!(req, data);

    Ok(Result::<()>::http_success(
        dashboard::provider_summary(data.db(), &principal).await?,
    ))
}

#[get("/profile/")]
pub async fn profile(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = provider!(req, data);

    Ok(Result::<()>::http_success(
        profile_service::provider_profile(data.db(), &principal).await?,
    ))
}

#[put("/profile/")]
pub async fn update_profile(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<UpdateProviderProfileRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = provider!(req, data);

    Ok(Result::<()>::http_success(
        profile_service::update_provider_profile(data.db(), &principal, body.into_inner()).await?,
    ))
}

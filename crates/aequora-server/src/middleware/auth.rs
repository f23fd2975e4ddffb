// Authentication middleware for Actix-web
// This middleware decodes the bearer token and stores the authentication context

use actix_service::forward_ready;
use actix_utils::future::{Ready, ok};
use actix_web::{
    Error, HttpMessage, HttpRequest,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    web::Data,
};

use futures::future::LocalBoxFuture;

use aequora_auth::{
    ACCESS_TOKEN_HEADER, AUTHORIZATION_HEADER, AuthContext, BEARER_PREFIX, TOKEN_PREFIX,
};

use crate::model::AppState;

// Authentication middleware transformer
pub struct Authentication;

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthenticationMiddleware { service })
    }
}

pub struct AuthenticationMiddleware<S> {
    service: S,
}

/// Extract token from request using 3 sources in priority order:
/// 1. `Authorization: Bearer <token>` header
/// 2. `Authorization: Token <token>` header
/// 3. `accessToken` HTTP header
fn extract_token(req: &ServiceRequest) -> Option<String> {
    if let Some(header_val) = req.headers().get(AUTHORIZATION_HEADER)
        && let Ok(s) = header_val.to_str()
    {
        let trimmed = s.trim();
        if let Some(token) = trimmed
            .strip_prefix(BEARER_PREFIX)
            .or_else(|| trimmed.strip_prefix(TOKEN_PREFIX))
        {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    if let Some(header_val) = req.headers().get(ACCESS_TOKEN_HEADER)
        && let Ok(s) = header_val.to_str()
    {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }

    None
}

/// The raw token the caller presented, if any
pub fn presented_token(req: &HttpRequest) -> Option<String> {
    req.extensions()
        .get::<AuthContext>()
        .and_then(|ctx| ctx.token.clone())
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if Method::OPTIONS != *req.method() {
            let mut auth_context = AuthContext::default();

            if let Some(token) = extract_token(&req) {
                auth_context.token_provided = true;

                if let Some(app_state) = req.app_data::<Data<AppState>>() {
                    match app_state.token_service.verify(&token) {
                        Ok(claims) => {
                            auth_context.user_id = claims.user_id();
                            auth_context.role = Some(claims.role);
                        }
                        Err(err) => {
                            tracing::debug!(error = %err, "Rejected bearer token");
                            auth_context.jwt_error = Some(err);
                        }
                    }
                } else {
                    tracing::error!("AppState not found in request app_data");
                }

                auth_context.token = Some(token);
            }

            // Always insert AuthContext so the secured guard can inspect it
            req.extensions_mut().insert(auth_context);
        }

        let res = self.service.call(req);

        Box::pin(async move { res.await.map(ServiceResponse::map_into_left_body) })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn test_extract_bearer_and_token_schemes() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION_HEADER, "Bearer abc.def"))
            .to_srv_request();
        assert_eq!(extract_token(&req), Some("abc.def".to_string()));

        let req = TestRequest::default()
            .insert_header((AUTHORIZATION_HEADER, "Token xyz"))
            .to_srv_request();
        assert_eq!(extract_token(&req), Some("xyz".to_string()));
    }

    #[test]
    fn test_extract_access_token_header() {
        let req = TestRequest::default()
            .insert_header((ACCESS_TOKEN_HEADER, " tok "))
            .to_srv_request();
        assert_eq!(extract_token(&req), Some("tok".to_string()));
    }

    #[test]
    fn test_extract_nothing() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION_HEADER, "Basic dXNlcjpwYXNz"))
            .to_srv_request();
        assert_eq!(extract_token(&req), None);

        let req = TestRequest::default()
            .insert_header((AUTHORIZATION_HEADER, "Bearer   "))
            .to_srv_request();
        assert_eq!(extract_token(&req), None);
    }
}

// Error handling for the Aequora HTTP surface
// Maps domain errors onto status codes and the response envelope

use std::fmt::{Display, Formatter};

use actix_web::HttpResponse;
use actix_web::http::StatusCode;

pub use aequora_common::error::{
    AequoraError, DATA_ACCESS_ERROR, ErrorCode, PARAMETER_VALIDATE_ERROR, SERVER_ERROR,
};

use crate::model::response as common;

// Local wrapper for application errors to implement actix-web error handling
// (Cannot impl foreign trait for foreign type due to orphan rules)
#[derive(Debug)]
pub struct AppError {
    inner: anyhow::Error,
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError { inner: value }
    }
}

impl From<AequoraError> for AppError {
    fn from(value: AequoraError) -> Self {
        AppError {
            inner: value.into(),
        }
    }
}

impl AppError {
    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }

    pub fn downcast_ref<E: std::error::Error + Send + Sync + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    fn status_and_code(&self) -> (u16, ErrorCode<'static>) {
        if let Some(e) = self.downcast_ref::<AequoraError>() {
            return (e.http_status(), e.error_code());
        }

        if self.downcast_ref::<sea_orm::DbErr>().is_some() {
            return (500, DATA_ACCESS_ERROR);
        }

        (500, SERVER_ERROR)
    }
}

impl actix_web::error::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_and_code().0).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let (status, code) = self.status_and_code();

        let message = if status >= 500 {
            tracing::error!(error = ?self.inner, "Request failed");
            // Internal details stay in the log
            match self.downcast_ref::<AequoraError>() {
                Some(e @ AequoraError::PaymentError(_)) => e.to_string(),
                _ => code.message.to_string(),
            }
        } else {
            self.inner.to_string()
        };

        common::Result::<Option<()>>::http_response(status, code.code, message, None::<()>)
    }
}

/// Turn a malformed query string or body into the validation envelope
pub fn request_error_handler(message: String) -> actix_web::Error {
    let body = common::Result::<Option<()>>::http_response(
        400,
        PARAMETER_VALIDATE_ERROR.code,
        message.clone(),
        None::<()>,
    );

    actix_web::error::InternalError::from_response(message, body).into()
}

#[cfg(test)]
mod tests {
    use actix_web::ResponseError;
    use actix_web::body::MessageBody;

    use super::*;

    fn body_json(response: HttpResponse) -> serde_json::Value {
        let bytes = response.into_body().try_into_bytes().unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_domain_error_mapping() {
        let err = AppError::from(AequoraError::DuplicateBooking(
            "already booked for that date".to_string(),
        ));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let json = body_json(err.error_response());
        assert_eq!(json["code"], 23001);
        assert_eq!(json["message"], "already booked for that date");
        assert!(json["data"].is_null());
    }

    #[test]
    fn test_not_found_mapping() {
        let err = AppError::from(AequoraError::ResourceNotFound("booking 9".to_string()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(err.error_response())["message"], "booking 9 not found");
    }

    #[test]
    fn test_payment_error_keeps_message() {
        let err = AppError::from(AequoraError::PaymentError("card declined".to_string()));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            body_json(err.error_response())["message"],
            "payment error: card declined"
        );
    }

    #[test]
    fn test_unknown_error_is_hidden() {
        let err = AppError::from(anyhow::anyhow!("connection reset by peer"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(err.error_response());
        assert_eq!(json["code"], SERVER_ERROR.code);
        assert_eq!(json["message"], SERVER_ERROR.message);
    }

    #[test]
    fn test_db_error_mapping() {
        let err = AppError::from(anyhow::Error::from(sea_orm::DbErr::Custom(
            "boom".to_string(),
        )));
        let json = body_json(err.error_response());
        assert_eq!(json["code"], DATA_ACCESS_ERROR.code);
    }
}

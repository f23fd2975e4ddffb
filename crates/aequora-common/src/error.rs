//! Error types and error codes for Aequora
//!
//! This module defines:
//! - `AequoraError`: Application-specific error enum
//! - `ErrorCode`: Structured error codes for API responses

use serde::{Deserialize, Serialize};

/// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum AequoraError {
    #[error("caused: {0}")]
    IllegalArgument(String),

    #[error("{0}")]
    ValidationFailed(String),

    #[error("{0} not found")]
    ResourceNotFound(String),

    #[error("{0}")]
    ResourceConflict(String),

    #[error("{0}")]
    IllegalState(String),

    #[error("{0}")]
    DuplicateBooking(String),

    #[error("service '{0}' has no remaining availability")]
    ServiceUnavailable(String),

    #[error("user '{0}' not exist!")]
    UserNotExist(String),

    #[error("authentication error: {0}")]
    AuthError(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("too many failed attempts, retry after {0} seconds")]
    TooManyAttempts(u64),

    #[error("payment error: {0}")]
    PaymentError(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl AequoraError {
    /// HTTP status code this error is reported with
    pub fn http_status(&self) -> u16 {
        match self {
            AequoraError::IllegalArgument(_) | AequoraError::ValidationFailed(_) => 400,
            AequoraError::AuthError(_) | AequoraError::UserNotExist(_) => 401,
            AequoraError::AccessDenied(_) => 403,
            AequoraError::ResourceNotFound(_) => 404,
            AequoraError::ResourceConflict(_)
            | AequoraError::IllegalState(_)
            | AequoraError::DuplicateBooking(_)
            | AequoraError::ServiceUnavailable(_) => 409,
            AequoraError::TooManyAttempts(_) => 429,
            AequoraError::PaymentError(_) => 502,
            AequoraError::DatabaseError(_)
            | AequoraError::ConfigError(_)
            | AequoraError::InternalError(_) => 500,
        }
    }

    /// Structured error code carried in the response envelope
    pub fn error_code(&self) -> ErrorCode<'static> {
        match self {
            AequoraError::IllegalArgument(_) => PARAMETER_MISSING,
            AequoraError::ValidationFailed(_) => PARAMETER_VALIDATE_ERROR,
            AequoraError::AuthError(_) | AequoraError::UserNotExist(_) => AUTH_FAILED,
            AequoraError::AccessDenied(_) => ACCESS_DENIED,
            AequoraError::ResourceNotFound(_) => RESOURCE_NOT_FOUND,
            AequoraError::ResourceConflict(_) => RESOURCE_CONFLICT,
            AequoraError::IllegalState(_) => ILLEGAL_STATUS_TRANSITION,
            AequoraError::DuplicateBooking(_) => BOOKING_DUPLICATE,
            AequoraError::ServiceUnavailable(_) => SERVICE_UNAVAILABLE,
            AequoraError::TooManyAttempts(_) => TOO_MANY_ATTEMPTS,
            AequoraError::PaymentError(_) => PAYMENT_FAILED,
            AequoraError::DatabaseError(_) => DATA_ACCESS_ERROR,
            AequoraError::ConfigError(_) | AequoraError::InternalError(_) => SERVER_ERROR,
        }
    }
}

/// Error code structure for API responses
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

// General success and error codes
pub const SUCCESS: ErrorCode<'static> = ErrorCode {
    code: 0,
    message: "success",
};

pub const PARAMETER_MISSING: ErrorCode<'static> = ErrorCode {
    code: 10000,
    message: "parameter missing",
};

pub const ACCESS_DENIED: ErrorCode<'static> = ErrorCode {
    code: 10001,
    message: "access denied",
};

pub const DATA_ACCESS_ERROR: ErrorCode<'static> = ErrorCode {
    code: 10002,
    message: "data access error",
};

pub const AUTH_FAILED: ErrorCode<'static> = ErrorCode {
    code: 10003,
    message: "authentication failed",
};

pub const TOO_MANY_ATTEMPTS: ErrorCode<'static> = ErrorCode {
    code: 10004,
    message: "too many attempts",
};

// Parameter and resource errors
pub const PARAMETER_VALIDATE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "parameter validate error",
};

pub const RESOURCE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 20004,
    message: "resource not found",
};

pub const RESOURCE_CONFLICT: ErrorCode<'static> = ErrorCode {
    code: 20005,
    message: "resource conflict",
};

// Workflow errors
pub const ILLEGAL_STATUS_TRANSITION: ErrorCode<'static> = ErrorCode {
    code: 23000,
    message: "illegal status transition",
};

pub const BOOKING_DUPLICATE: ErrorCode<'static> = ErrorCode {
    code: 23001,
    message: "duplicate booking",
};

pub const SERVICE_UNAVAILABLE: ErrorCode<'static> = ErrorCode {
    code: 23002,
    message: "service unavailable",
};

pub const PAYMENT_FAILED: ErrorCode<'static> = ErrorCode {
    code: 23003,
    message: "payment failed",
};

pub const SERVER_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30000,
    message: "server error",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aequora_error_display() {
        let err = AequoraError::IllegalArgument("invalid param".to_string());
        assert_eq!(format!("{}", err), "caused: invalid param");

        let err = AequoraError::ResourceNotFound("booking 7".to_string());
        assert_eq!(format!("{}", err), "booking 7 not found");

        let err = AequoraError::TooManyAttempts(42);
        assert_eq!(
            format!("{}", err),
            "too many failed attempts, retry after 42 seconds"
        );
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(AequoraError::ValidationFailed(String::new()).http_status(), 400);
        assert_eq!(AequoraError::AuthError(String::new()).http_status(), 401);
        assert_eq!(AequoraError::AccessDenied(String::new()).http_status(), 403);
        assert_eq!(AequoraError::ResourceNotFound(String::new()).http_status(), 404);
        assert_eq!(AequoraError::DuplicateBooking(String::new()).http_status(), 409);
        assert_eq!(AequoraError::ServiceUnavailable(String::new()).http_status(), 409);
        assert_eq!(AequoraError::TooManyAttempts(1).http_status(), 429);
        assert_eq!(AequoraError::PaymentError(String::new()).http_status(), 502);
        assert_eq!(AequoraError::InternalError(String::new()).http_status(), 500);
    }

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(
            AequoraError::DuplicateBooking(String::new()).error_code().code,
            BOOKING_DUPLICATE.code
        );
        assert_eq!(
            AequoraError::ServiceUnavailable(String::new())
                .error_code()
                .code,
            SERVICE_UNAVAILABLE.code
        );
        assert_eq!(
            AequoraError::IllegalState(String::new()).error_code().code,
            ILLEGAL_STATUS_TRANSITION.code
        );
    }

    #[test]
    fn test_error_code_constants() {
        assert_eq!(SUCCESS.code, 0);
        assert_eq!(SUCCESS.message, "success");
        assert_eq!(PARAMETER_MISSING.code, 10000);
        assert_eq!(ACCESS_DENIED.code, 10001);
    }
}

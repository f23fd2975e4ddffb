//! Authentication models
//!
//! This file defines the JWT payload, the per-request authentication
//! context, and the authenticated principal handed to workflows.

use jsonwebtoken::errors::ErrorKind;
use serde::{Deserialize, Serialize};

use aequora_persistence::entity::sea_orm_active_enums::Role;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const ACCESS_TOKEN_HEADER: &str = "accessToken";
pub const BEARER_PREFIX: &str = "Bearer ";
pub const TOKEN_PREFIX: &str = "Token ";
pub const DEFAULT_TOKEN_EXPIRE_SECONDS: i64 = 86400;
/// Decoded HS256 secrets shorter than this are refused
pub const MIN_SECRET_KEY_BYTES: usize = 32;
/// bcrypt only considers the first 72 bytes
pub const MAX_PASSWORD_LENGTH: usize = 72;
pub const INVALID_CREDENTIALS_MESSAGE: &str = "invalid email or password";

/// JWT claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtPayload {
    /// User id
    pub sub: String,
    pub role: Role,
    pub exp: i64,
}

impl JwtPayload {
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

/// Result of token extraction, stored in request extensions by the
/// authentication middleware
#[derive(Debug, Default)]
pub struct AuthContext {
    pub user_id: Option<i32>,
    pub role: Option<Role>,
    pub token: Option<String>,
    pub jwt_error: Option<jsonwebtoken::errors::Error>,
    pub token_provided: bool,
}

impl AuthContext {
    pub fn jwt_error_string(&self) -> String {
        if let Some(e) = &self.jwt_error {
            match e.kind() {
                ErrorKind::ExpiredSignature => "token expired!".to_string(),
                ErrorKind::InvalidToken => "token invalid!".to_string(),
                _ => e.to_string(),
            }
        } else {
            String::default()
        }
    }
}

/// The authenticated caller, reloaded from the database on every request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    pub user_id: i32,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub community_id: Option<i32>,
}

impl Principal {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}

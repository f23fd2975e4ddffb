// Security context and authorization macro for API access control

use actix_web::{HttpMessage, HttpRequest, web};
use sea_orm::ActiveEnum;

use aequora_auth::{AuthContext, Principal};
use aequora_common::AequoraError;
use aequora_community::service::account;
use aequora_persistence::entity::sea_orm_active_enums::Role;

use crate::error::AppError;
use crate::model::AppState;

// Security context for API access control
#[derive(Debug, Clone)]
pub struct Secured<'a> {
    pub req: &'a HttpRequest,          // HTTP request reference
    pub data: &'a web::Data<AppState>, // Application state
    pub roles: Vec<Role>,              // Roles allowed through; empty allows any
}

impl<'a> Secured<'a> {
    pub fn builder(req: &'a HttpRequest, data: &'a web::Data<AppState>) -> SecuredBuilder<'a> {
        SecuredBuilder::new(req, data)
    }

    /// Resolve the caller and check the role.
    ///
    /// Missing or invalid tokens are 401, a role outside the allowed set is 403.
    pub async fn authorize(&self) -> Result<Principal, AppError> {
        let user_id = {
            let extensions = self.req.extensions();
            let context = extensions
                .get::<AuthContext>()
                .ok_or_else(|| AequoraError::AuthError("no auth context found".to_string()))?;

            if !context.token_provided {
                return Err(AequoraError::AuthError("no token provided".to_string()).into());
            }
            if context.jwt_error.is_some() {
                return Err(AequoraError::AuthError(context.jwt_error_string()).into());
            }

            context
                .user_id
                .ok_or_else(|| AequoraError::AuthError("token invalid!".to_string()))?
        };

        let principal = account::load_principal(self.data.db(), user_id).await?;

        if !self.roles.is_empty() && !self.roles.contains(&principal.role) {
            tracing::debug!(
                user_id = principal.user_id,
                role = ?principal.role,
                path = self.req.path(),
                "Role not allowed"
            );
            return Err(AequoraError::AccessDenied(format!(
                "{} accounts cannot use this endpoint",
                principal.role.to_value()
            ))
            .into());
        }

        Ok(principal)
    }
}

#[derive(Debug, Clone)]
pub struct SecuredBuilder<'a> {
    req: &'a HttpRequest,
    data: &'a web::Data<AppState>,
    roles: Vec<Role>,
}

impl<'a> SecuredBuilder<'a> {
    pub fn new(req: &'a HttpRequest, data: &'a web::Data<AppState>) -> Self {
        SecuredBuilder::<'a> {
            req,
            data,
            roles: Vec::new(),
        }
    }

    pub fn role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    pub fn roles(mut self, roles: &[Role]) -> Self {
        self.roles.extend_from_slice(roles);
        self
    }

    pub fn build(self) -> Secured<'a> {
        Secured::<'a> {
            req: self.req,
            data: self.data,
            roles: self.roles,
        }
    }
}

/// Authorize the request or return the error response from the handler
#[macro_export]
macro_rules! secured {
    ($secured: expr) => {
        $secured.authorize().await?
    };
}

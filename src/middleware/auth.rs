//! Bearer-token extractor and role checks for handlers.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::domain::{AppUser, Identity, Principal, Role};
use crate::error::AppError;
use crate::AppState;

pub const ADMIN_ROLES: &[Role] = &[Role::Admin, Role::SuperAdmin];
pub const SUPER_ADMIN_ONLY: &[Role] = &[Role::SuperAdmin];

/// The signed-in account, resolved from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

impl CurrentPrincipal {
    pub fn identity(&self) -> Identity {
        self.0.identity()
    }

    pub fn require_role(&self, roles: &[Role]) -> Result<Identity, AppError> {
        let identity = self.identity();
        if roles.contains(&identity.role) {
            Ok(identity)
        } else {
            Err(AppError::Forbidden(format!(
                "role {} may not perform this action",
                identity.role
            )))
        }
    }

    /// Admins may act on their own tenant only; super-admins on any.
    pub fn require_admin_scope(&self, admin_id: i64) -> Result<Identity, AppError> {
        self.require_tenant(Some(admin_id))
    }

    /// Like [`Self::require_admin_scope`] for records that may have no
    /// owning admin; those are reserved to super-admins.
    pub fn require_tenant(&self, admin_id: Option<i64>) -> Result<Identity, AppError> {
        let identity = self.require_role(ADMIN_ROLES)?;
        match identity.role {
            Role::Admin if admin_id != Some(identity.id) => Err(AppError::Forbidden(format!(
                "admin {} may not act outside their own users",
                identity.id
            ))),
            _ => Ok(identity),
        }
    }

    /// Users may touch their own account, admins the users they own.
    pub fn require_user_scope(&self, user: &AppUser) -> Result<Identity, AppError> {
        let identity = self.identity();
        match identity.role {
            Role::User => self.require_self_or_admin(user.id),
            Role::Admin => self.require_tenant(user.admin_id),
            Role::SuperAdmin => Ok(identity),
        }
    }

    /// Loads the target user and applies [`Self::require_user_scope`]. Users
    /// are turned away from other accounts before the lookup.
    pub async fn authorize_user(
        &self,
        state: &AppState,
        user_id: i64,
    ) -> Result<AppUser, AppError> {
        self.require_self_or_admin(user_id)?;
        let user = state.store.find_user(user_id).await?;
        self.require_user_scope(&user)?;
        Ok(user)
    }

    /// Users may only touch their own records; admins and super-admins any.
    pub fn require_self_or_admin(&self, user_id: i64) -> Result<Identity, AppError> {
        let identity = self.identity();
        if identity.role == Role::User && identity.id != user_id {
            return Err(AppError::Forbidden(
                "users may only access their own account".to_string(),
            ));
        }
        Ok(identity)
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("malformed authorization header".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let principal = state.auth.authenticate(token).await?;
        Ok(CurrentPrincipal(principal))
    }
}

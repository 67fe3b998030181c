//! Role-gated authorization
//!
//! [`auth_middleware`](crate::middleware::auth_middleware) establishes who the
//! caller is; this module decides whether their stored role permits the
//! route. The role is re-read from storage on every request so a demotion
//! takes effect immediately, regardless of what the token says.

use std::future::Future;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use campus_common::{Permission, Role};
use tracing::{error, warn};
use uuid::Uuid;

use crate::{error::ApiError, middleware::AuthUser, repositories::UserRepository};

/// Source of truth for a user's role
pub trait RoleLookup {
    /// `Ok(None)` when the user has no record or no recognised role
    fn find_role(&self, user_id: Uuid) -> impl Future<Output = anyhow::Result<Option<Role>>> + Send;
}

/// An authorized caller, inserted into request extensions by the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub role: Option<Role>,
}

impl Caller {
    pub fn has(&self, permission: Permission) -> bool {
        permission.allows(self.role)
    }
}

/// Check `permission` for `user` against the stored role
pub async fn authorize<L>(
    lookup: &L,
    user: Option<&AuthUser>,
    permission: Permission,
) -> Result<Caller, ApiError>
where
    L: RoleLookup + Sync,
{
    let user = user.ok_or(ApiError::Unauthenticated)?;

    let role = lookup.find_role(user.id).await.map_err(|e| {
        error!("Failed to fetch role for {}: {}", user.id, e);
        ApiError::LookupFailure(e.to_string())
    })?;

    if !permission.allows(role) {
        warn!(
            user_id = %user.id,
            role = ?role,
            %permission,
            "Permission denied"
        );
        return Err(ApiError::forbidden(permission.denial_message(), role));
    }

    Ok(Caller { id: user.id, role })
}

/// State for [`require_permission`]
#[derive(Clone)]
pub struct Guard {
    users: UserRepository,
    permission: Permission,
}

impl Guard {
    pub fn new(users: UserRepository, permission: Permission) -> Self {
        Self { users, permission }
    }
}

/// Route layer rejecting callers whose role lacks the guard's permission
///
/// Must run after `auth_middleware`.
pub async fn require_permission(
    State(guard): State<Guard>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = req.extensions().get::<AuthUser>().cloned();
    let caller = authorize(&guard.users, user.as_ref(), guard.permission).await?;

    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Caller>().copied().ok_or_else(|| {
            error!("Caller requested on a route without a permission guard");
            ApiError::InternalServerError
        })
    }
}

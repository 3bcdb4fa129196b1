//! Authentication and authorization middleware
//!
//! `auth_middleware` resolves the bearer token into a full user record and
//! stashes it in the request extensions. Role restriction layers on top of
//! that through the `require_*` guards; the owner-or-admin rule shared by
//! every resource mutation path lives in [`ensure_owner_or_admin`].

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::user::{Role, User};
use crate::state::AppState;

/// Roles allowed on admin-only route groups
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Roles allowed to manage bootcamps and courses
pub const PUBLISHER_OR_ADMIN: &[Role] = &[Role::Publisher, Role::Admin];

/// Roles allowed to write reviews
pub const USER_OR_ADMIN: &[Role] = &[Role::User, Role::Admin];

/// Authentication middleware
///
/// Extracts the bearer token, verifies it, loads the user it names, and
/// inserts the user into the request extensions. Every failure mode is the
/// same `Unauthorized` response.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let user_id = state.tokens.verify(token)?;

    // A token for a since-deleted user is as good as no token.
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Grant access when the role is among the allowed set
pub fn authorize(role: Role, allowed: &[Role]) -> bool {
    allowed.contains(&role)
}

/// Admin-only guard for route groups
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    require_roles(ADMIN_ONLY, req, next).await
}

/// Publisher-or-admin guard for route groups
pub async fn require_publisher_or_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    require_roles(PUBLISHER_OR_ADMIN, req, next).await
}

/// User-or-admin guard for route groups
pub async fn require_user_or_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    require_roles(USER_OR_ADMIN, req, next).await
}

/// Middleware guard over [`authorize`] for role-restricted route groups
///
/// Must run after `auth_middleware`; a request without a resolved user is
/// treated as unauthenticated.
async fn require_roles(
    allowed: &'static [Role],
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = req
        .extensions()
        .get::<User>()
        .ok_or(ApiError::Unauthorized)?;

    if !authorize(user.role, allowed) {
        return Err(ApiError::Forbidden(format!(
            "User role '{}' is not authorized to access this route",
            user.role
        )));
    }

    Ok(next.run(req).await)
}

/// Owner-or-admin rule shared by resource mutation paths
///
/// The ownership bypass is specific to the administrative role; no other
/// role may touch a resource it does not own.
pub fn owner_or_admin(user: &User, owner_id: Uuid) -> bool {
    user.id == owner_id || user.role == Role::Admin
}

/// Enforce [`owner_or_admin`], naming the resource in the refusal
pub fn ensure_owner_or_admin(user: &User, owner_id: Uuid, resource: &str) -> ApiResult<()> {
    if owner_or_admin(user, owner_id) {
        return Ok(());
    }

    Err(ApiError::Forbidden(format!(
        "User {} is not authorized to modify this {}",
        user.id, resource
    )))
}

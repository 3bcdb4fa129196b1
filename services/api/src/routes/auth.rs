//! Authentication routes
//!
//! Registration, login, the current-user lookup, and the two-step
//! forgot/reset password flow.

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Serialize;
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};
use crate::middleware::auth_middleware;
use crate::models::DataResponse;
use crate::models::user::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest, User, UserResponse,
};
use crate::repositories::UserRepository;
use crate::state::AppState;
use crate::validation::validate_password;

/// Response carrying a fresh session token
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
}

/// Create the router for the authentication routes
pub fn router(state: AppState) -> Router {
    let protected = Router::new().route("/me", get(get_me)).route_layer(
        middleware::from_fn_with_state(state.clone(), auth_middleware),
    );

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgotpassword", post(forgot_password))
        .route("/resetpassword/:resettoken", put(reset_password))
        .merge(protected)
        .with_state(state)
}

/// Register a new user and hand back a session token
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let role = payload.validate().map_err(ApiError::Validation)?;

    let user = state
        .users
        .create(&payload.name, &payload.email, &payload.password, role)
        .await?;
    info!("Registered user {} as {}", user.email, user.role);

    let token = state.tokens.issue(user.id)?;
    Ok(Json(TokenResponse {
        success: true,
        token,
    }))
}

/// Log a user in against their stored credentials
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate().map_err(ApiError::Validation)?;

    let user = state
        .users
        .find_by_email(&payload.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !UserRepository::verify_password(&payload.password, &user.password_hash)? {
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.tokens.issue(user.id)?;
    Ok(Json(TokenResponse {
        success: true,
        token,
    }))
}

/// Return the authenticated user
pub async fn get_me(Extension(user): Extension<User>) -> ApiResult<impl IntoResponse> {
    Ok(Json(DataResponse::new(UserResponse::from(user))))
}

/// Start the forgot-password flow
///
/// Issues a reset token and mails its plaintext to the user. A delivery
/// failure rolls the pending reset back so a dead token never lingers.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .users
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("There is no user with that email".to_string()))?;

    let plaintext = state.users.issue_reset_token(user.id).await?;

    let body = format!(
        "You are receiving this email because a password reset was requested \
         for your account. Make a PUT request to: /api/v1/auth/resetpassword/{plaintext}"
    );
    if let Err(e) = state.mailer.send(&user.email, "Password reset token", &body) {
        error!("Failed to send password reset email: {}", e);
        state.users.clear_reset_token(user.id).await?;
        return Err(ApiError::Upstream("Email could not be sent".to_string()));
    }

    Ok(Json(DataResponse::new("Email sent".to_string())))
}

/// Finish the forgot-password flow with the mailed token
pub async fn reset_password(
    State(state): State<AppState>,
    Path(resettoken): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_password(&payload.password).map_err(ApiError::Validation)?;

    let user = state
        .users
        .consume_reset_token(&resettoken, &payload.password)
        .await?;

    // A successful reset logs the user straight in.
    let token = state.tokens.issue(user.id)?;
    Ok(Json(TokenResponse {
        success: true,
        token,
    }))
}

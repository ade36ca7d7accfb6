use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse,
            RegisterRequest, ResetPasswordRequest, ResetTokenResponse, UserProfile,
        },
        extractors::{AuthUser, Valid},
        services,
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgotpassword", post(forgot_password))
        .route("/resetpassword", put(reset_password))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/user", get(get_user))
}

// --- handlers ---

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Valid(payload): Valid<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let user = services::register(state.users.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Valid(payload): Valid<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (token, user) = services::login(state.users.as_ref(), &state.keys, payload).await?;
    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Valid(payload): Valid<ForgotPasswordRequest>,
) -> Result<Json<ResetTokenResponse>, AppError> {
    let reset_token = services::forgot_password(state.users.as_ref(), &state.keys, payload).await?;
    Ok(Json(ResetTokenResponse { reset_token }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Valid(payload): Valid<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    services::reset_password(state.users.as_ref(), &state.keys, payload).await?;
    Ok(Json(MessageResponse {
        message: "Password reset successful",
    }))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    let user = services::get_user(state.users.as_ref(), user_id).await?;
    Ok(Json(user.into()))
}

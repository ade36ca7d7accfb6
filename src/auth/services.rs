use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        claims::TokenKind,
        dto::{ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::UserStore,
        repo_types::{NewUser, User},
    },
    error::AppError,
};

pub async fn register(store: &dyn UserStore, req: RegisterRequest) -> Result<User, AppError> {
    if store.find_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(AppError::Conflict);
    }

    let password_hash = hash_password(&req.password)?;

    // A concurrent registration can still win the race; the store reports that as Conflict.
    let user = store
        .create(NewUser {
            username: req.username,
            email: req.email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Unknown email and wrong password both end in `InvalidCredentials`.
pub async fn login(
    store: &dyn UserStore,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<(String, User), AppError> {
    let Some(user) = store.find_by_email(&req.email).await? else {
        warn!(email = %req.email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.sign_session(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok((token, user))
}

/// Issues a reset token and hands it straight back; there is no mail delivery.
pub async fn forgot_password(
    store: &dyn UserStore,
    keys: &JwtKeys,
    req: ForgotPasswordRequest,
) -> Result<String, AppError> {
    let user = store
        .find_by_email(&req.email)
        .await?
        .ok_or(AppError::NotFound)?;

    let token = keys.sign_reset(user.id)?;
    info!(user_id = %user.id, "reset token issued");
    Ok(token)
}

/// Tokens are not single-use: the same token works until it expires.
pub async fn reset_password(
    store: &dyn UserStore,
    keys: &JwtKeys,
    req: ResetPasswordRequest,
) -> Result<(), AppError> {
    let claims = keys.verify_kind(&req.token, TokenKind::Reset)?;

    let mut user = store
        .find_by_id(claims.sub)
        .await?
        .ok_or(AppError::NotFound)?;

    user.password_hash = hash_password(&req.new_password)?;
    store.save(&user).await?;

    info!(user_id = %user.id, "password reset");
    Ok(())
}

pub async fn get_user(store: &dyn UserStore, user_id: Uuid) -> Result<User, AppError> {
    store.find_by_id(user_id).await?.ok_or(AppError::NotFound)
}

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::User;

// --- request bodies as received (see validation.rs) ---

/// Scalars of any JSON type are read as text so the field rules judge them;
/// `null`, arrays and objects count as absent.
fn loose_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterBody {
    #[serde(default, deserialize_with = "loose_string")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginBody {
    #[serde(default, deserialize_with = "loose_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForgotPasswordBody {
    #[serde(default, deserialize_with = "loose_string")]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordBody {
    #[serde(default, deserialize_with = "loose_string")]
    pub token: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub new_password: Option<String>,
}

// --- validated requests ---

/// Request body for user registration.
#[derive(Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

// --- responses ---

/// Public part of the user returned alongside a session token.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Full profile: everything except the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetTokenResponse {
    pub reset_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
        }
    }
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            created_at: u.created_at,
        }
    }
}

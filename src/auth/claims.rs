use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a token may be used for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Bearer credential for authenticated routes.
    Session,
    /// One password reset.
    Reset,
}

/// JWT payload shared by session and reset tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,       // user ID
    pub iat: i64,        // issued at (unix timestamp)
    pub exp: i64,        // expires at (unix timestamp)
    pub iss: String,     // issuer
    pub aud: String,     // audience
    pub kind: TokenKind, // session or reset
}

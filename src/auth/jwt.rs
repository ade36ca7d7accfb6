use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::{Claims, TokenKind};
use crate::{config::JwtConfig, state::AppState};

#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature checks out but `exp` has passed.
    #[error("token expired")]
    Expired,
    /// Bad signature, malformed, foreign issuer/audience or wrong kind.
    #[error("token invalid")]
    Invalid,
    #[error("token lifetime out of range")]
    Lifetime,
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Signing and verification keys plus the claims every token carries.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    pub session_ttl: Duration,
    pub reset_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            session_ttl: minutes(cfg.ttl_minutes),
            reset_ttl: minutes(cfg.reset_ttl_minutes),
        }
    }

    pub fn issue(&self, user_id: Uuid, kind: TokenKind, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(user_id, kind, ttl, OffsetDateTime::now_utc())
    }

    pub fn issue_at(
        &self,
        user_id: Uuid,
        kind: TokenKind,
        ttl: Duration,
        now: OffsetDateTime,
    ) -> Result<String, TokenError> {
        let exp = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(TimeDuration::seconds(secs)))
            .ok_or(TokenError::Lifetime)?;
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_session(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue(user_id, TokenKind::Session, self.session_ttl)
    }

    pub fn sign_reset(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue(user_id, TokenKind::Reset, self.reset_ttl)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Signature, issuer and audience are checked by `jsonwebtoken`; expiry is
    /// checked here so that `exp == now` already counts as expired.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            TokenError::Invalid
        })?;

        if data.claims.exp <= now.unix_timestamp() {
            return Err(TokenError::Expired);
        }
        debug!(user_id = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    /// Like [`verify`](Self::verify) but also requires the token kind.
    pub fn verify_kind(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.kind != kind {
            debug!(expected = ?kind, got = ?claims.kind, "jwt kind mismatch");
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }
}

fn minutes(m: i64) -> Duration {
    Duration::from_secs((m.max(0) as u64).saturating_mul(60))
}

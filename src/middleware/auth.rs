// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication middleware.
//!
//! There is a single owner account. A successful password login issues an
//! HS256 JWT, carried either in the session cookie or as a Bearer token.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "running_log_session";

/// Subject of every session token.
pub const SESSION_SUBJECT: &str = "owner";

/// Session lifetime (30 days).
pub const SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Middleware that requires a valid session.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(SESSION_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(t) => t.to_string(),
            None => return Err(AppError::Unauthorized),
        }
    };

    if !verify_session_token(&token, &state.config.session_signing_key) {
        tracing::debug!("Rejected request with invalid session token");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Whether `token` is an unexpired session token signed with `signing_key`.
pub fn verify_session_token(token: &str, signing_key: &[u8]) -> bool {
    let key = DecodingKey::from_secret(signing_key);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims.sub == SESSION_SUBJECT)
        .unwrap_or(false)
}

/// Create a JWT for the owner's session.
pub fn create_session_token(signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    let claims = Claims {
        sub: SESSION_SUBJECT.to_string(),
        iat: now as usize,
        exp: (now + SESSION_TTL_SECS) as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test_session_key_32_bytes_minimum!!";

    #[test]
    fn test_session_token_roundtrip() {
        let token = create_session_token(KEY).unwrap();
        assert!(verify_session_token(&token, KEY));
    }

    #[test]
    fn test_session_token_wrong_key() {
        let token = create_session_token(KEY).unwrap();
        assert!(!verify_session_token(&token, b"another_key_that_is_32_bytes_long!!"));
        assert!(!verify_session_token("not-a-jwt", KEY));
    }
}

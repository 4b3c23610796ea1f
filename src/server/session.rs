/// Session tokens and principal extraction.
///
/// Sign-in happens at an external identity provider; this server only
/// verifies the resulting session token. Tokens are HS256 JWTs whose
/// subject is the verified email address, sent as
/// `Authorization: Bearer <token>`.
///
/// Extraction never rejects a request. A missing, expired, or forged
/// token simply yields an anonymous [`Principal`], and the access gate
/// decides what that caller may do.
use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AppState;
use crate::access::Principal;
use crate::error::{AdminError, Result};

/// JWT claims for session tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Verified email address.
    pub sub: String,
    /// Expiration time (Unix timestamp).
    pub exp: usize,
    /// Issued at (Unix timestamp).
    pub iat: usize,
}

fn unix_seconds(ts: i64) -> Result<usize> {
    ts.try_into()
        .map_err(|_| AdminError::Token(format!("timestamp {ts} out of range")))
}

/// Issue a session token for `email`, valid for `ttl`. The lifetime must
/// be positive.
pub fn issue_token(email: &str, secret: &str, ttl: Duration) -> Result<String> {
    if ttl <= Duration::zero() {
        return Err(AdminError::Token("token lifetime must be positive".into()));
    }

    let now = Utc::now();
    let expires = now
        .checked_add_signed(ttl)
        .ok_or_else(|| AdminError::Token("token lifetime too large".into()))?;
    let claims = Claims {
        sub: email.to_string(),
        exp: unix_seconds(expires.timestamp())?,
        iat: unix_seconds(now.timestamp())?,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AdminError::Token(format!("JWT encoding failed: {e}")))
}

/// Verify a token and return the email it was issued for.
pub fn verify_token(token: &str, secret: &str) -> Result<String> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AdminError::Token(format!("Invalid token: {e}")))?;

    Ok(data.claims.sub)
}

/// Resolve the caller from request headers.
pub fn principal_from_parts(parts: &Parts, secret: &str) -> Principal {
    let Some(header) = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return Principal::anonymous();
    };

    let Some(token) = header.strip_prefix("Bearer ") else {
        debug!("Ignoring non-bearer Authorization header");
        return Principal::anonymous();
    };

    match verify_token(token.trim(), secret) {
        Ok(email) => Principal::with_email(email),
        Err(e) => {
            debug!(error = %e, "Treating request as anonymous");
            Principal::anonymous()
        }
    }
}

impl FromRequestParts<Arc<AppState>> for Principal {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        Ok(principal_from_parts(parts, &state.session_secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    const SECRET: &str = "test-secret";

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/list");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_token_roundtrip() {
        let token = issue_token("owner@example.com", SECRET, Duration::hours(1)).unwrap();
        assert_eq!(verify_token(&token, SECRET).unwrap(), "owner@example.com");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token("owner@example.com", SECRET, Duration::hours(1)).unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "owner@example.com".into(),
            exp: now - 7200,
            iat: now - 10800,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_non_positive_lifetime_rejected() {
        for ttl in [Duration::zero(), Duration::hours(-1), Duration::hours(-1_000_000)] {
            let err = issue_token("owner@example.com", SECRET, ttl).unwrap_err();
            assert!(matches!(err, AdminError::Token(_)));
        }
    }

    #[test]
    fn test_oversized_lifetime_rejected() {
        assert!(issue_token("owner@example.com", SECRET, Duration::MAX).is_err());
    }

    #[test]
    fn test_principal_from_bearer() {
        let token = issue_token("owner@example.com", SECRET, Duration::hours(1)).unwrap();
        let parts = parts_with(Some(&format!("Bearer {token}")));
        assert_eq!(
            principal_from_parts(&parts, SECRET),
            Principal::with_email("owner@example.com")
        );
    }

    #[test]
    fn test_bad_headers_are_anonymous() {
        for header in [None, Some("Basic abc"), Some("Bearer not-a-jwt")] {
            let parts = parts_with(header);
            assert_eq!(principal_from_parts(&parts, SECRET), Principal::anonymous());
        }
    }
}

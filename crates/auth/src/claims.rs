use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cafeteria_core::UserId;

use crate::Role;

/// JWT claims model (transport-agnostic).
///
/// Timestamps travel as Unix seconds, as registered JWT claims do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the username.
    pub sub: String,

    /// Numeric user id.
    pub uid: UserId,

    /// Roles held at the time the token was issued.
    #[serde(default)]
    pub roles: Vec<Role>,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub iat: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub exp: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("could not encode token: {0}")]
    Encoding(String),
}

/// Deterministically validate JWT claims against `now`.
///
/// Signature verification happens before this, in [`crate::JwtValidator`].
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn claims(now: DateTime<Utc>, ttl: TimeDelta) -> JwtClaims {
        JwtClaims {
            sub: "admin".into(),
            uid: UserId::new(1),
            roles: vec![Role::admin()],
            iat: now,
            exp: now + ttl,
        }
    }

    #[test]
    fn accepts_claims_inside_window() {
        let now = Utc::now();
        assert_eq!(validate_claims(&claims(now, TimeDelta::hours(1)), now), Ok(()));
    }

    #[test]
    fn rejects_expired_and_future_claims() {
        let now = Utc::now();
        let c = claims(now, TimeDelta::hours(1));
        assert_eq!(
            validate_claims(&c, now + TimeDelta::hours(2)),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&c, now - TimeDelta::minutes(1)),
            Err(TokenValidationError::NotYetValid)
        );
        assert_eq!(
            validate_claims(&claims(now, TimeDelta::zero()), now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}

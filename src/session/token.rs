//! Session token decoding.
//!
//! Tokens are JWTs issued by `POST /api/token`. The client never verifies the
//! signature; it only base64url-decodes the claims segment to read `iat` and
//! `exp`. A token without `exp` never expires.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token must have three dot-separated segments")]
    Malformed,
    #[error("claims segment is not valid base64url: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("claims segment is not a JSON object: {0}")]
    Claims(#[from] serde_json::Error),
}

/// Registered claims the client cares about.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TokenClaims {
    /// Issued-at, Unix seconds.
    #[serde(default)]
    pub iat: Option<i64>,
    /// Expiry, Unix seconds.
    #[serde(default)]
    pub exp: Option<i64>,
    /// Subject user id, as minted by the server.
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

/// A decoded session token. Holds the raw string that goes on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionToken {
    raw: String,
    claims: TokenClaims,
}

impl SessionToken {
    /// Decode the claims of `raw`. Fails on anything that is not a
    /// three-segment token with a JSON object payload.
    pub fn decode(raw: &str) -> Result<Self, TokenError> {
        let raw = raw.trim();
        let mut segments = raw.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed);
        };
        if payload.is_empty() {
            return Err(TokenError::Malformed);
        }

        // Some issuers pad the segment anyway.
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        let claims: TokenClaims = serde_json::from_slice(&bytes)?;

        Ok(Self {
            raw: raw.to_string(),
            claims,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.claims.iat.and_then(|s| DateTime::from_timestamp(s, 0))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.claims.exp.and_then(|s| DateTime::from_timestamp(s, 0))
    }

    /// Whether the embedded expiry is at or before `now` (Unix seconds).
    pub fn is_expired_at(&self, now: i64) -> bool {
        matches!(self.claims.exp, Some(exp) if exp <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }
}

//! Client error taxonomy.
//!
//! Every remote call resolves to a [`ClientError`]. The variants follow how a
//! failure propagates through the console:
//!
//! - `Auth` stays inside the login flow and is never broadcast.
//! - `Permission` (HTTP 401 from any call) always escalates to logout.
//! - `Validation` and `Transport` are flattened into one generic message by
//!   the notification center; per-field detail is dropped.

use serde_json::Value;
use thiserror::Error;

/// HTTP status the server uses to deny a request carrying a missing,
/// expired, or revoked token.
pub const UNAUTHORIZED: u16 = 401;

/// Status + body of a failed call, as seen by the notification center.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FailurePayload {
    /// HTTP status, `None` when the request never got a response.
    pub status: Option<u16>,
    /// Parsed JSON body, `Value::Null` when absent or not JSON.
    pub body: Value,
}

impl FailurePayload {
    pub fn new(status: Option<u16>, body: Value) -> Self {
        Self { status, body }
    }

    /// Whether this payload carries the authorization-denied status.
    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(UNAUTHORIZED)
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// Bad credentials or an undecodable token returned by the login endpoint.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The server rejected the payload with a list of field errors.
    #[error("validation failed with {} field error(s)", .errors.len())]
    Validation { status: u16, errors: Vec<Value> },

    /// Network failure, server fault, or an unexpected response shape.
    #[error("request failed: {message}")]
    Transport {
        status: Option<u16>,
        body: Value,
        message: String,
    },

    /// Authorization denied (HTTP 401).
    #[error("authorization denied")]
    Permission,

    /// The token slot could not be written.
    #[error("token storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ClientError {
    /// Build the error for a non-success HTTP response.
    ///
    /// 401 maps to `Permission`; a JSON array body maps to `Validation`;
    /// anything else is a `Transport` failure carrying the body.
    pub fn from_response(status: u16, body: Value) -> Self {
        if status == UNAUTHORIZED {
            return Self::Permission;
        }
        match body {
            Value::Array(errors) => Self::Validation { status, errors },
            body => Self::Transport {
                message: format!("server responded with status {status}"),
                status: Some(status),
                body,
            },
        }
    }

    /// Wrap a network-level failure that produced no response.
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport {
            status: None,
            body: Value::Null,
            message: err.to_string(),
        }
    }

    /// The payload handed to error handlers.
    pub fn payload(&self) -> FailurePayload {
        match self {
            Self::Auth(msg) => FailurePayload::new(None, serde_json::json!({ "error": msg })),
            Self::Validation { status, errors } => {
                FailurePayload::new(Some(*status), Value::Array(errors.clone()))
            }
            Self::Transport { status, body, .. } => FailurePayload::new(*status, body.clone()),
            Self::Permission => FailurePayload::new(Some(UNAUTHORIZED), Value::Null),
            Self::Storage(_) => FailurePayload::default(),
        }
    }

    pub fn is_permission(&self) -> bool {
        matches!(self, Self::Permission)
    }
}

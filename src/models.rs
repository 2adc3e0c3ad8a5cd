//! Wire types for the console API.

use serde::{Deserialize, Serialize};

// ── Auth ─────────────────────────────────────────────────────────

/// Body of `POST /api/token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

// ── Users ────────────────────────────────────────────────────────

/// A console user.
///
/// `password` is write-only: it is sent on create, never read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// Body of `POST /api/users`.
#[derive(Debug, Clone, Serialize)]
pub struct UserDraft {
    pub email: String,
    pub password: String,
}

/// Body of `POST /api/users/:id`.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordChange {
    pub password: String,
}

// ── Records ──────────────────────────────────────────────────────

/// Snapshot of a user embedded in a record at write time.
///
/// Denormalized: it does not follow later changes to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: String,
    pub email: String,
}

impl From<&User> for Owner {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerProtocol {
    #[default]
    Http,
    Https,
}

impl std::str::FromStr for HandlerProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(format!("handler protocol must be http or https, got '{other}'")),
        }
    }
}

impl std::fmt::Display for HandlerProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Http => "http",
            Self::Https => "https",
        })
    }
}

/// A proxy routing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub fqdn: String,
    pub handler_host: String,
    pub handler_port: u16,
    pub handler_protocol: HandlerProtocol,
    #[serde(default)]
    pub owner: Owner,
    /// Client addresses the proxy has routed for this record.
    #[serde(default)]
    pub clients: Vec<String>,
    #[serde(default)]
    pub blacklist: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// Body of `POST /api/records`. The server assigns `id` and `owner`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordDraft {
    pub fqdn: String,
    pub handler_host: String,
    pub handler_port: u16,
    pub handler_protocol: HandlerProtocol,
}

// ── Info ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerInfo {
    pub enabled: bool,
    pub listener: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyInfo {
    pub ssl: ListenerInfo,
    pub http: ListenerInfo,
}

/// Response of `GET /api/info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub version: String,
    #[serde(default)]
    pub proxy: ProxyInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_password_is_never_read_back() {
        let user: User = serde_json::from_value(json!({
            "id": "u-1",
            "email": "a@x",
            "password": "leaked",
            "hash": "$2a$12$..."
        }))
        .unwrap();
        assert!(user.password.is_none());

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
    }

    #[test]
    fn record_deserializes_server_shape() {
        let record: Record = serde_json::from_value(json!({
            "id": "r-1",
            "owner": {"id": "u-1", "email": "a@x"},
            "fqdn": "c2.example.com",
            "handler_host": "10.0.0.5",
            "handler_port": 8443,
            "handler_protocol": "https",
            "updated_at": 1700000000,
            "created_at": 1690000000,
            "clients": ["203.0.113.4"],
            "blacklist": false
        }))
        .unwrap();
        assert_eq!(record.owner.email, "a@x");
        assert_eq!(record.handler_protocol, HandlerProtocol::Https);
        assert_eq!(record.clients, vec!["203.0.113.4".to_string()]);
    }

    #[test]
    fn handler_protocol_parses_case_insensitively() {
        assert_eq!("HTTPS".parse::<HandlerProtocol>().unwrap(), HandlerProtocol::Https);
        assert!("ftp".parse::<HandlerProtocol>().is_err());
        assert_eq!(HandlerProtocol::Http.to_string(), "http");
    }

    #[test]
    fn owner_snapshot_copies_identity_and_email() {
        let user = User {
            id: "u-2".into(),
            email: "b@x".into(),
            password: Some("secret".into()),
            created_at: 0,
            updated_at: 0,
        };
        assert_eq!(
            Owner::from(&user),
            Owner {
                id: "u-2".into(),
                email: "b@x".into()
            }
        );
    }
}

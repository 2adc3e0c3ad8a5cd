//! Token lifecycle, request/response interception, and navigation gating.
//!
//! Expiry is evaluated only when asked for: at `is_authenticated()` call
//! sites, in the navigation guard, and when a request is intercepted. There
//! is no background timer; an expired token simply stops counting.

use super::store::TokenStore;
use super::token::SessionToken;
use crate::error::{ClientError, UNAUTHORIZED};
use crate::models::{Credentials, TokenResponse};
use crate::navigation::{NavigationDecision, Navigator, Route};
use std::sync::Arc;

/// Path of the login endpoint, relative to the server URL.
pub const TOKEN_ENDPOINT: &str = "/api/token";

/// Message used when the login endpoint rejects credentials without a
/// usable error string.
const REJECTED_CREDENTIALS: &str = "invalid username or password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

pub struct SessionGuard {
    store: Arc<dyn TokenStore>,
    base_url: String,
    http: reqwest::Client,
}

impl SessionGuard {
    pub fn new(store: Arc<dyn TokenStore>, base_url: String, http: reqwest::Client) -> Self {
        Self {
            store,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    // ── Authentication state ────────────────────────────────────

    /// The stored token, if it decodes and has not expired.
    pub fn current_token(&self) -> Option<SessionToken> {
        let raw = self.store.load()?;
        match SessionToken::decode(&raw) {
            Ok(token) if token.is_expired() => {
                tracing::debug!("stored session token has expired");
                None
            }
            Ok(token) => Some(token),
            Err(e) => {
                tracing::debug!("stored session token is unreadable: {e}");
                None
            }
        }
    }

    /// Whether a readable, unexpired token is stored. Never fails.
    pub fn is_authenticated(&self) -> bool {
        self.current_token().is_some()
    }

    pub fn state(&self) -> SessionState {
        if self.is_authenticated() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    // ── Login / logout ──────────────────────────────────────────

    /// Exchange credentials for a token and store it.
    ///
    /// Any failure leaves the stored token exactly as it was. The login call
    /// does not pass through the response interceptor, so a rejection never
    /// logs out an existing session.
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionToken, ClientError> {
        let url = format!("{}{}", self.base_url, TOKEN_ENDPOINT);
        let resp = self
            .http
            .post(&url)
            .json(credentials)
            .send()
            .await
            .map_err(ClientError::transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body: serde_json::Value = resp.json().await.unwrap_or_default();
            let reason = body
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or(REJECTED_CREDENTIALS)
                .to_string();
            tracing::info!("login rejected ({status}): {reason}");
            return Err(ClientError::Auth(reason));
        }

        let data: TokenResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::Auth(format!("malformed token response: {e}")))?;
        let token = SessionToken::decode(&data.token)
            .map_err(|e| ClientError::Auth(format!("unreadable token: {e}")))?;
        if token.is_expired() {
            return Err(ClientError::Auth("issued token has already expired".into()));
        }

        self.store.save(token.as_str())?;
        tracing::info!("logged in as {}", credentials.email);
        Ok(token)
    }

    /// Drop the stored token. Idempotent.
    pub fn logout(&self) {
        self.store.clear();
        tracing::debug!("session cleared");
    }

    // ── Interception ────────────────────────────────────────────

    /// Attach the bearer credential when a live token is stored.
    pub fn request_interceptor(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.current_token() {
            Some(token) => request.bearer_auth(token.as_str()),
            None => request,
        }
    }

    /// React to a response status. On 401, log out and send the user to
    /// the login screen. Returns whether the escalation happened.
    pub fn response_interceptor(&self, status: u16, navigator: &dyn Navigator) -> bool {
        if status != UNAUTHORIZED {
            return false;
        }
        tracing::warn!("authorization denied by server; ending session");
        self.logout();
        navigator.redirect(Route::Login);
        true
    }

    /// Gate a route transition.
    pub fn navigation_guard(&self, target: &Route) -> NavigationDecision {
        if target.requires_auth() && !self.is_authenticated() {
            NavigationDecision::Redirect(Route::Login)
        } else {
            NavigationDecision::Proceed
        }
    }
}

//! Authenticated JSON-over-HTTP transport.
//!
//! Every request goes through the session guard's interceptors: the bearer
//! credential is attached on the way out, and a 401 on the way back ends the
//! session and redirects to login, regardless of which call triggered it.

use crate::error::ClientError;
use crate::models::ServerInfo;
use crate::navigation::Navigator;
use crate::session::SessionGuard;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

pub const INFO_ENDPOINT: &str = "/api/info";

pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    guard: Arc<SessionGuard>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        http: reqwest::Client,
        guard: Arc<SessionGuard>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            guard,
            navigator,
        }
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn guard(&self) -> &Arc<SessionGuard> {
        &self.guard
    }

    // ── Verbs ────────────────────────────────────────────────────

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ClientError> {
        let request = self.http.get(self.url(path)).query(query);
        let resp = self.execute(request).await?;
        decode(resp).await
    }

    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.request(method, self.url(path)).json(body);
        let resp = self.execute(request).await?;
        decode(resp).await
    }

    /// Send a body and ignore whatever the server answers with on success.
    pub async fn send_discarding<B>(&self, method: Method, path: &str, body: &B) -> Result<(), ClientError>
    where
        B: Serialize + ?Sized,
    {
        let request = self.http.request(method, self.url(path)).json(body);
        self.execute(request).await.map(|_| ())
    }

    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let request = self.http.delete(self.url(path));
        self.execute(request).await.map(|_| ())
    }

    /// Informational endpoint: server version and proxy listeners.
    pub async fn info(&self) -> Result<ServerInfo, ClientError> {
        self.get_json(INFO_ENDPOINT, &[]).await
    }

    // ── Interception ─────────────────────────────────────────────

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let request = self.guard.request_interceptor(request);
        let resp = request.send().await.map_err(|e| {
            tracing::warn!("request failed before a response arrived: {e}");
            ClientError::transport(e)
        })?;

        let status = resp.status();
        if self.guard.response_interceptor(status.as_u16(), self.navigator.as_ref()) {
            return Err(ClientError::Permission);
        }
        if !status.is_success() {
            let bytes = resp.bytes().await.unwrap_or_default();
            let body = serde_json::from_slice::<Value>(&bytes).unwrap_or(Value::Null);
            tracing::debug!("server answered {status} ({} byte body)", bytes.len());
            return Err(ClientError::from_response(status.as_u16(), body));
        }
        Ok(resp)
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status().as_u16();
    let bytes = resp.bytes().await.map_err(ClientError::transport)?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Transport {
        status: Some(status),
        body: Value::Null,
        message: format!("unexpected response body: {e}"),
    })
}

//! Application root.
//!
//! [`Console`] wires the session guard, router, notification center and
//! both resource clients together, and exposes the operations a front end
//! drives: login, listing, per-entity screens, and creation.

pub mod screens;

pub use screens::{RecordScreen, UserScreen};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::models::{Credentials, Record, RecordDraft, ServerInfo, User, UserDraft};
use crate::navigation::{Navigator, Route, Router};
use crate::notify::NotificationCenter;
use crate::resource::ResourceClient;
use crate::session::{FileTokenStore, SessionGuard, TokenStore};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shown on the login screen for any failed login.
pub const LOGIN_FAILED_MESSAGE: &str = "Invalid username or password";

pub struct Console {
    config: ClientConfig,
    guard: Arc<SessionGuard>,
    router: Arc<Router>,
    notifications: Arc<NotificationCenter>,
    api: Arc<ApiClient>,
    records: ResourceClient<Record>,
    users: ResourceClient<User>,
    info: Mutex<Option<ServerInfo>>,
    info_requested: AtomicBool,
}

impl Console {
    /// Build a console whose token slot is the file named by `config`.
    pub fn open(config: ClientConfig) -> anyhow::Result<Self> {
        let path = config.resolved_token_path()?;
        tracing::debug!("token slot at {}", path.display());
        Self::new(config, Arc::new(FileTokenStore::new(path)))
    }

    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> anyhow::Result<Self> {
        let http = config.http_client()?;
        let guard = Arc::new(SessionGuard::new(store, config.server_url.clone(), http.clone()));
        let router = Arc::new(Router::new(Arc::clone(&guard)));
        let navigator: Arc<dyn Navigator> = router.clone();
        let notifications = Arc::new(NotificationCenter::with_success_ttl(
            Arc::clone(&guard),
            Arc::clone(&navigator),
            config.success_ttl(),
        ));
        let api = Arc::new(ApiClient::new(&config.server_url, http, Arc::clone(&guard), navigator));
        let records = ResourceClient::new(Arc::clone(&api), notifications.clone());
        let users = ResourceClient::new(Arc::clone(&api), notifications.clone());

        Ok(Self {
            config,
            guard,
            router,
            notifications,
            api,
            records,
            users,
            info: Mutex::new(None),
            info_requested: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn guard(&self) -> &Arc<SessionGuard> {
        &self.guard
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    pub fn records_client(&self) -> &ResourceClient<Record> {
        &self.records
    }

    pub fn users_client(&self) -> &ResourceClient<User> {
        &self.users
    }

    /// Server details fetched by the first successful authentication check.
    pub fn info(&self) -> Option<ServerInfo> {
        self.info.lock().clone()
    }

    // ── Session ──────────────────────────────────────────────────

    /// Log in and land on the record list.
    ///
    /// Failures stay on the login screen as [`LOGIN_FAILED_MESSAGE`] and are
    /// not broadcast.
    pub async fn login(&self, email: &str, password: &str) -> Result<Route, &'static str> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        match self.guard.login(&credentials).await {
            Ok(_) => Ok(self.router.navigate(Route::Records)),
            Err(e) => {
                tracing::warn!("login failed: {e}");
                Err(LOGIN_FAILED_MESSAGE)
            }
        }
    }

    pub fn logout(&self) -> Route {
        self.router.navigate(Route::Logout)
    }

    /// Whether the session is live. The first `true` also fetches the
    /// server info.
    pub async fn check_authenticated(&self) -> bool {
        if !self.guard.is_authenticated() {
            return false;
        }
        if !self.info_requested.swap(true, Ordering::SeqCst) {
            match self.api.info().await {
                Ok(info) => *self.info.lock() = Some(info),
                Err(e) => tracing::debug!("server info unavailable: {e}"),
            }
        }
        true
    }

    /// Navigate to `target`; fails when the guard sends the user elsewhere.
    fn enter(&self, target: Route) -> Result<(), ClientError> {
        let landed = self.router.navigate(target.clone());
        if landed == target {
            Ok(())
        } else {
            Err(ClientError::Permission)
        }
    }

    // ── Collections ──────────────────────────────────────────────

    pub async fn records(&self) -> Result<Vec<Record>, ClientError> {
        self.enter(Route::Records)?;
        self.records.query(None).await
    }

    pub async fn users(&self) -> Result<Vec<User>, ClientError> {
        self.enter(Route::Users)?;
        self.users.query(None).await
    }

    pub async fn open_record(&self, id: &str) -> Result<RecordScreen<'_>, ClientError> {
        self.enter(Route::Record(id.to_string()))?;
        RecordScreen::load(self, id).await
    }

    pub async fn open_user(&self, id: &str) -> Result<UserScreen<'_>, ClientError> {
        self.enter(Route::User(id.to_string()))?;
        UserScreen::load(self, id).await
    }

    /// Create a record and land on its detail route.
    pub async fn new_record(&self, draft: &RecordDraft) -> Result<Route, ClientError> {
        self.enter(Route::NewRecord)?;
        let created = self.records.create(draft).await?;
        Ok(self.router.navigate(Route::Record(created.id)))
    }

    /// Create a user and land on the user list.
    pub async fn new_user(&self, draft: &UserDraft) -> Result<Route, ClientError> {
        self.enter(Route::NewUser)?;
        self.users.create(draft).await?;
        Ok(self.router.navigate(Route::Users))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::HandlerProtocol;
    use crate::notify::GENERIC_FAILURE_MESSAGE;
    use crate::session::store::MemoryTokenStore;
    use crate::session::token::tests::forge_expiring_in;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn console(server: &MockServer, store: MemoryTokenStore) -> Console {
        let config = ClientConfig {
            server_url: server.uri(),
            ..ClientConfig::default()
        };
        Console::new(config, Arc::new(store)).unwrap()
    }

    pub(crate) fn signed_in(server: &MockServer) -> Console {
        console(server, MemoryTokenStore::with_token(forge_expiring_in(3600)))
    }

    #[tokio::test]
    async fn login_lands_on_records() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"token": forge_expiring_in(600)})))
            .mount(&server)
            .await;

        let console = console(&server, MemoryTokenStore::new());
        assert_eq!(console.login("a@x", "pw").await, Ok(Route::Records));
        assert_eq!(console.router().current(), Route::Records);
    }

    #[tokio::test]
    async fn failed_login_stays_local() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "invalid username or password"})))
            .mount(&server)
            .await;

        let console = console(&server, MemoryTokenStore::new());
        assert_eq!(console.login("a@x", "bad").await, Err(LOGIN_FAILED_MESSAGE));
        assert_eq!(console.router().current(), Route::Login);
        assert_eq!(console.notifications().snapshot(), Default::default());
    }

    #[tokio::test]
    async fn info_is_fetched_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "version": "0.3.0",
                "proxy": {
                    "ssl": {"enabled": false, "listener": ""},
                    "http": {"enabled": true, "listener": "0.0.0.0:80"}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let anonymous = console(&server, MemoryTokenStore::new());
        assert!(!anonymous.check_authenticated().await);

        let console = signed_in(&server);
        assert!(console.check_authenticated().await);
        assert!(console.check_authenticated().await);
        assert_eq!(console.info().map(|i| i.version), Some("0.3.0".into()));
    }

    #[tokio::test]
    async fn anonymous_listing_is_refused_without_a_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/records"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let console = console(&server, MemoryTokenStore::new());
        assert!(console.records().await.unwrap_err().is_permission());
        assert_eq!(console.router().current(), Route::Login);
    }

    #[tokio::test]
    async fn revoked_token_during_listing_returns_to_login() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let console = signed_in(&server);
        assert!(console.users().await.is_err());
        assert!(!console.guard().is_authenticated());
        assert_eq!(console.router().current(), Route::Login);
        assert!(console.notifications().snapshot().error_message.is_none());
    }

    #[tokio::test]
    async fn listing_failure_is_broadcast() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/records"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;

        let console = signed_in(&server);
        assert!(console.records().await.is_err());
        assert_eq!(
            console.notifications().snapshot().error_message.as_deref(),
            Some(GENERIC_FAILURE_MESSAGE)
        );
    }

    #[tokio::test]
    async fn new_record_lands_on_its_detail_route() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/records"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "r-9",
                "owner": {"id": "u-1", "email": "a@x"},
                "fqdn": "new.example.com",
                "handler_host": "10.0.0.9",
                "handler_port": 80,
                "handler_protocol": "http"
            })))
            .mount(&server)
            .await;

        let console = signed_in(&server);
        let landed = console
            .new_record(&RecordDraft {
                fqdn: "new.example.com".into(),
                handler_host: "10.0.0.9".into(),
                handler_port: 80,
                handler_protocol: HandlerProtocol::Http,
            })
            .await
            .unwrap();
        assert_eq!(landed.path(), "/records/r-9");
    }

    #[tokio::test]
    async fn new_user_lands_on_user_list() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "u-3", "email": "c@x"})))
            .mount(&server)
            .await;

        let console = signed_in(&server);
        let draft = UserDraft {
            email: "c@x".into(),
            password: "hunter22".into(),
        };
        assert_eq!(console.new_user(&draft).await.unwrap(), Route::Users);
    }

    #[tokio::test]
    async fn logout_lands_on_login() {
        let server = MockServer::start().await;
        let console = signed_in(&server);
        assert_eq!(console.logout(), Route::Login);
        assert!(!console.check_authenticated().await);
    }
}

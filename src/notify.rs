//! Process-wide success/error notifications.
//!
//! The application root owns one [`NotificationCenter`] and injects it
//! wherever outcomes are reported. Renderers observe it through a
//! `tokio::sync::watch` channel.
//!
//! ## Rules
//! - One error message is visible at a time; a new one replaces the old.
//!   It stays until dismissed.
//! - A success message clears itself after a fixed window. A new success
//!   restarts the window.
//! - An authorization-denied failure never becomes a message: it ends the
//!   session and redirects to login. As an [`ErrorHandler`], the center
//!   skips `ClientError::Permission`: the transport's response interceptor
//!   has already escalated it.

use crate::error::{ClientError, FailurePayload};
use crate::navigation::{Navigator, Route};
use crate::resource::ErrorHandler;
use crate::session::SessionGuard;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Default lifetime of a success message.
pub const SUCCESS_MESSAGE_TTL: Duration = Duration::from_millis(2000);

/// Shown when the server rejects a payload with a field-error list.
pub const MISSING_FIELDS_MESSAGE: &str = "missing one or more required fields";

/// Shown for any failure without a usable error string.
pub const GENERIC_FAILURE_MESSAGE: &str = "there was an error during the request";

/// What the renderer displays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationState {
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

pub struct NotificationCenter {
    state: Arc<watch::Sender<NotificationState>>,
    /// Bumped by every `success`/`dismiss`; a clear timer only fires if its
    /// generation is still current.
    generation: Arc<AtomicU64>,
    timer: Mutex<Option<JoinHandle<()>>>,
    success_ttl: Duration,
    guard: Arc<SessionGuard>,
    navigator: Arc<dyn Navigator>,
}

impl NotificationCenter {
    pub fn new(guard: Arc<SessionGuard>, navigator: Arc<dyn Navigator>) -> Self {
        Self::with_success_ttl(guard, navigator, SUCCESS_MESSAGE_TTL)
    }

    pub fn with_success_ttl(
        guard: Arc<SessionGuard>,
        navigator: Arc<dyn Navigator>,
        success_ttl: Duration,
    ) -> Self {
        let (tx, _rx) = watch::channel(NotificationState::default());
        Self {
            state: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
            timer: Mutex::new(None),
            success_ttl,
            guard,
            navigator,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> NotificationState {
        self.state.borrow().clone()
    }

    // ── Outcomes ─────────────────────────────────────────────────

    /// Report a failed call.
    pub fn error(&self, failure: &FailurePayload) {
        if failure.is_unauthorized() {
            tracing::warn!("authorization denied; returning to login");
            self.guard.logout();
            self.navigator.redirect(Route::Login);
            return;
        }

        let message = error_message_for(failure);
        tracing::debug!("error notification: {message}");
        self.state.send_modify(|s| s.error_message = Some(message));
    }

    /// Show `message` and (re)start the clear timer.
    ///
    /// The timer needs a tokio runtime; without one the message stays until
    /// replaced or dismissed.
    pub fn success(&self, message: impl Into<String>) {
        let message = message.into();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| s.success_message = Some(message));

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no async runtime; success message will not auto-clear");
            return;
        };

        let state = Arc::clone(&self.state);
        let current = Arc::clone(&self.generation);
        let ttl = self.success_ttl;
        let handle = runtime.spawn(async move {
            tokio::time::sleep(ttl).await;
            if current.load(Ordering::SeqCst) == generation {
                state.send_modify(|s| s.success_message = None);
            }
        });

        if let Some(previous) = self.timer.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Clear both messages now.
    pub fn dismiss(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(timer) = self.timer.lock().take() {
            timer.abort();
        }
        self.state.send_modify(|s| {
            s.success_message = None;
            s.error_message = None;
        });
    }
}

impl ErrorHandler for NotificationCenter {
    fn handle(&self, error: &ClientError) {
        if error.is_permission() {
            return;
        }
        self.error(&error.payload());
    }
}

impl Drop for NotificationCenter {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.abort();
        }
    }
}

/// Exactly one display string per failure.
pub fn error_message_for(failure: &FailurePayload) -> String {
    if let Some(message) = failure
        .body
        .get("error")
        .and_then(|e| e.as_str())
        .filter(|m| !m.is_empty())
    {
        return message.to_string();
    }
    if failure.body.is_array() {
        return MISSING_FIELDS_MESSAGE.to_string();
    }
    GENERIC_FAILURE_MESSAGE.to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::navigation::tests::RecordingNavigator;
    use crate::session::store::{MemoryTokenStore, TokenStore};
    use crate::session::token::tests::forge_expiring_in;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    /// Token slot that counts how often it was cleared.
    #[derive(Default)]
    pub(crate) struct CountingStore {
        pub(crate) inner: MemoryTokenStore,
        pub(crate) clears: AtomicUsize,
    }

    impl TokenStore for CountingStore {
        fn load(&self) -> Option<String> {
            self.inner.load()
        }

        fn save(&self, token: &str) -> std::io::Result<()> {
            self.inner.save(token)
        }

        fn clear(&self) {
            self.clears.fetch_add(1, Ordering::SeqCst);
            self.inner.clear();
        }
    }

    struct Fixture {
        center: NotificationCenter,
        store: Arc<CountingStore>,
        nav: Arc<RecordingNavigator>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(CountingStore::default());
        store.save(&forge_expiring_in(600)).unwrap();
        let guard = Arc::new(SessionGuard::new(
            store.clone(),
            "http://127.0.0.1:1".into(),
            reqwest::Client::new(),
        ));
        let nav = Arc::new(RecordingNavigator::default());
        Fixture {
            center: NotificationCenter::new(guard, nav.clone()),
            store,
            nav,
        }
    }

    #[test]
    fn error_uses_server_error_string() {
        let f = fixture();
        f.center
            .error(&FailurePayload::new(Some(400), json!({"error": "fqdn must be unique across the application"})));
        assert_eq!(
            f.center.snapshot().error_message.as_deref(),
            Some("fqdn must be unique across the application")
        );
    }

    #[test]
    fn field_error_list_collapses_to_generic_message() {
        let f = fixture();
        f.center.error(&FailurePayload::new(
            Some(422),
            json!([{"fieldNames": ["email"], "message": "email is required"}]),
        ));
        assert_eq!(
            f.center.snapshot().error_message.as_deref(),
            Some(MISSING_FIELDS_MESSAGE)
        );
    }

    #[test]
    fn anything_else_is_the_generic_failure() {
        let f = fixture();
        f.center.error(&FailurePayload::new(Some(500), json!({"error": 42})));
        assert_eq!(
            f.center.snapshot().error_message.as_deref(),
            Some(GENERIC_FAILURE_MESSAGE)
        );
        f.center.error(&FailurePayload::default());
        assert_eq!(
            f.center.snapshot().error_message.as_deref(),
            Some(GENERIC_FAILURE_MESSAGE)
        );
    }

    #[test]
    fn empty_error_string_falls_back_to_generic() {
        let f = fixture();
        f.center.error(&FailurePayload::new(Some(400), json!({"error": ""})));
        assert_eq!(
            f.center.snapshot().error_message.as_deref(),
            Some(GENERIC_FAILURE_MESSAGE)
        );
        assert_eq!(
            error_message_for(&FailurePayload::new(Some(400), json!({"error": ""}))),
            GENERIC_FAILURE_MESSAGE
        );
    }

    #[test]
    fn newer_error_replaces_older() {
        let f = fixture();
        f.center.error(&FailurePayload::new(Some(400), json!({"error": "first"})));
        f.center.error(&FailurePayload::new(Some(400), json!({"error": "second"})));
        assert_eq!(f.center.snapshot().error_message.as_deref(), Some("second"));
    }

    #[test]
    fn unauthorized_logs_out_and_redirects_exactly_once() {
        let f = fixture();
        f.center.error(&FailurePayload::new(Some(401), json!({"error": "token expired"})));

        assert_eq!(f.store.clears.load(Ordering::SeqCst), 1);
        assert_eq!(*f.nav.redirects.lock(), vec![Route::Login]);
        assert_eq!(f.nav.redirects.lock()[0].path(), "/login");
        assert!(f.center.snapshot().error_message.is_none());
        assert!(f.store.load().is_none());
    }

    #[test]
    fn error_handler_leaves_permission_to_the_transport() {
        let f = fixture();
        f.center.handle(&ClientError::Permission);
        assert_eq!(f.store.clears.load(Ordering::SeqCst), 0);
        assert!(f.nav.redirects.lock().is_empty());

        f.center.handle(&ClientError::transport("connection reset"));
        assert_eq!(
            f.center.snapshot().error_message.as_deref(),
            Some(GENERIC_FAILURE_MESSAGE)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn success_clears_after_window() {
        let f = fixture();
        f.center.success("x");
        assert_eq!(f.center.snapshot().success_message.as_deref(), Some("x"));

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(f.center.snapshot().success_message.as_deref(), Some("x"));

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(f.center.snapshot().success_message.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn new_success_restarts_window() {
        let f = fixture();
        f.center.success("a");
        tokio::time::sleep(Duration::from_millis(1500)).await;
        f.center.success("b");

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(f.center.snapshot().success_message.as_deref(), Some("b"));

        tokio::time::sleep(Duration::from_millis(1001)).await;
        assert!(f.center.snapshot().success_message.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn success_does_not_touch_error_message() {
        let f = fixture();
        f.center.error(&FailurePayload::new(Some(500), json!({"error": "boom"})));
        f.center.success("saved");
        tokio::time::sleep(Duration::from_millis(2500)).await;

        let state = f.center.snapshot();
        assert!(state.success_message.is_none());
        assert_eq!(state.error_message.as_deref(), Some("boom"));
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_clears_both_slots_and_subscribers_see_it() {
        let f = fixture();
        let mut rx = f.center.subscribe();
        f.center.error(&FailurePayload::new(Some(500), json!({"error": "boom"})));
        f.center.success("saved");

        f.center.dismiss();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), NotificationState::default());
    }
}

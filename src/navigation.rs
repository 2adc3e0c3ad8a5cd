//! Route table and navigation.
//!
//! Every screen except login and logout requires an authenticated session.
//! Unknown paths fall back to the record list.

use crate::session::SessionGuard;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

// ── Routes ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Help,
    Records,
    NewRecord,
    Record(String),
    Users,
    NewUser,
    User(String),
    Login,
    Logout,
}

impl Route {
    /// Map a path onto the route table. Anything unrecognised lands on
    /// `/records`.
    pub fn parse(path: &str) -> Self {
        let segments: Vec<&str> = path
            .trim()
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            ["help"] => Self::Help,
            ["records"] => Self::Records,
            ["records", "new"] => Self::NewRecord,
            ["records", id] => Self::Record((*id).to_string()),
            ["users"] => Self::Users,
            ["users", "new"] => Self::NewUser,
            ["users", id] => Self::User((*id).to_string()),
            ["login"] => Self::Login,
            ["logout"] => Self::Logout,
            _ => Self::Records,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Help => "/help".into(),
            Self::Records => "/records".into(),
            Self::NewRecord => "/records/new".into(),
            Self::Record(id) => format!("/records/{id}"),
            Self::Users => "/users".into(),
            Self::NewUser => "/users/new".into(),
            Self::User(id) => format!("/users/{id}"),
            Self::Login => "/login".into(),
            Self::Logout => "/logout".into(),
        }
    }

    /// Whether entering this route needs an authenticated session.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Self::Login | Self::Logout)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Outcome of the navigation guard for one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Proceed,
    /// The transition is cancelled and the user is sent elsewhere.
    Redirect(Route),
}

/// Where the interceptor and the notification center send the user.
pub trait Navigator: Send + Sync {
    /// Replace the current location without consulting the guard.
    fn redirect(&self, route: Route);

    fn current(&self) -> Route;
}

// ── Router ───────────────────────────────────────────────────────

/// Guarded navigator owned by the application root.
pub struct Router {
    guard: Arc<SessionGuard>,
    current: Mutex<Route>,
}

impl Router {
    pub fn new(guard: Arc<SessionGuard>) -> Self {
        Self {
            guard,
            current: Mutex::new(Route::Login),
        }
    }

    /// Attempt a transition to `target`. Returns the route actually landed on.
    ///
    /// `Logout` clears the session and lands on `Login`.
    pub fn navigate(&self, target: Route) -> Route {
        let landed = match self.guard.navigation_guard(&target) {
            NavigationDecision::Proceed if target == Route::Logout => {
                self.guard.logout();
                Route::Login
            }
            NavigationDecision::Proceed => target,
            NavigationDecision::Redirect(to) => {
                tracing::debug!("navigation to {target} redirected to {to}");
                to
            }
        };
        self.land(landed.clone());
        landed
    }

    fn land(&self, route: Route) {
        *self.current.lock() = route;
    }
}

impl Navigator for Router {
    fn redirect(&self, route: Route) {
        self.land(route);
    }

    fn current(&self) -> Route {
        self.current.lock().clone()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::session::store::MemoryTokenStore;
    use crate::session::token::tests::forge_expiring_in;

    /// Navigator that only records redirects.
    #[derive(Default)]
    pub(crate) struct RecordingNavigator {
        pub(crate) redirects: Mutex<Vec<Route>>,
    }

    impl Navigator for RecordingNavigator {
        fn redirect(&self, route: Route) {
            self.redirects.lock().push(route);
        }

        fn current(&self) -> Route {
            self.redirects.lock().last().cloned().unwrap_or(Route::Login)
        }
    }

    fn router_with(token: Option<String>) -> Router {
        let store = match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::new(),
        };
        let guard = SessionGuard::new(Arc::new(store), "http://127.0.0.1:1".into(), reqwest::Client::new());
        Router::new(Arc::new(guard))
    }

    #[test]
    fn parses_route_table() {
        assert_eq!(Route::parse("/help"), Route::Help);
        assert_eq!(Route::parse("/records"), Route::Records);
        assert_eq!(Route::parse("/records/new"), Route::NewRecord);
        assert_eq!(Route::parse("/records/r-7"), Route::Record("r-7".into()));
        assert_eq!(Route::parse("/users/"), Route::Users);
        assert_eq!(Route::parse("/users/new"), Route::NewUser);
        assert_eq!(Route::parse("users/u-1"), Route::User("u-1".into()));
        assert_eq!(Route::parse("/login"), Route::Login);
        assert_eq!(Route::parse("/logout"), Route::Logout);
    }

    #[test]
    fn unknown_paths_fall_back_to_records() {
        assert_eq!(Route::parse("/"), Route::Records);
        assert_eq!(Route::parse("/nope/a/b"), Route::Records);
    }

    #[test]
    fn path_roundtrips_through_parse() {
        for route in [
            Route::Help,
            Route::NewRecord,
            Route::Record("abc".into()),
            Route::User("u".into()),
            Route::Logout,
        ] {
            assert_eq!(Route::parse(&route.path()), route);
        }
    }

    #[test]
    fn only_login_and_logout_are_public() {
        assert!(!Route::Login.requires_auth());
        assert!(!Route::Logout.requires_auth());
        assert!(Route::Help.requires_auth());
        assert!(Route::Record("x".into()).requires_auth());
    }

    #[test]
    fn anonymous_navigation_is_redirected_to_login() {
        let router = router_with(None);
        assert_eq!(router.navigate(Route::Users), Route::Login);
        assert_eq!(router.current(), Route::Login);
    }

    #[test]
    fn authenticated_navigation_proceeds() {
        let router = router_with(Some(forge_expiring_in(3600)));
        assert_eq!(router.navigate(Route::Records), Route::Records);
        assert_eq!(router.current(), Route::Records);
    }

    #[test]
    fn logout_route_clears_session_and_lands_on_login() {
        let router = router_with(Some(forge_expiring_in(3600)));
        router.navigate(Route::Records);
        assert_eq!(router.navigate(Route::Logout), Route::Login);
        assert!(!router.guard.is_authenticated());
        assert_eq!(router.current(), Route::Login);
        assert_eq!(router.navigate(Route::Records), Route::Login);
        assert_eq!(router.current(), Route::Login);
    }
}

//! Navigation guards.
//!
//! Guards are pure decisions over the token store and the principal. A denial
//! is a value ([`GuardOutcome::Redirect`]), never an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Principal, RouteAccess, TokenStore, authorize};

pub const UNAUTHORIZED_ERROR: &str = "unauthorized";
pub const UNAUTHORIZED_MESSAGE: &str = "No tienes permisos para acceder a esta página";

/// Where guards send the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRoutes {
    pub login: String,
    pub dashboard: String,
}

impl Default for AuthRoutes {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            dashboard: "/dashboard".to_string(),
        }
    }
}

/// A navigation target with ordered query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Redirect {
    pub fn to(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Path plus form-encoded query string.
    pub fn to_url(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{}?{}", self.path, query)
    }
}

impl core::fmt::Display for Redirect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_url())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GuardOutcome {
    Allow,
    Redirect(Redirect),
}

impl GuardOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardOutcome::Allow)
    }

    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            GuardOutcome::Allow => None,
            GuardOutcome::Redirect(r) => Some(r),
        }
    }
}

/// Private routes: unauthenticated users go to login, remembering where they
/// were headed.
pub fn require_authenticated(
    store: &TokenStore,
    attempted_url: &str,
    now: DateTime<Utc>,
    routes: &AuthRoutes,
) -> GuardOutcome {
    if store.is_authenticated_at(now) {
        return GuardOutcome::Allow;
    }
    tracing::warn!(url = %attempted_url, "not authenticated, redirecting to login");
    GuardOutcome::Redirect(Redirect::to(&routes.login).with_query("returnUrl", attempted_url))
}

/// Public auth pages: authenticated users go to the dashboard.
pub fn require_anonymous(store: &TokenStore, now: DateTime<Utc>, routes: &AuthRoutes) -> GuardOutcome {
    if store.is_authenticated_at(now) {
        tracing::debug!("already authenticated, redirecting to dashboard");
        return GuardOutcome::Redirect(Redirect::to(&routes.dashboard));
    }
    GuardOutcome::Allow
}

/// Routes with role/permission requirements.
pub fn require_authorized(
    principal: Option<&Principal>,
    access: &RouteAccess,
    routes: &AuthRoutes,
) -> GuardOutcome {
    let Some(principal) = principal else {
        tracing::warn!("no principal for a restricted route, redirecting to login");
        return GuardOutcome::Redirect(Redirect::to(&routes.login));
    };

    match authorize(principal, access) {
        Ok(()) => GuardOutcome::Allow,
        Err(denial) => {
            tracing::warn!(reason = %denial, "authorization guard denied navigation");
            GuardOutcome::Redirect(
                Redirect::to(&routes.dashboard)
                    .with_query("error", UNAUTHORIZED_ERROR)
                    .with_query("message", UNAUTHORIZED_MESSAGE),
            )
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Guard {
    Authenticated,
    Anonymous,
    Authorized,
}

/// A navigable route: its first path segment, guards (in order) and
/// authorization requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub path: String,
    pub title: String,
    pub guards: Vec<Guard>,
    #[serde(default)]
    pub access: RouteAccess,
}

impl Route {
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            guards: Vec::new(),
            access: RouteAccess::open(),
        }
    }

    pub fn guarded(mut self, guards: impl IntoIterator<Item = Guard>) -> Self {
        self.guards = guards.into_iter().collect();
        self
    }

    pub fn requiring(mut self, access: RouteAccess) -> Self {
        self.access = access;
        self
    }
}

/// First path segment of a URL, ignoring query and fragment.
pub(crate) fn first_segment(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.trim_start_matches('/').split('/').next().unwrap_or_default()
}

/// Evaluates route guards against a token store.
///
/// Holds no state between navigations; the principal is re-derived from the
/// stored claims on every evaluation.
#[derive(Debug, Clone)]
pub struct Navigator {
    store: TokenStore,
    routes: Vec<Route>,
    auth_routes: AuthRoutes,
    debug: bool,
}

impl Navigator {
    pub fn new(store: TokenStore, routes: Vec<Route>) -> Self {
        Self {
            store,
            routes,
            auth_routes: AuthRoutes::default(),
            debug: false,
        }
    }

    pub fn with_auth_routes(mut self, auth_routes: AuthRoutes) -> Self {
        self.auth_routes = auth_routes;
        self
    }

    /// Trace guard decisions at `info` instead of `debug`.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn resolve(&self, url: &str) -> Option<&Route> {
        let segment = first_segment(url);
        self.routes.iter().find(|r| r.path == segment)
    }

    /// Evaluate the guards of the route matching `url`. Unknown URLs redirect
    /// to the dashboard.
    pub fn navigate_at(&self, url: &str, now: DateTime<Utc>) -> GuardOutcome {
        match self.resolve(url) {
            Some(route) => self.evaluate_at(route, url, now),
            None => {
                self.trace(url, "unknown route, falling back to dashboard");
                GuardOutcome::Redirect(Redirect::to(&self.auth_routes.dashboard))
            }
        }
    }

    pub fn navigate(&self, url: &str) -> GuardOutcome {
        self.navigate_at(url, Utc::now())
    }

    /// Run `route`'s guards in order, stopping at the first redirect.
    pub fn evaluate_at(&self, route: &Route, attempted_url: &str, now: DateTime<Utc>) -> GuardOutcome {
        for guard in &route.guards {
            let outcome = match guard {
                Guard::Authenticated => {
                    require_authenticated(&self.store, attempted_url, now, &self.auth_routes)
                }
                Guard::Anonymous => require_anonymous(&self.store, now, &self.auth_routes),
                Guard::Authorized => {
                    let principal = self.store.principal();
                    require_authorized(principal.as_ref(), &route.access, &self.auth_routes)
                }
            };

            if let GuardOutcome::Redirect(redirect) = &outcome {
                self.trace(attempted_url, &format!("{guard:?} guard redirected to {redirect}"));
                return outcome;
            }
        }

        self.trace(attempted_url, "guards allowed navigation");
        GuardOutcome::Allow
    }

    fn trace(&self, url: &str, decision: &str) {
        if self.debug {
            tracing::info!(url = %url, "{decision}");
        } else {
            tracing::debug!(url = %url, "{decision}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use crate::principal::tests::principal;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn store_with(active: &str, permissions: &[&str], exp: DateTime<Utc>) -> TokenStore {
        let token = encode(
            &Header::default(),
            &json!({
                "sub": "ana@muni.gob.pe",
                "activeRole": active,
                "roles": [active],
                "permissions": permissions,
                "exp": exp.timestamp()
            }),
            &EncodingKey::from_secret(b"guard-tests"),
        )
        .unwrap();
        let store = TokenStore::in_memory();
        store.save(&token, "refresh").unwrap();
        store
    }

    fn users_route() -> Route {
        Route::new("users", "Usuarios")
            .guarded([Guard::Authenticated, Guard::Authorized])
            .requiring(RouteAccess::any_of(["users.read"]))
    }

    #[test]
    fn anonymous_user_is_sent_to_login_with_return_url() {
        let store = TokenStore::in_memory();
        let outcome = require_authenticated(&store, "/users?page=2", Utc::now(), &AuthRoutes::default());

        let redirect = outcome.redirect().unwrap();
        assert_eq!(redirect.path, "/login");
        assert_eq!(redirect.query_value("returnUrl"), Some("/users?page=2"));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn warnings_during(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn denials_are_logged_as_warnings() {
        let routes = AuthRoutes::default();
        let logs = warnings_during(|| {
            require_authenticated(&TokenStore::in_memory(), "/users", Utc::now(), &routes);
        });
        assert!(logs.contains("WARN"));
        assert!(logs.contains("redirecting to login"));

        let logs = warnings_during(|| {
            require_authorized(None, &RouteAccess::any_of(["users.read"]), &routes);
        });
        assert!(logs.contains("redirecting to login"));

        let logs = warnings_during(|| {
            let store = store_with("OPERADOR", &[], Utc::now() + Duration::hours(1));
            require_anonymous(&store, Utc::now(), &routes);
            require_authenticated(&store, "/shifts", Utc::now(), &routes);
        });
        assert!(logs.is_empty());
    }

    #[test]
    fn expired_token_is_treated_as_anonymous() {
        let now = Utc::now();
        let store = store_with("OPERADOR", &[], now - Duration::seconds(1));
        assert!(!require_authenticated(&store, "/dashboard", now, &AuthRoutes::default()).is_allowed());
        assert!(require_anonymous(&store, now, &AuthRoutes::default()).is_allowed());
    }

    #[test]
    fn authenticated_user_is_kept_off_login() {
        let now = Utc::now();
        let store = store_with("OPERADOR", &[], now + Duration::hours(1));
        let outcome = require_anonymous(&store, now, &AuthRoutes::default());
        assert_eq!(outcome, GuardOutcome::Redirect(Redirect::to("/dashboard")));
    }

    #[test]
    fn unauthorized_redirect_carries_error_and_message() {
        let p = principal(Some("OPERADOR"), &["OPERADOR"], &["rates.read"]);
        let outcome = require_authorized(Some(&p), &RouteAccess::any_of(["users.read"]), &AuthRoutes::default());

        let redirect = outcome.redirect().unwrap();
        assert_eq!(redirect.path, "/dashboard");
        assert_eq!(redirect.query_value("error"), Some(UNAUTHORIZED_ERROR));
        assert_eq!(redirect.query_value("message"), Some(UNAUTHORIZED_MESSAGE));
    }

    #[test]
    fn authorized_guard_without_principal_goes_to_login() {
        let outcome = require_authorized(None, &RouteAccess::open(), &AuthRoutes::default());
        assert_eq!(outcome, GuardOutcome::Redirect(Redirect::to("/login")));
    }

    #[test]
    fn admin_passes_authorized_guard() {
        let admin = principal(Some("ADMIN"), &["ADMIN"], &[]);
        let access = RouteAccess::all_of(["users.read", "users.delete"]).with_roles([Role::AUTORIDAD]);
        assert!(require_authorized(Some(&admin), &access, &AuthRoutes::default()).is_allowed());
    }

    #[test]
    fn navigator_stops_at_first_redirect() {
        let nav = Navigator::new(TokenStore::in_memory(), vec![users_route()]);
        let outcome = nav.navigate("/users");
        // Authenticated guard fires before Authorized.
        assert_eq!(outcome.redirect().unwrap().query_value("returnUrl"), Some("/users"));
    }

    #[test]
    fn navigator_applies_route_access() {
        let now = Utc::now();
        let exp = now + Duration::hours(1);

        let reader = Navigator::new(store_with("OPERADOR", &["users.read"], exp), vec![users_route()]);
        assert!(reader.navigate_at("/users/12", now).is_allowed());

        let other = Navigator::new(store_with("OPERADOR", &["rates.read"], exp), vec![users_route()]);
        let outcome = other.navigate_at("/users", now);
        assert_eq!(outcome.redirect().unwrap().query_value("error"), Some("unauthorized"));
    }

    #[test]
    fn unknown_url_falls_back_to_dashboard() {
        let nav = Navigator::new(TokenStore::in_memory(), vec![users_route()]).with_debug(true);
        assert_eq!(nav.navigate("/nowhere"), GuardOutcome::Redirect(Redirect::to("/dashboard")));
    }

    #[test]
    fn custom_auth_routes_are_honoured() {
        let routes = AuthRoutes {
            login: "/ingresar".into(),
            dashboard: "/inicio".into(),
        };
        let outcome = require_authenticated(&TokenStore::in_memory(), "/x", Utc::now(), &routes);
        assert_eq!(outcome.redirect().unwrap().path, "/ingresar");
    }

    #[test]
    fn redirect_renders_encoded_query() {
        let redirect = Redirect::to("/login").with_query("returnUrl", "/users?page=2");
        assert_eq!(redirect.to_url(), "/login?returnUrl=%2Fusers%3Fpage%3D2");
        assert_eq!(Redirect::to("/dashboard").to_string(), "/dashboard");
    }

    #[test]
    fn first_segment_ignores_query_and_fragment() {
        assert_eq!(first_segment("/users/3?x=1"), "users");
        assert_eq!(first_segment("rates#top"), "rates");
        assert_eq!(first_segment("/"), "");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: with no valid credential, a private route always
            /// redirects to login carrying the attempted URL.
            #[test]
            fn unauthenticated_always_redirected(url in "/[a-z]{1,10}(/[0-9]{1,4})?", expired_by in 0i64..100_000) {
                let now = Utc::now();
                let store = store_with("ADMIN", &[], now - Duration::seconds(expired_by));
                let outcome = require_authenticated(&store, &url, now, &AuthRoutes::default());
                let redirect = outcome.redirect().cloned();
                prop_assert!(redirect.is_some());
                let redirect = redirect.unwrap();
                prop_assert_eq!(redirect.path.as_str(), "/login");
                prop_assert_eq!(redirect.query_value("returnUrl"), Some(url.as_str()));
            }
        }
    }
}

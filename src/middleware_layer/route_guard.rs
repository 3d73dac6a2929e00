use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;

use crate::{
    models::session::SessionContext,
    services::session::{LANDING_PATH, LOGIN_PATH},
    state::AppState,
};

/// Which paths need a session and where to send visitors who do not match.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    /// Paths that require a session. Each entry also covers its sub-paths.
    pub protected: Vec<String>,
    /// Login and registration pages; authenticated visitors skip them.
    pub auth_entry: Vec<String>,
    pub login_path: String,
    pub landing_path: String,
    /// Path prefixes the redirect rules never apply to.
    pub exempt_prefixes: Vec<String>,
    /// Exact paths the redirect rules never apply to.
    pub exempt_paths: Vec<String>,
    /// Path suffixes (file extensions) the redirect rules never apply to.
    pub exempt_suffixes: Vec<String>,
    /// Renew the session cookie on every authenticated pass-through.
    pub sliding: bool,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            protected: owned(&[
                "/dashboard",
                "/dashboard/income",
                "/dashboard/expenses",
                "/dashboard/budget",
            ]),
            auth_entry: owned(&["/login", "/register", "/signup"]),
            login_path: LOGIN_PATH.to_string(),
            landing_path: LANDING_PATH.to_string(),
            exempt_prefixes: owned(&["/api", "/_next/static", "/_next/image", "/static"]),
            exempt_paths: owned(&["/favicon.ico"]),
            exempt_suffixes: owned(&[".png"]),
            sliding: false,
        }
    }
}

/// Outcome of evaluating one request against the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    Redirect(String),
}

/// `path` equals `base` or continues it with a `/` segment.
fn within(path: &str, base: &str) -> bool {
    match path.strip_prefix(base) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || base.ends_with('/'),
        None => false,
    }
}

impl RoutePolicy {
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.iter().any(|p| p == path)
            || self.exempt_prefixes.iter().any(|p| within(path, p))
            || self.exempt_suffixes.iter().any(|s| path.ends_with(s.as_str()))
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.protected.iter().any(|p| within(path, p))
    }

    pub fn is_auth_entry(&self, path: &str) -> bool {
        self.auth_entry.iter().any(|p| p == path)
    }

    /// Applies the rules in order; the first match wins.
    pub fn evaluate(&self, path: &str, context: &SessionContext) -> GuardDecision {
        if self.is_exempt(path) {
            return GuardDecision::Pass;
        }

        let authenticated = context.is_authenticated();

        if self.is_protected(path) && !authenticated {
            return GuardDecision::Redirect(self.login_path.clone());
        }

        if self.is_auth_entry(path) && authenticated {
            return GuardDecision::Redirect(self.landing_path.clone());
        }

        GuardDecision::Pass
    }
}

/// Gates every request before it reaches a handler or the static files.
///
/// Decodes the session cookie once, stores the resulting
/// [`SessionContext`] in the request extensions, and redirects according
/// to the [`RoutePolicy`]. A bad or expired cookie counts as no cookie.
pub async fn route_guard(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Response {
    let mut context = SessionContext::from(state.sessions.verify_session(&cookies));
    let path = request.uri().path().to_owned();

    if let GuardDecision::Redirect(to) = state.policy.evaluate(&path, &context) {
        tracing::debug!(
            "🔒 Guard redirect {} -> {} (authenticated: {})",
            path,
            to,
            context.is_authenticated()
        );
        return Redirect::temporary(&to).into_response();
    }

    if state.policy.sliding && !state.policy.is_exempt(&path) {
        if let SessionContext::Authenticated(payload) = &context {
            match state.sessions.reissue(&cookies, payload.clone()) {
                Ok(renewed) => context = SessionContext::Authenticated(renewed),
                Err(e) => tracing::warn!("Failed to renew session: {}", e),
            }
        }
    }

    request.extensions_mut().insert(context);
    next.run(request).await
}

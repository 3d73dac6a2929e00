//! Session lifecycle: binds the token codec to the `session` cookie.

use std::sync::Arc;

use axum::response::{IntoResponse, Redirect, Response};
use chrono::{DateTime, Duration, Utc};
use tower_cookies::cookie::time::{self, OffsetDateTime};
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

use crate::config::Config;
use crate::crypto::token::TokenCodec;
use crate::error::{AppError, Result};
use crate::models::session::SessionPayload;
use crate::models::user::User;

/// Name of the cookie carrying the signed token.
pub const SESSION_COOKIE: &str = "session";
/// Where unauthenticated requests are sent.
pub const LOGIN_PATH: &str = "/login";
/// Where authenticated visitors of the auth pages are sent.
pub const LANDING_PATH: &str = "/dashboard";

/// Rejection of a hard session check: a temporary redirect to the login page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRedirect {
    pub location: String,
}

impl AuthRedirect {
    pub fn to_login() -> Self {
        Self {
            location: LOGIN_PATH.to_string(),
        }
    }
}

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        Redirect::temporary(&self.location).into_response()
    }
}

/// Issues, verifies, refreshes and destroys cookie-held sessions.
///
/// Holds no per-session state; every call works on the cookie jar of the
/// request it is given.
#[derive(Clone)]
pub struct SessionManager {
    codec: Arc<TokenCodec>,
    secure: bool,
}

impl SessionManager {
    pub fn new(codec: TokenCodec, secure: bool) -> Self {
        Self {
            codec: Arc::new(codec),
            secure,
        }
    }

    /// Builds the manager from configuration. Fails when no signing secret
    /// is configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let ttl = Duration::try_days(config.session_duration_days).ok_or_else(|| {
            AppError::Configuration(format!(
                "session duration of {} days is out of range",
                config.session_duration_days
            ))
        })?;
        let codec = TokenCodec::new(config.secret_key.as_slice(), ttl)?;
        Ok(Self::new(codec, config.production))
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Signs a payload for `user` and stores it in the session cookie.
    pub fn create_session(&self, cookies: &Cookies, user: &User) -> Result<SessionPayload> {
        let payload = SessionPayload::for_user(user, self.expiry()?);
        self.issue(cookies, &payload)?;
        tracing::info!("✅ Session created for user: {}", payload.user_id);
        Ok(payload)
    }

    /// Soft check: the current principal, or `None`. Never redirects.
    pub fn verify_session(&self, cookies: &Cookies) -> Option<SessionPayload> {
        let token = cookies.get(SESSION_COOKIE)?;
        let payload = self.codec.decode(token.value()).into_payload();
        if payload.is_none() {
            tracing::debug!("Session cookie present but not valid");
        }
        payload
    }

    /// Hard check: the current principal, or a redirect to the login page.
    pub fn require_session(
        &self,
        cookies: &Cookies,
    ) -> std::result::Result<SessionPayload, AuthRedirect> {
        self.verify_session(cookies).ok_or_else(|| {
            tracing::debug!("🔒 No valid session, redirecting to {}", LOGIN_PATH);
            AuthRedirect::to_login()
        })
    }

    /// Re-signs the current session with a renewed expiry.
    ///
    /// Returns `Ok(None)` without touching the cookie when there is no valid
    /// session.
    pub fn refresh_session(&self, cookies: &Cookies) -> Result<Option<SessionPayload>> {
        let Some(payload) = self.verify_session(cookies) else {
            return Ok(None);
        };
        self.reissue(cookies, payload).map(Some)
    }

    /// Re-signs an already verified payload.
    pub fn reissue(&self, cookies: &Cookies, mut payload: SessionPayload) -> Result<SessionPayload> {
        payload.expires_at = self.expiry()?;
        self.issue(cookies, &payload)?;
        tracing::debug!("🔄 Session refreshed for user: {}", payload.user_id);
        Ok(payload)
    }

    /// Deletes the session cookie. Safe to call without a session.
    pub fn destroy_session(&self, cookies: &Cookies) {
        let mut cookie = Cookie::new(SESSION_COOKIE, "");
        cookie.set_path("/");
        cookies.remove(cookie);
        tracing::debug!("Session cookie removed");
    }

    fn expiry(&self) -> Result<DateTime<Utc>> {
        Utc::now()
            .checked_add_signed(self.codec.ttl())
            .ok_or_else(|| AppError::Token("session lifetime overflows the clock".to_string()))
    }

    fn issue(&self, cookies: &Cookies, payload: &SessionPayload) -> Result<()> {
        let token = self.codec.encode(payload)?;
        cookies.add(self.session_cookie(token, payload.expires_at));
        Ok(())
    }

    fn session_cookie(&self, token: String, expires_at: DateTime<Utc>) -> Cookie<'static> {
        let mut cookie = Cookie::new(SESSION_COOKIE, token);
        cookie.set_http_only(true);
        cookie.set_secure(self.secure);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_path("/");

        match OffsetDateTime::from_unix_timestamp(expires_at.timestamp()) {
            Ok(at) => cookie.set_expires(at),
            Err(_) => cookie.set_max_age(time::Duration::seconds(self.codec.ttl().num_seconds())),
        }

        cookie
    }
}

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use tower_cookies::Cookies;

use crate::{
    error::AppError,
    models::session::{SessionContext, SessionPayload},
    services::session::{AuthRedirect, SessionManager},
};

/// The request's cookie jar.
///
/// Rejects with a logged [`AppError::Internal`] when the cookie layer is
/// missing, so session cookies can be neither read nor written.
pub struct SessionCookies(pub Cookies);

impl<S> FromRequestParts<S> for SessionCookies
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Cookies::from_request_parts(parts, state)
            .await
            .map(SessionCookies)
            .map_err(|(_, msg)| AppError::Internal(format!("cookie jar unavailable: {}", msg)))
    }
}

/// Reads the request's [`SessionContext`].
///
/// Uses the value stored by the route guard when present. Otherwise the
/// cookie is decoded here and the result is kept in the same request's
/// extensions, so a request is never verified twice.
async fn session_context<S>(parts: &mut Parts, state: &S) -> Result<SessionContext, AppError>
where
    SessionManager: FromRef<S>,
    S: Send + Sync,
{
    if let Some(context) = parts.extensions.get::<SessionContext>() {
        return Ok(context.clone());
    }

    let SessionCookies(cookies) = SessionCookies::from_request_parts(parts, state).await?;

    let sessions = SessionManager::from_ref(state);
    let context = SessionContext::from(sessions.verify_session(&cookies));
    parts.extensions.insert(context.clone());
    Ok(context)
}

/// Soft session check: `None` when logged out. Never redirects.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<SessionPayload>);

impl<S> FromRequestParts<S> for MaybeSession
where
    SessionManager: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = session_context(parts, state).await?;
        Ok(MaybeSession(context.payload().cloned()))
    }
}

/// Hard session check: rejects with a redirect to the login page.
#[derive(Debug, Clone)]
pub struct RequireSession(pub SessionPayload);

impl<S> FromRequestParts<S> for RequireSession
where
    SessionManager: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match session_context(parts, state).await {
            Ok(SessionContext::Authenticated(payload)) => Ok(RequireSession(payload)),
            Ok(SessionContext::Anonymous) => Err(AuthRedirect::to_login().into_response()),
            Err(e) => Err(e.into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use tower_cookies::CookieManagerLayer;

    fn jar_route() -> Router {
        Router::new().route("/", get(|SessionCookies(_): SessionCookies| async { "jar" }))
    }

    fn request() -> Request<Body> {
        Request::builder().uri("/").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_cookie_layer_is_an_internal_error() {
        let response = jar_route().oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn cookie_layer_provides_the_jar() {
        let app = jar_route().layer(CookieManagerLayer::new());
        let response = app.oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

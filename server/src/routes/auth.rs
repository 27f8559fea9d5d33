//! Auth routes: mock login, logout, and the current identity.

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use portal::boundary::CookieSession;
use portal::cookie::SessionCookie;
use portal::credentials::AuthError;
use portal::identity::{Identity, Role};
use portal::{LOGIN_PATH, SESSION_KEY};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::state::AppState;

/// Convert the portal's cookie description into a response cookie.
///
/// Not `HttpOnly`: the client-side session reads the same cookie.
pub(crate) fn response_cookie(cookie: &SessionCookie, secure: bool) -> Cookie<'static> {
    let builder = Cookie::build((cookie.name, cookie.value.clone()))
        .path(cookie.path)
        .same_site(SameSite::Lax)
        .secure(secure);
    match cookie.max_age {
        Some(age) => builder.max_age(age).build(),
        None => builder
            .max_age(Duration::ZERO)
            .expires(OffsetDateTime::UNIX_EPOCH)
            .build(),
    }
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Identity extracted from the `kineticUser` cookie.
/// Use as a handler parameter to require authentication.
pub struct AuthIdentity(pub Identity);

impl<S> axum::extract::FromRequestParts<S> for AuthIdentity
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        match CookieSession::from_cookie(jar.get(SESSION_KEY).map(Cookie::value)) {
            CookieSession::Valid(identity) => Ok(Self(identity)),
            CookieSession::Missing | CookieSession::Corrupt => Err(StatusCode::UNAUTHORIZED),
        }
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    /// Portal the user logged in through.
    #[serde(default)]
    portal: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: Identity,
    pub redirect: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RedirectResponse {
    pub redirect: &'static str,
}

/// `POST /api/auth/login`: resolve credentials, set the session cookie.
pub async fn login(State(state): State<AppState>, jar: CookieJar, Json(req): Json<LoginRequest>) -> Response {
    let identity = match state
        .authenticator
        .authenticate(&req.email, &req.password, req.portal)
        .await
    {
        Ok(identity) => identity,
        Err(e @ AuthError::InvalidCredentials) => {
            tracing::info!("login rejected");
            return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "error": e.to_string() }))).into_response();
        }
    };

    let cookie = match SessionCookie::for_identity(&identity) {
        Ok(cookie) => cookie,
        Err(e) => {
            tracing::error!(error = %e, "session cookie serialization failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session").into_response();
        }
    };

    let redirect = identity.role.dashboard_path();
    let jar = jar.add(response_cookie(&cookie, state.config.cookie_secure));
    (jar, Json(LoginResponse { user: identity, redirect })).into_response()
}

/// `POST /api/auth/logout`: expire the session cookie and release the
/// caller's pose studio.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let CookieSession::Valid(identity) = CookieSession::from_cookie(jar.get(SESSION_KEY).map(Cookie::value)) {
        state.release_studio(&identity.id).await;
    }
    let jar = jar.add(response_cookie(&SessionCookie::expired(), state.config.cookie_secure));
    (jar, Json(RedirectResponse { redirect: LOGIN_PATH }))
}

/// `GET /api/auth/me`: return the current identity.
pub async fn me(AuthIdentity(identity): AuthIdentity) -> Json<Identity> {
    Json(identity)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;

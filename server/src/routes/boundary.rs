//! Boundary middleware: cookie-only redirects in front of the page routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use portal::SESSION_KEY;
use portal::boundary::{self, BoundaryAction};
use portal::cookie::SessionCookie;

use super::auth::response_cookie;
use crate::state::AppState;

/// Apply [`boundary::check`] before the wrapped route runs.
pub async fn enforce(State(state): State<AppState>, jar: CookieJar, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let decision = boundary::check(&path, jar.get(SESSION_KEY).map(Cookie::value));

    let response = match decision.action {
        BoundaryAction::Allow => next.run(request).await,
        BoundaryAction::Redirect(to) => {
            tracing::debug!(%path, %to, "boundary redirect");
            Redirect::temporary(to).into_response()
        }
    };

    if decision.clear_cookie {
        let jar = jar.add(response_cookie(&SessionCookie::expired(), state.config.cookie_secure));
        return (jar, response).into_response();
    }
    response
}

#[cfg(test)]
#[path = "boundary_test.rs"]
mod tests;

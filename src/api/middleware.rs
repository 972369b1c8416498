//! Admin route guard
//!
//! Verifies the stored token on every protected request and decides whether
//! the page renders, shows the loading placeholder, or sends the visitor to
//! the login page.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tera::Context as TeraContext;

use super::{AppState, ClientStorage};
use crate::services::auth::LOGIN_PATH;
use crate::services::{guard, AuthSession, GuardDecision};

pub async fn require_admin(
    State(state): State<AppState>,
    mut storage: ClientStorage,
    request: Request,
    next: Next,
) -> Response {
    let mut session = AuthSession::new();
    state.auth.initialize(&mut session, &mut storage).await;

    match guard(session.state()) {
        GuardDecision::Render => (storage, next.run(request).await).into_response(),
        GuardDecision::RedirectToLogin => {
            tracing::debug!(path = %request.uri().path(), "Anonymous admin request");
            (storage, Redirect::to(LOGIN_PATH)).into_response()
        }
        GuardDecision::Placeholder => {
            match state.render("admin/loading.html", &TeraContext::new()) {
                Ok(page) => (storage, page).into_response(),
                Err(e) => e.into_response(),
            }
        }
    }
}

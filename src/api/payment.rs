//! Pending, success and failure pages

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use tera::Context as TeraContext;

use super::{AppState, ClientStorage, PageError};

/// GET /payment/pending
///
/// Each view keeps the checkout's watch alive; the page refreshes itself
/// until the watch publishes a destination.
pub async fn pending(
    State(state): State<AppState>,
    storage: ClientStorage,
) -> Result<Response, PageError> {
    let Some(checkout_request_id) = storage.checkout_request_id() else {
        return Ok(Redirect::to("/").into_response());
    };

    let snapshot = state.watches.view(checkout_request_id).await;
    if let Some(destination) = snapshot.redirect_to() {
        state.watches.cancel(checkout_request_id).await;
        return Ok(Redirect::to(destination).into_response());
    }

    let mut context = TeraContext::new();
    context.insert("watch", &snapshot);
    context.insert("phone_number", storage.phone_number().unwrap_or_default());
    Ok(state.render("payment/pending.html", &context)?.into_response())
}

/// GET /payment/pending/status
pub async fn pending_status(State(state): State<AppState>, storage: ClientStorage) -> Response {
    let Some(checkout_request_id) = storage.checkout_request_id() else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No payment in progress" })),
        )
            .into_response();
    };

    let snapshot = state.watches.view(checkout_request_id).await;
    Json(json!({
        "checkoutRequestId": snapshot.checkout_request_id,
        "status": snapshot.status,
        "secondsLeft": snapshot.seconds_left,
        "countdown": snapshot.countdown(),
        "expired": snapshot.expired,
        "polling": snapshot.polling,
        "polls": snapshot.polls,
        "redirectTo": snapshot.redirect_to(),
    }))
    .into_response()
}

/// POST /payment/cancel
pub async fn cancel(State(state): State<AppState>, mut storage: ClientStorage) -> Response {
    if let Some(checkout_request_id) = storage.checkout_request_id() {
        if state.watches.cancel(checkout_request_id).await {
            tracing::info!(%checkout_request_id, "Payment watch cancelled by visitor");
        }
    }
    storage.clear_checkout();
    (storage, Redirect::to("/")).into_response()
}

/// GET /payment/success
pub async fn success(
    State(state): State<AppState>,
    storage: ClientStorage,
) -> Result<Response, PageError> {
    let Some(checkout_request_id) = storage.checkout_request_id() else {
        return Ok(Redirect::to("/").into_response());
    };
    state.watches.cancel(checkout_request_id).await;

    let mut context = TeraContext::new();
    match state.checkout.connection_details(checkout_request_id).await {
        Ok(details) => {
            context.insert("details", &details);
            context.insert("error", &None::<String>);
        }
        Err(message) => {
            context.insert("details", &None::<String>);
            context.insert("error", message);
        }
    }
    Ok(state.render("payment/success.html", &context)?.into_response())
}

/// GET /payment/failure
pub async fn failure(
    State(state): State<AppState>,
    storage: ClientStorage,
) -> Result<Response, PageError> {
    if let Some(checkout_request_id) = storage.checkout_request_id() {
        state.watches.cancel(checkout_request_id).await;
    }
    Ok(state
        .render("payment/failure.html", &TeraContext::new())?
        .into_response())
}

//! HTTP layer - page handlers and routing
//!
//! Server-rendered pages for the hotspot portal:
//! - Public flow: package selection, pending payment, success and failure
//! - Admin back-office: login, dashboard, users, packages, payments
//!
//! Admin pages sit behind [`middleware::require_admin`]. Browser state lives in
//! cookies, see [`storage::ClientStorage`].

pub mod admin;
pub mod middleware;
pub mod payment;
pub mod portal;
pub mod storage;


use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tera::Context as TeraContext;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::client::PortalBackend;
use crate::config::PaymentConfig;
use crate::services::{AdminService, AuthService, CheckoutService, WatchRegistry};
use crate::theme::{PageRenderer, RenderError};

pub use storage::ClientStorage;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<PageRenderer>,
    pub checkout: Arc<CheckoutService>,
    pub watches: Arc<WatchRegistry>,
    pub auth: Arc<AuthService>,
    pub admin: Arc<AdminService>,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn PortalBackend>,
        payment: &PaymentConfig,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            renderer: Arc::new(PageRenderer::new()?),
            checkout: Arc::new(CheckoutService::new(backend.clone())),
            watches: Arc::new(WatchRegistry::new(backend.clone(), payment)),
            auth: Arc::new(AuthService::new(backend.clone())),
            admin: Arc::new(AdminService::new(backend)),
        })
    }

    /// Render a page template
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<Html<String>, PageError> {
        Ok(Html(self.renderer.render(template, context)?))
    }
}

/// Error produced while building a page
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        tracing::error!("Page failed: {}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(PageRenderer::error_page(
                "The page could not be displayed. Please try again.",
            )),
        )
            .into_response()
    }
}

/// Admin pages that need a verified session
fn admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin::dashboard))
        .route("/admin/users", get(admin::users))
        .route(
            "/admin/packages",
            get(admin::packages).post(admin::create_package),
        )
        .route("/admin/packages/new", get(admin::new_package))
        .route("/admin/packages/{id}", post(admin::update_package))
        .route("/admin/packages/{id}/edit", get(admin::edit_package))
        .route("/admin/payments", get(admin::payments))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_admin,
        ))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(portal::index).post(portal::submit))
        .route("/payment/pending", get(payment::pending))
        .route("/payment/pending/status", get(payment::pending_status))
        .route("/payment/cancel", post(payment::cancel))
        .route("/payment/success", get(payment::success))
        .route("/payment/failure", get(payment::failure))
        .route("/admin/login", get(admin::login_page).post(admin::login))
        .route("/admin/logout", post(admin::logout))
        .merge(admin_router(state.clone()))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

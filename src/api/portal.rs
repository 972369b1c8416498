//! Package selection and payment initiation

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tera::Context as TeraContext;

use super::{AppState, ClientStorage, PageError};
use crate::services::CheckoutPage;

/// Fields of the checkout form
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub phone: String,
    /// Radio value; absent when nothing is selected
    #[serde(default)]
    pub package_id: Option<String>,
}

impl CheckoutForm {
    pub fn package_id(&self) -> Option<i64> {
        self.package_id
            .as_deref()
            .and_then(|id| id.trim().parse().ok())
    }
}

fn portal_context(page: &CheckoutPage, phone: &str) -> TeraContext {
    let mut context = TeraContext::new();
    context.insert("packages", &page.packages);
    context.insert("selected", &page.selected);
    context.insert("error", &page.error);
    context.insert("phone", phone);
    context
}

/// GET /
pub async fn index(
    State(state): State<AppState>,
    storage: ClientStorage,
) -> Result<Response, PageError> {
    let page = state.checkout.load().await;
    let phone = storage.phone_number().unwrap_or_default();
    Ok(state
        .render("portal.html", &portal_context(&page, phone))?
        .into_response())
}

/// POST /
pub async fn submit(
    State(state): State<AppState>,
    mut storage: ClientStorage,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, PageError> {
    let package_id = form.package_id();

    match state.checkout.submit(&form.phone, package_id).await {
        Ok(started) => {
            storage.start_checkout(&started);
            Ok((storage, Redirect::to("/payment/pending")).into_response())
        }
        Err(e) => {
            let mut page = state.checkout.load().await;
            if package_id.is_some() {
                page.selected = package_id;
            }
            page.error = Some(e.to_string());
            Ok(state
                .render("portal.html", &portal_context(&page, &form.phone))?
                .into_response())
        }
    }
}

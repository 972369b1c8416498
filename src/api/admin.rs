//! Admin back-office pages

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tera::Context as TeraContext;

use super::{AppState, ClientStorage, PageError};
use crate::models::{Package, PackageDraft, PackageForm};
use crate::services::{AuthSession, PaymentQuery, PaymentSummary, TokenStore};

pub const CREDENTIALS_REQUIRED: &str = "Username and password are required";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

const PACKAGES_PATH: &str = "/admin/packages";

const STATUS_OPTIONS: [&str; 4] = ["all", "pending", "completed", "failed"];

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub refresh: Option<String>,
}

fn login_context(username: &str, error: Option<&str>) -> TeraContext {
    let mut context = TeraContext::new();
    context.insert("username", username);
    context.insert("error", &error);
    context
}

/// GET /admin/login
pub async fn login_page(
    State(state): State<AppState>,
    mut storage: ClientStorage,
) -> Result<Response, PageError> {
    if storage.token().is_some() {
        let mut session = AuthSession::new();
        state.auth.initialize(&mut session, &mut storage).await;
        if session.is_authenticated() {
            return Ok((storage, Redirect::to("/admin")).into_response());
        }
    }

    let page = state.render("admin/login.html", &login_context("", None))?;
    Ok((storage, page).into_response())
}

/// POST /admin/login
pub async fn login(
    State(state): State<AppState>,
    mut storage: ClientStorage,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageError> {
    if form.username.trim().is_empty() || form.password.trim().is_empty() {
        let context = login_context(&form.username, Some(CREDENTIALS_REQUIRED));
        return Ok(state.render("admin/login.html", &context)?.into_response());
    }

    let mut session = AuthSession::new();
    let accepted = state
        .auth
        .login(&mut session, &mut storage, &form.username, &form.password)
        .await;

    if accepted {
        Ok((storage, Redirect::to("/admin")).into_response())
    } else {
        let context = login_context(&form.username, Some(INVALID_CREDENTIALS));
        Ok(state.render("admin/login.html", &context)?.into_response())
    }
}

/// POST /admin/logout
pub async fn logout(State(state): State<AppState>, mut storage: ClientStorage) -> Response {
    let mut session = AuthSession::new();
    let destination = state.auth.logout(&mut session, &mut storage);
    (storage, Redirect::to(destination)).into_response()
}

/// GET /admin
pub async fn dashboard(
    State(state): State<AppState>,
    storage: ClientStorage,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, PageError> {
    let refresh = query.refresh.is_some_and(|r| r != "0" && !r.is_empty());
    let token = storage.token();

    let mut context = TeraContext::new();
    match state.admin.dashboard(token.as_deref(), refresh).await {
        Ok(data) => {
            context.insert("data", &data);
            context.insert("error", &None::<String>);
        }
        Err(message) => {
            context.insert("data", &None::<String>);
            context.insert("error", message);
        }
    }
    Ok(state.render("admin/dashboard.html", &context)?.into_response())
}

/// GET /admin/users
pub async fn users(
    State(state): State<AppState>,
    storage: ClientStorage,
) -> Result<Response, PageError> {
    let token = storage.token();
    let (users, error) = match state.admin.users(token.as_deref()).await {
        Ok(users) => (users, None),
        Err(message) => (Vec::new(), Some(message)),
    };

    let mut context = TeraContext::new();
    context.insert("users", &users);
    context.insert("error", &error);
    Ok(state.render("admin/users.html", &context)?.into_response())
}

/// Which form the packages page shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PackageMode {
    List,
    Add,
    Edit,
}

impl PackageMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Add => "add",
            Self::Edit => "edit",
        }
    }
}

fn render_packages(
    state: &AppState,
    mode: PackageMode,
    packages: &[Package],
    draft: &PackageDraft,
    error: Option<&str>,
) -> Result<Response, PageError> {
    let mut context = TeraContext::new();
    context.insert("mode", mode.as_str());
    context.insert("packages", packages);
    context.insert("draft", draft);
    context.insert("error", &error);
    Ok(state.render("admin/packages.html", &context)?.into_response())
}

/// GET /admin/packages
pub async fn packages(
    State(state): State<AppState>,
    storage: ClientStorage,
) -> Result<Response, PageError> {
    let token = storage.token();
    let (packages, error) = match state.admin.packages(token.as_deref()).await {
        Ok(packages) => (packages, None),
        Err(message) => (Vec::new(), Some(message)),
    };
    render_packages(&state, PackageMode::List, &packages, &PackageDraft::default(), error)
}

/// GET /admin/packages/new
pub async fn new_package(State(state): State<AppState>) -> Result<Response, PageError> {
    render_packages(&state, PackageMode::Add, &[], &PackageDraft::default(), None)
}

/// GET /admin/packages/{id}/edit
pub async fn edit_package(
    State(state): State<AppState>,
    storage: ClientStorage,
    Path(id): Path<i64>,
) -> Result<Response, PageError> {
    let token = storage.token();
    match state.admin.package_draft(token.as_deref(), id).await {
        Ok(Some(draft)) => render_packages(&state, PackageMode::Edit, &[], &draft, None),
        Ok(None) => Ok(Redirect::to(PACKAGES_PATH).into_response()),
        Err(message) => {
            render_packages(&state, PackageMode::List, &[], &PackageDraft::default(), Some(message))
        }
    }
}

/// POST /admin/packages
pub async fn create_package(
    State(state): State<AppState>,
    storage: ClientStorage,
    Form(form): Form<PackageForm>,
) -> Result<Response, PageError> {
    save_package(&state, &storage, form.into_draft(None), PackageMode::Add).await
}

/// POST /admin/packages/{id}
pub async fn update_package(
    State(state): State<AppState>,
    storage: ClientStorage,
    Path(id): Path<i64>,
    Form(form): Form<PackageForm>,
) -> Result<Response, PageError> {
    save_package(&state, &storage, form.into_draft(Some(id)), PackageMode::Edit).await
}

/// On success back to the list, otherwise the same form with the draft kept
async fn save_package(
    state: &AppState,
    storage: &ClientStorage,
    draft: PackageDraft,
    mode: PackageMode,
) -> Result<Response, PageError> {
    let token = storage.token();
    match state.admin.save_package(token.as_deref(), &draft).await {
        Ok(()) => Ok(Redirect::to(PACKAGES_PATH).into_response()),
        Err(message) => render_packages(state, mode, &[], &draft, Some(message)),
    }
}

/// GET /admin/payments
pub async fn payments(
    State(state): State<AppState>,
    storage: ClientStorage,
    Query(query): Query<PaymentQuery>,
) -> Result<Response, PageError> {
    let token = storage.token();
    let (records, error) = match state.admin.payments(token.as_deref()).await {
        Ok(records) => (records, None),
        Err(message) => (Vec::new(), Some(message)),
    };

    let filtered = query.apply(&records);
    let mut context = TeraContext::new();
    context.insert("summary", &PaymentSummary::of(&filtered));
    context.insert("payments", &filtered);
    context.insert("status", &query.filter().as_str());
    context.insert("status_options", &STATUS_OPTIONS);
    context.insert("q", query.term());
    context.insert("narrowed", &query.is_narrowed());
    context.insert("error", &error);
    Ok(state.render("admin/payments.html", &context)?.into_response())
}

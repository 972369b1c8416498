//! Backend HTTP client
//!
//! A single configured reqwest client for the payment/auth backend:
//! - Base URL resolved per environment (see [`BackendConfig::resolve_base_url`])
//! - Bearer token attached to every request whose path contains `/admin`
//! - JSON request/response bodies
//!
//! Pages depend on the [`PortalBackend`] trait rather than on the concrete
//! client so they can be exercised against an in-memory backend.

use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use crate::config::BackendConfig;
use crate::models::{
    ConnectionDetailsResponse, DashboardStats, HotspotUser, InitiatePaymentResponse, LoginRequest,
    LoginResponse, Package, PackageDraft, PaymentRecord, PaymentRequest, PaymentStatusResponse,
    VerifyResponse,
};

/// Errors talking to the backend
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connection, TLS or timeout failure
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Backend responded with {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Body was not the expected JSON
    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Invalid backend base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Operations the portal pages perform against the backend
///
/// Admin operations take the session token read from client storage; it is
/// attached as a bearer token when present.
#[async_trait]
pub trait PortalBackend: Send + Sync {
    /// GET /packages
    async fn list_packages(&self) -> Result<Vec<Package>, ClientError>;

    /// POST /payments/initiate
    async fn initiate_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<InitiatePaymentResponse, ClientError>;

    /// GET /payments/status/:checkoutRequestId
    async fn payment_status(
        &self,
        checkout_request_id: &str,
    ) -> Result<PaymentStatusResponse, ClientError>;

    /// GET /connections/details/:checkoutRequestId
    async fn connection_details(
        &self,
        checkout_request_id: &str,
    ) -> Result<ConnectionDetailsResponse, ClientError>;

    /// POST /admin/login
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError>;

    /// GET /admin/verify
    async fn verify(&self, token: Option<&str>) -> Result<VerifyResponse, ClientError>;

    /// GET /admin/stats
    async fn stats(&self, token: Option<&str>) -> Result<DashboardStats, ClientError>;

    /// GET /admin/users/recent
    async fn recent_users(&self, token: Option<&str>) -> Result<Vec<HotspotUser>, ClientError>;

    /// GET /admin/payments/recent
    async fn recent_payments(&self, token: Option<&str>)
        -> Result<Vec<PaymentRecord>, ClientError>;

    /// GET /admin/users
    async fn users(&self, token: Option<&str>) -> Result<Vec<HotspotUser>, ClientError>;

    /// GET /admin/packages
    async fn admin_packages(&self, token: Option<&str>) -> Result<Vec<Package>, ClientError>;

    /// POST /admin/packages
    async fn create_package(
        &self,
        token: Option<&str>,
        draft: &PackageDraft,
    ) -> Result<(), ClientError>;

    /// PUT /admin/packages/:id
    async fn update_package(
        &self,
        token: Option<&str>,
        id: i64,
        draft: &PackageDraft,
    ) -> Result<(), ClientError>;

    /// GET /admin/payments
    async fn payments(&self, token: Option<&str>) -> Result<Vec<PaymentRecord>, ClientError>;
}

/// Whether a request path is admin scoped and should carry the token
pub fn is_admin_path(path: &str) -> bool {
    path.contains("/admin")
}

/// reqwest-backed [`PortalBackend`]
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Build a client from the backend configuration
    pub fn new(config: &BackendConfig) -> Result<Self, ClientError> {
        let base_url = config.resolve_base_url();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidBaseUrl(base_url));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a request, attaching the bearer token to admin paths
    ///
    /// An absent or empty token leaves the request unauthenticated; the
    /// backend is expected to reject it.
    pub fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match token.filter(|t| !t.is_empty()) {
            Some(token) if is_admin_path(path) => builder.bearer_auth(token),
            _ => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, ClientError> {
        let response = self.request(Method::GET, path, token).send().await?;
        decode(response).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self.request(method, path, token).json(body).send().await?;
        decode(response).await
    }

    async fn send_ignoring_body<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<(), ClientError> {
        let response = self.request(method, path, token).json(body).send().await?;
        check_status(response).await.map(|_| ())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status { status, body })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let response = check_status(response).await?;
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))
}

fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[async_trait]
impl PortalBackend for BackendClient {
    async fn list_packages(&self) -> Result<Vec<Package>, ClientError> {
        self.get_json("/packages", None).await
    }

    async fn initiate_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<InitiatePaymentResponse, ClientError> {
        self.send_json(Method::POST, "/payments/initiate", None, request).await
    }

    async fn payment_status(
        &self,
        checkout_request_id: &str,
    ) -> Result<PaymentStatusResponse, ClientError> {
        let path = format!("/payments/status/{}", segment(checkout_request_id));
        self.get_json(&path, None).await
    }

    async fn connection_details(
        &self,
        checkout_request_id: &str,
    ) -> Result<ConnectionDetailsResponse, ClientError> {
        let path = format!("/connections/details/{}", segment(checkout_request_id));
        self.get_json(&path, None).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        self.send_json(Method::POST, "/admin/login", None, request).await
    }

    async fn verify(&self, token: Option<&str>) -> Result<VerifyResponse, ClientError> {
        self.get_json("/admin/verify", token).await
    }

    async fn stats(&self, token: Option<&str>) -> Result<DashboardStats, ClientError> {
        self.get_json("/admin/stats", token).await
    }

    async fn recent_users(&self, token: Option<&str>) -> Result<Vec<HotspotUser>, ClientError> {
        self.get_json("/admin/users/recent", token).await
    }

    async fn recent_payments(
        &self,
        token: Option<&str>,
    ) -> Result<Vec<PaymentRecord>, ClientError> {
        self.get_json("/admin/payments/recent", token).await
    }

    async fn users(&self, token: Option<&str>) -> Result<Vec<HotspotUser>, ClientError> {
        self.get_json("/admin/users", token).await
    }

    async fn admin_packages(&self, token: Option<&str>) -> Result<Vec<Package>, ClientError> {
        self.get_json("/admin/packages", token).await
    }

    async fn create_package(
        &self,
        token: Option<&str>,
        draft: &PackageDraft,
    ) -> Result<(), ClientError> {
        self.send_ignoring_body(Method::POST, "/admin/packages", token, draft).await
    }

    async fn update_package(
        &self,
        token: Option<&str>,
        id: i64,
        draft: &PackageDraft,
    ) -> Result<(), ClientError> {
        let path = format!("/admin/packages/{}", id);
        self.send_ignoring_body(Method::PUT, &path, token, draft).await
    }

    async fn payments(&self, token: Option<&str>) -> Result<Vec<PaymentRecord>, ClientError> {
        self.get_json("/admin/payments", token).await
    }
}

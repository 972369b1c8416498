//! Checkout service
//!
//! Package selection and payment initiation for the public portal, plus the
//! one-shot connection details lookup of the success page.

use std::sync::Arc;

use crate::client::PortalBackend;
use crate::models::{ConnectionDetails, Package, PaymentRequest};
use crate::services::phone;

pub const PACKAGES_LOAD_ERROR: &str = "Failed to load packages. Please try again later.";
pub const INITIATION_FALLBACK: &str = "Payment initiation failed";
pub const DETAILS_UNAVAILABLE: &str = "Failed to retrieve connection details";
pub const DETAILS_ERROR: &str = "An error occurred. Please contact support.";

/// Errors surfaced on the checkout form
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckoutError {
    #[error("Please enter a valid Kenyan phone number")]
    InvalidPhone,

    #[error("Please select a package")]
    MissingPackage,

    /// Backend answered `success: false`
    #[error("{0}")]
    Rejected(String),

    #[error("Failed to initiate payment. Please try again.")]
    Unavailable,
}

/// Data behind the package selection page
#[derive(Debug, Clone, Default)]
pub struct CheckoutPage {
    pub packages: Vec<Package>,
    /// First package unless the visitor picked another one
    pub selected: Option<i64>,
    pub error: Option<String>,
}

/// A payment the backend accepted; the pending page polls it
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutStarted {
    pub checkout_request_id: String,
    pub phone_number: String,
}

pub struct CheckoutService {
    backend: Arc<dyn PortalBackend>,
}

impl CheckoutService {
    pub fn new(backend: Arc<dyn PortalBackend>) -> Self {
        Self { backend }
    }

    /// Fetch the package list and select the first package
    pub async fn load(&self) -> CheckoutPage {
        match self.backend.list_packages().await {
            Ok(packages) => CheckoutPage {
                selected: packages.first().map(|p| p.id),
                packages,
                error: None,
            },
            Err(e) => {
                tracing::warn!("Failed to load packages: {}", e);
                CheckoutPage {
                    error: Some(PACKAGES_LOAD_ERROR.to_string()),
                    ..Default::default()
                }
            }
        }
    }

    /// Validate the form and ask the backend to start the payment
    ///
    /// Validation happens before any network call. Every call is a single
    /// attempt.
    pub async fn submit(
        &self,
        phone_input: &str,
        package_id: Option<i64>,
    ) -> Result<CheckoutStarted, CheckoutError> {
        let phone_number = phone::normalize(phone_input).ok_or(CheckoutError::InvalidPhone)?;
        let package_id = package_id.ok_or(CheckoutError::MissingPackage)?;

        let request = PaymentRequest {
            phone_number: phone_number.clone(),
            package_id,
        };

        let response = self.backend.initiate_payment(&request).await.map_err(|e| {
            tracing::warn!("Payment initiation failed: {}", e);
            CheckoutError::Unavailable
        })?;

        let rejected = |message: Option<String>| {
            CheckoutError::Rejected(
                message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| INITIATION_FALLBACK.to_string()),
            )
        };

        if !response.success {
            return Err(rejected(response.message));
        }

        match response.checkout_request_id.filter(|id| !id.is_empty()) {
            Some(checkout_request_id) => {
                tracing::info!(%checkout_request_id, package_id, "Payment initiated");
                Ok(CheckoutStarted {
                    checkout_request_id,
                    phone_number,
                })
            }
            None => {
                tracing::warn!("Backend accepted payment without a checkout request id");
                Err(rejected(response.message))
            }
        }
    }

    /// Look up the credentials for a confirmed payment, once
    pub async fn connection_details(
        &self,
        checkout_request_id: &str,
    ) -> Result<ConnectionDetails, &'static str> {
        match self.backend.connection_details(checkout_request_id).await {
            Ok(response) if response.success => response.connection.ok_or(DETAILS_UNAVAILABLE),
            Ok(_) => Err(DETAILS_UNAVAILABLE),
            Err(e) => {
                tracing::warn!(%checkout_request_id, "Connection details lookup failed: {}", e);
                Err(DETAILS_ERROR)
            }
        }
    }
}

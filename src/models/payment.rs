//! Payment models
//!
//! Request/response shapes of the payment endpoints and the payment history
//! records shown to admins.

use serde::{Deserialize, Serialize};

/// Server reported payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(anyhow::anyhow!("Invalid payment status: {}", s)),
        }
    }
}

/// Body of `POST /payments/initiate`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Normalized `254XXXXXXXXX` number
    pub phone_number: String,
    pub package_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub checkout_request_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `GET /payments/status/:id`
///
/// The status is kept as a string: anything other than the three known
/// values is ignored by the poller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusResponse {
    #[serde(default)]
    pub status: String,
}

impl PaymentStatusResponse {
    pub fn parsed(&self) -> Option<PaymentStatus> {
        self.status.parse().ok()
    }
}

/// Credentials handed out once a payment is confirmed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDetails {
    pub username: String,
    pub password: String,
    pub expires_at: String,
    pub package_name: String,
    pub duration: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDetailsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub connection: Option<ConnectionDetails>,
}

/// Payment row of the admin history and the dashboard's recent list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: i64,
    pub phone_number: String,
    pub amount: f64,
    pub status: String,
    pub package_name: String,
    #[serde(default)]
    pub mpesa_receipt_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

//! Admin back-office models

use serde::{Deserialize, Serialize};

/// Body of `POST /admin/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub authenticated: bool,
}

/// Aggregate numbers shown on the dashboard cards
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub active_users: i64,
    #[serde(default)]
    pub total_users: i64,
    #[serde(default)]
    pub total_packages: i64,
    #[serde(default)]
    pub total_payments: i64,
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub success_rate: f64,
}

/// Hotspot account created for a paying customer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HotspotUser {
    pub id: i64,
    pub username: String,
    pub phone_number: String,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub package_name: String,
    #[serde(default)]
    pub active: bool,
}

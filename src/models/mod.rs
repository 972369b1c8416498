//! Data models
//!
//! Plain records exchanged with the payment backend. The portal holds no
//! authoritative state, only copies fetched for rendering:
//! - Packages and the admin package draft
//! - Payment requests, statuses, connection details and history records
//! - Admin login, dashboard and user records

mod admin;
mod package;
mod payment;

pub use admin::{DashboardStats, HotspotUser, LoginRequest, LoginResponse, VerifyResponse};
pub use package::{coerce_number, format_duration, Package, PackageDraft, PackageForm};
pub use payment::{
    ConnectionDetails, ConnectionDetailsResponse, InitiatePaymentResponse, PaymentRecord,
    PaymentRequest, PaymentStatus, PaymentStatusResponse,
};

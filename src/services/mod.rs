//! Services layer - page logic
//!
//! This module contains the behaviour behind each page, independent of HTTP:
//! - Phone number validation and normalization
//! - Checkout (package list, payment initiation, connection details)
//! - Payment watch: the countdown + status polling loop
//! - Watch registry owning running payment watches
//! - Admin session (verify/login/logout) and the route guard decision
//! - Admin back-office data (dashboard, users, packages, payment history)

pub mod admin;
pub mod auth;
pub mod checkout;
pub mod payment_watch;
pub mod phone;
pub mod watch_registry;

pub use admin::{AdminService, DashboardData, PaymentQuery, PaymentSummary, StatusFilter};
pub use auth::{guard, AuthService, AuthSession, AuthState, GuardDecision, TokenStore};
pub use checkout::{CheckoutError, CheckoutPage, CheckoutService, CheckoutStarted};
pub use payment_watch::{format_countdown, Destination, PaymentWatch, WatchSettings, WatchSnapshot};
pub use watch_registry::WatchRegistry;

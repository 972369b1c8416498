//! Hotspot portal - WiFi captive-portal payments and admin back-office
//!
//! This library provides the server-rendered portal: package selection, M-Pesa
//! payment confirmation polling, and the admin pages, all backed by an
//! external payment/auth REST API.

pub mod api;
pub mod client;
pub mod config;
pub mod models;
pub mod services;
pub mod theme;

#[cfg(test)]
pub(crate) mod testing;

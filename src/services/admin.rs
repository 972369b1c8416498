//! Admin back-office data
//!
//! Fetches for the dashboard, users, packages and payments pages, and the
//! in-memory filtering of the payment history.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::client::PortalBackend;
use crate::models::{
    DashboardStats, HotspotUser, Package, PackageDraft, PaymentRecord, PaymentStatus,
};

pub const DASHBOARD_LOAD_ERROR: &str = "Failed to load dashboard data";
pub const DASHBOARD_REFRESH_ERROR: &str = "Failed to refresh dashboard data";
pub const USERS_LOAD_ERROR: &str = "Failed to load users data";
pub const PACKAGES_LOAD_ERROR: &str = "Failed to load packages data";
pub const PACKAGE_ADD_ERROR: &str = "Failed to add package";
pub const PACKAGE_UPDATE_ERROR: &str = "Failed to update package";
pub const PAYMENTS_LOAD_ERROR: &str = "Failed to load payments data";

/// Everything the dashboard shows, fetched together
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardData {
    pub stats: DashboardStats,
    pub recent_users: Vec<HotspotUser>,
    pub recent_payments: Vec<PaymentRecord>,
}

/// Status dropdown of the payments page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(PaymentStatus),
}

impl StatusFilter {
    /// Unknown values show everything
    pub fn parse(value: &str) -> Self {
        match value.parse::<PaymentStatus>() {
            Ok(status) => Self::Only(status),
            Err(_) => Self::All,
        }
    }

    pub fn as_str(&self) -> String {
        match self {
            Self::All => "all".to_string(),
            Self::Only(status) => status.to_string(),
        }
    }

    pub fn matches(&self, record: &PaymentRecord) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => record.status == status.to_string(),
        }
    }
}

/// Query string of the payments page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentQuery {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub q: String,
}

impl PaymentQuery {
    pub fn filter(&self) -> StatusFilter {
        StatusFilter::parse(&self.status)
    }

    pub fn term(&self) -> &str {
        self.q.trim()
    }

    /// A status or search term is narrowing the list
    pub fn is_narrowed(&self) -> bool {
        self.filter() != StatusFilter::All || !self.term().is_empty()
    }

    /// Phone and receipt match as substrings, package name ignoring case
    pub fn matches(&self, record: &PaymentRecord) -> bool {
        if !self.filter().matches(record) {
            return false;
        }

        let term = self.term();
        if term.is_empty() {
            return true;
        }

        record.phone_number.contains(term)
            || record
                .package_name
                .to_lowercase()
                .contains(&term.to_lowercase())
            || record
                .mpesa_receipt_number
                .as_deref()
                .is_some_and(|receipt| receipt.contains(term))
    }

    pub fn apply(&self, records: &[PaymentRecord]) -> Vec<PaymentRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// Totals shown above the payments table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaymentSummary {
    pub count: usize,
    pub completed: usize,
    pub revenue: f64,
}

impl PaymentSummary {
    pub fn of(records: &[PaymentRecord]) -> Self {
        let completed: Vec<&PaymentRecord> = records
            .iter()
            .filter(|r| r.status == PaymentStatus::Completed.to_string())
            .collect();

        Self {
            count: records.len(),
            completed: completed.len(),
            revenue: completed.iter().map(|r| r.amount).sum(),
        }
    }
}

pub struct AdminService {
    backend: Arc<dyn PortalBackend>,
}

impl AdminService {
    pub fn new(backend: Arc<dyn PortalBackend>) -> Self {
        Self { backend }
    }

    /// Stats, recent users and recent payments; all three or nothing
    pub async fn dashboard(
        &self,
        token: Option<&str>,
        refresh: bool,
    ) -> Result<DashboardData, &'static str> {
        let fetched = tokio::try_join!(
            self.backend.stats(token),
            self.backend.recent_users(token),
            self.backend.recent_payments(token),
        );

        match fetched {
            Ok((stats, recent_users, recent_payments)) => Ok(DashboardData {
                stats,
                recent_users,
                recent_payments,
            }),
            Err(e) => {
                tracing::warn!(refresh, "Dashboard fetch failed: {}", e);
                Err(if refresh {
                    DASHBOARD_REFRESH_ERROR
                } else {
                    DASHBOARD_LOAD_ERROR
                })
            }
        }
    }

    pub async fn users(&self, token: Option<&str>) -> Result<Vec<HotspotUser>, &'static str> {
        self.backend.users(token).await.map_err(|e| {
            tracing::warn!("Users fetch failed: {}", e);
            USERS_LOAD_ERROR
        })
    }

    pub async fn packages(&self, token: Option<&str>) -> Result<Vec<Package>, &'static str> {
        self.backend.admin_packages(token).await.map_err(|e| {
            tracing::warn!("Packages fetch failed: {}", e);
            PACKAGES_LOAD_ERROR
        })
    }

    /// Draft for the edit form of an existing package
    pub async fn package_draft(
        &self,
        token: Option<&str>,
        id: i64,
    ) -> Result<Option<PackageDraft>, &'static str> {
        let packages = self.packages(token).await?;
        Ok(packages.iter().find(|p| p.id == id).map(PackageDraft::from))
    }

    /// POST a new package or PUT an existing one, depending on `draft.id`
    pub async fn save_package(
        &self,
        token: Option<&str>,
        draft: &PackageDraft,
    ) -> Result<(), &'static str> {
        let result = match draft.id {
            Some(id) => self.backend.update_package(token, id, draft).await,
            None => self.backend.create_package(token, draft).await,
        };

        match (result, draft.id) {
            (Ok(()), id) => {
                tracing::info!(?id, name = %draft.name, "Package saved");
                Ok(())
            }
            (Err(e), Some(id)) => {
                tracing::warn!(id, "Package update failed: {}", e);
                Err(PACKAGE_UPDATE_ERROR)
            }
            (Err(e), None) => {
                tracing::warn!("Package creation failed: {}", e);
                Err(PACKAGE_ADD_ERROR)
            }
        }
    }

    pub async fn payments(&self, token: Option<&str>) -> Result<Vec<PaymentRecord>, &'static str> {
        self.backend.payments(token).await.map_err(|e| {
            tracing::warn!("Payments fetch failed: {}", e);
            PAYMENTS_LOAD_ERROR
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_payments, FakeBackend, ADMIN_TOKEN};
    use proptest::prelude::*;

    fn service() -> (Arc<FakeBackend>, AdminService) {
        let backend = Arc::new(FakeBackend::new());
        (backend.clone(), AdminService::new(backend))
    }

    fn query(status: &str, q: &str) -> PaymentQuery {
        PaymentQuery {
            status: status.to_string(),
            q: q.to_string(),
        }
    }

    #[tokio::test]
    async fn test_dashboard_issues_three_fetches() {
        let (backend, admin) = service();
        let data = admin.dashboard(Some(ADMIN_TOKEN), false).await.unwrap();

        assert_eq!(data.stats.active_users, 12);
        assert_eq!(data.recent_users.len(), 1);
        assert_eq!(data.recent_payments.len(), 4);

        let mut calls = backend.admin_calls();
        calls.sort();
        assert_eq!(
            calls,
            vec![
                "GET /admin/payments/recent",
                "GET /admin/stats",
                "GET /admin/users/recent",
            ]
        );
    }

    #[tokio::test]
    async fn test_dashboard_is_all_or_nothing() {
        let (backend, admin) = service();
        *backend.recent_payments.lock().unwrap() = None;

        assert_eq!(
            admin.dashboard(Some(ADMIN_TOKEN), false).await.unwrap_err(),
            DASHBOARD_LOAD_ERROR
        );
        assert_eq!(
            admin.dashboard(Some(ADMIN_TOKEN), true).await.unwrap_err(),
            DASHBOARD_REFRESH_ERROR
        );
    }

    #[tokio::test]
    async fn test_admin_fetches_require_token() {
        let (_, admin) = service();
        assert_eq!(admin.users(None).await.unwrap_err(), USERS_LOAD_ERROR);
        assert_eq!(admin.packages(Some("bad")).await.unwrap_err(), PACKAGES_LOAD_ERROR);
        assert_eq!(admin.payments(None).await.unwrap_err(), PAYMENTS_LOAD_ERROR);
        assert_eq!(admin.users(Some(ADMIN_TOKEN)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_package_then_list_shows_it() {
        let (_, admin) = service();
        let draft = PackageDraft {
            name: "Monthly".to_string(),
            price: 800.0,
            minutes: 43200,
            ..Default::default()
        };

        admin.save_package(Some(ADMIN_TOKEN), &draft).await.unwrap();

        let packages = admin.packages(Some(ADMIN_TOKEN)).await.unwrap();
        assert_eq!(packages.len(), 4);
        assert!(packages.iter().any(|p| p.name == "Monthly" && p.active));
    }

    #[tokio::test]
    async fn test_edit_package_uses_put() {
        let (backend, admin) = service();
        let mut draft = admin
            .package_draft(Some(ADMIN_TOKEN), 2)
            .await
            .unwrap()
            .unwrap();
        draft.price = 60.0;

        admin.save_package(Some(ADMIN_TOKEN), &draft).await.unwrap();

        assert!(backend
            .admin_calls()
            .contains(&"PUT /admin/packages/2".to_string()));
        let packages = admin.packages(Some(ADMIN_TOKEN)).await.unwrap();
        assert_eq!(packages.iter().find(|p| p.id == 2).unwrap().price, 60.0);
    }

    #[tokio::test]
    async fn test_save_failures_are_mode_specific() {
        let (backend, admin) = service();
        *backend.fail_saves.lock().unwrap() = true;

        let mut draft = PackageDraft::default();
        assert_eq!(
            admin.save_package(Some(ADMIN_TOKEN), &draft).await.unwrap_err(),
            PACKAGE_ADD_ERROR
        );
        draft.id = Some(1);
        assert_eq!(
            admin.save_package(Some(ADMIN_TOKEN), &draft).await.unwrap_err(),
            PACKAGE_UPDATE_ERROR
        );
    }

    #[tokio::test]
    async fn test_unknown_package_has_no_draft() {
        let (_, admin) = service();
        assert_eq!(admin.package_draft(Some(ADMIN_TOKEN), 99).await.unwrap(), None);
    }

    #[test]
    fn test_status_filter_parsing() {
        assert_eq!(StatusFilter::parse("all"), StatusFilter::All);
        assert_eq!(StatusFilter::parse(""), StatusFilter::All);
        assert_eq!(StatusFilter::parse("bogus"), StatusFilter::All);
        assert_eq!(
            StatusFilter::parse("completed"),
            StatusFilter::Only(PaymentStatus::Completed)
        );
        assert_eq!(StatusFilter::parse("failed").as_str(), "failed");
    }

    #[test]
    fn test_filter_by_status() {
        let records = sample_payments();
        let completed = query("completed", "").apply(&records);
        assert_eq!(completed.len(), 2);
        assert!(completed.iter().all(|r| r.status == "completed"));
    }

    #[test]
    fn test_search_fields() {
        let records = sample_payments();
        assert_eq!(query("all", "2547987").apply(&records)[0].id, 2);
        assert_eq!(query("all", "weekly").apply(&records)[0].id, 3);
        assert_eq!(query("all", "  QGH7ABC2 ").apply(&records)[0].id, 4);
        assert_eq!(query("all", "hourly").apply(&records).len(), 2);
        assert_eq!(query("completed", "hourly").apply(&records).len(), 1);
    }

    #[test]
    fn test_no_results() {
        let records = sample_payments();
        let filtered = query("pending", "Weekly").apply(&records);
        assert!(filtered.is_empty());
        assert_eq!(PaymentSummary::of(&filtered), PaymentSummary::default());

        let filtered = query("completed", "254799999999").apply(&records);
        assert!(filtered.is_empty());
        assert_eq!(PaymentSummary::of(&filtered), PaymentSummary::default());
    }

    #[test]
    fn test_narrowed_queries() {
        assert!(!query("all", "").is_narrowed());
        assert!(!query("bogus", "   ").is_narrowed());
        assert!(query("completed", "").is_narrowed());
        assert!(query("all", "QGH7").is_narrowed());
    }

    #[test]
    fn test_summary_counts_completed_revenue() {
        let summary = PaymentSummary::of(&sample_payments());
        assert_eq!(summary.count, 4);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.revenue, 100.0);
    }

    proptest! {
        #[test]
        fn filtered_payments_are_a_subset(
            status in "(all|pending|completed|failed|x)",
            q in "[a-zA-Z0-9 ]{0,6}",
        ) {
            let records = sample_payments();
            let query = query(&status, &q);
            let filtered = query.apply(&records);

            prop_assert!(filtered.len() <= records.len());
            for record in &filtered {
                prop_assert!(records.contains(record));
                prop_assert!(query.filter().matches(record));
            }
        }

        #[test]
        fn empty_search_keeps_status_matches(status in "(all|pending|completed|failed)") {
            let records = sample_payments();
            let filtered = query(&status, "   ").apply(&records);
            let filter = StatusFilter::parse(&status);
            let expected = records.iter().filter(|r| filter.matches(r)).count();
            prop_assert_eq!(filtered.len(), expected);
        }
    }
}

//! In-memory backend used by unit and router tests

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::client::{ClientError, PortalBackend};
use crate::models::{
    ConnectionDetails, ConnectionDetailsResponse, DashboardStats, HotspotUser,
    InitiatePaymentResponse, LoginRequest, LoginResponse, Package, PackageDraft, PaymentRecord,
    PaymentRequest, PaymentStatusResponse, VerifyResponse,
};

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "hunter2";
pub const ADMIN_TOKEN: &str = "token-abc";

/// Scripted backend; `None` in a slot means "respond with HTTP 500"
pub struct FakeBackend {
    pub packages: Mutex<Option<Vec<Package>>>,
    pub initiate: Mutex<Option<InitiatePaymentResponse>>,
    pub initiated: Mutex<Vec<PaymentRequest>>,
    /// Consumed one per poll, then `status_default` repeats
    pub statuses: Mutex<VecDeque<Option<String>>>,
    pub status_default: Mutex<Option<String>>,
    pub status_polls: AtomicUsize,
    pub connection: Mutex<Option<ConnectionDetailsResponse>>,
    pub stats: Mutex<Option<DashboardStats>>,
    pub recent_users: Mutex<Option<Vec<HotspotUser>>>,
    pub recent_payments: Mutex<Option<Vec<PaymentRecord>>>,
    pub users: Mutex<Option<Vec<HotspotUser>>>,
    pub admin_packages: Mutex<Option<Vec<Package>>>,
    pub payments: Mutex<Option<Vec<PaymentRecord>>>,
    pub fail_saves: Mutex<bool>,
    pub verify_calls: AtomicUsize,
    /// Admin endpoints hit, in order
    pub admin_calls: Mutex<Vec<String>>,
}

fn server_error() -> ClientError {
    ClientError::Status {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "boom".to_string(),
    }
}

fn unauthorized() -> ClientError {
    ClientError::Status {
        status: StatusCode::UNAUTHORIZED,
        body: "unauthorized".to_string(),
    }
}

fn slot<T: Clone>(slot: &Mutex<Option<T>>) -> Result<T, ClientError> {
    slot.lock().unwrap().clone().ok_or_else(server_error)
}

pub fn package(id: i64, name: &str, price: f64, minutes: i64) -> Package {
    Package {
        id,
        name: name.to_string(),
        duration: Some(format!("{} minutes", minutes)),
        price,
        description: format!("{} of browsing", name),
        minutes,
        active: true,
        created_at: Some("2025-03-01T08:00:00Z".to_string()),
    }
}

pub fn payment(
    id: i64,
    phone: &str,
    status: &str,
    package: &str,
    receipt: Option<&str>,
) -> PaymentRecord {
    PaymentRecord {
        id,
        phone_number: phone.to_string(),
        amount: 50.0,
        status: status.to_string(),
        package_name: package.to_string(),
        mpesa_receipt_number: receipt.map(str::to_string),
        created_at: Some("2025-03-05T14:30:00Z".to_string()),
        completed_at: None,
    }
}

pub fn user(id: i64, username: &str, phone: &str) -> HotspotUser {
    HotspotUser {
        id,
        username: username.to_string(),
        phone_number: phone.to_string(),
        expires_at: Some("2025-03-06T14:30:00Z".to_string()),
        package_name: "Daily".to_string(),
        active: true,
    }
}

pub fn sample_payments() -> Vec<PaymentRecord> {
    vec![
        payment(1, "254712345678", "completed", "Daily", Some("QGH7XYZ1")),
        payment(2, "254798765432", "pending", "Hourly", None),
        payment(3, "254711111111", "failed", "Weekly", None),
        payment(4, "254722222222", "completed", "Hourly", Some("QGH7ABC2")),
    ]
}

impl FakeBackend {
    pub fn new() -> Self {
        let packages = vec![
            package(1, "Hourly", 10.0, 60),
            package(2, "Daily", 50.0, 1440),
            package(3, "Weekly", 250.0, 10080),
        ];
        Self {
            packages: Mutex::new(Some(packages.clone())),
            initiate: Mutex::new(Some(InitiatePaymentResponse {
                success: true,
                checkout_request_id: Some("ws_CO_TEST".to_string()),
                message: None,
            })),
            initiated: Mutex::new(Vec::new()),
            statuses: Mutex::new(VecDeque::new()),
            status_default: Mutex::new(Some("pending".to_string())),
            status_polls: AtomicUsize::new(0),
            connection: Mutex::new(Some(ConnectionDetailsResponse {
                success: true,
                connection: Some(ConnectionDetails {
                    username: "user254712".to_string(),
                    password: "pw-4821".to_string(),
                    expires_at: "2025-03-06T14:30:00Z".to_string(),
                    package_name: "Daily".to_string(),
                    duration: "24 hours".to_string(),
                }),
            })),
            stats: Mutex::new(Some(DashboardStats {
                active_users: 12,
                total_users: 40,
                total_packages: 3,
                total_payments: 58,
                revenue: 4200.0,
                success_rate: 87.5,
            })),
            recent_users: Mutex::new(Some(vec![user(1, "user254712", "254712345678")])),
            recent_payments: Mutex::new(Some(sample_payments())),
            users: Mutex::new(Some(vec![
                user(1, "user254712", "254712345678"),
                user(2, "user254798", "254798765432"),
            ])),
            admin_packages: Mutex::new(Some(packages)),
            payments: Mutex::new(Some(sample_payments())),
            fail_saves: Mutex::new(false),
            verify_calls: AtomicUsize::new(0),
            admin_calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue poll responses; `None` entries fail the poll
    pub fn script_statuses(&self, statuses: &[Option<&str>]) {
        let mut queue = self.statuses.lock().unwrap();
        queue.extend(statuses.iter().map(|s| s.map(str::to_string)));
    }

    pub fn polls(&self) -> usize {
        self.status_polls.load(Ordering::SeqCst)
    }

    pub fn admin_calls(&self) -> Vec<String> {
        self.admin_calls.lock().unwrap().clone()
    }

    fn admin(&self, token: Option<&str>, call: &str) -> Result<(), ClientError> {
        self.admin_calls.lock().unwrap().push(call.to_string());
        if token == Some(ADMIN_TOKEN) {
            Ok(())
        } else {
            Err(unauthorized())
        }
    }
}

#[async_trait]
impl PortalBackend for FakeBackend {
    async fn list_packages(&self) -> Result<Vec<Package>, ClientError> {
        slot(&self.packages)
    }

    async fn initiate_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<InitiatePaymentResponse, ClientError> {
        self.initiated.lock().unwrap().push(request.clone());
        slot(&self.initiate)
    }

    async fn payment_status(&self, _id: &str) -> Result<PaymentStatusResponse, ClientError> {
        self.status_polls.fetch_add(1, Ordering::SeqCst);
        let next = self.statuses.lock().unwrap().pop_front();
        let status = match next {
            Some(scripted) => scripted,
            None => self.status_default.lock().unwrap().clone(),
        };
        status
            .map(|status| PaymentStatusResponse { status })
            .ok_or_else(server_error)
    }

    async fn connection_details(
        &self,
        _id: &str,
    ) -> Result<ConnectionDetailsResponse, ClientError> {
        slot(&self.connection)
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        if request.username == ADMIN_USER && request.password == ADMIN_PASSWORD {
            Ok(LoginResponse {
                token: Some(ADMIN_TOKEN.to_string()),
            })
        } else {
            Err(unauthorized())
        }
    }

    async fn verify(&self, token: Option<&str>) -> Result<VerifyResponse, ClientError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.admin(token, "GET /admin/verify")?;
        Ok(VerifyResponse {
            authenticated: true,
        })
    }

    async fn stats(&self, token: Option<&str>) -> Result<DashboardStats, ClientError> {
        self.admin(token, "GET /admin/stats")?;
        slot(&self.stats)
    }

    async fn recent_users(&self, token: Option<&str>) -> Result<Vec<HotspotUser>, ClientError> {
        self.admin(token, "GET /admin/users/recent")?;
        slot(&self.recent_users)
    }

    async fn recent_payments(
        &self,
        token: Option<&str>,
    ) -> Result<Vec<PaymentRecord>, ClientError> {
        self.admin(token, "GET /admin/payments/recent")?;
        slot(&self.recent_payments)
    }

    async fn users(&self, token: Option<&str>) -> Result<Vec<HotspotUser>, ClientError> {
        self.admin(token, "GET /admin/users")?;
        slot(&self.users)
    }

    async fn admin_packages(&self, token: Option<&str>) -> Result<Vec<Package>, ClientError> {
        self.admin(token, "GET /admin/packages")?;
        slot(&self.admin_packages)
    }

    async fn create_package(
        &self,
        token: Option<&str>,
        draft: &PackageDraft,
    ) -> Result<(), ClientError> {
        self.admin(token, "POST /admin/packages")?;
        if *self.fail_saves.lock().unwrap() {
            return Err(server_error());
        }
        let mut packages = self.admin_packages.lock().unwrap();
        let list = packages.get_or_insert_with(Vec::new);
        let id = list.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        list.push(Package {
            id,
            name: draft.name.clone(),
            duration: None,
            price: draft.price,
            description: draft.description.clone(),
            minutes: draft.minutes,
            active: draft.active,
            created_at: Some("2025-03-07T09:00:00Z".to_string()),
        });
        Ok(())
    }

    async fn update_package(
        &self,
        token: Option<&str>,
        id: i64,
        draft: &PackageDraft,
    ) -> Result<(), ClientError> {
        self.admin(token, &format!("PUT /admin/packages/{}", id))?;
        if *self.fail_saves.lock().unwrap() {
            return Err(server_error());
        }
        let mut packages = self.admin_packages.lock().unwrap();
        if let Some(existing) = packages.iter_mut().flatten().find(|p| p.id == id) {
            existing.name = draft.name.clone();
            existing.description = draft.description.clone();
            existing.price = draft.price;
            existing.minutes = draft.minutes;
            existing.active = draft.active;
        }
        Ok(())
    }

    async fn payments(&self, token: Option<&str>) -> Result<Vec<PaymentRecord>, ClientError> {
        self.admin(token, "GET /admin/payments")?;
        slot(&self.payments)
    }
}

//! Payment watch
//!
//! Drives the pending page of a single checkout. Two tasks share one
//! snapshot:
//! - the countdown ticks once per `tick` from `countdown_seconds` to zero and
//!   only affects what the page shows
//! - the poller asks the backend for the payment status immediately and then
//!   every `poll_interval`, until the payment is completed or failed or
//!   `max_poll` has elapsed
//!
//! A terminal status stops the countdown, freezes the status and, after
//! `redirect_delay`, publishes the page the visitor is sent to. Both tasks are
//! aborted when the watch is cancelled or dropped.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};

use crate::client::PortalBackend;
use crate::config::PaymentConfig;
use crate::models::PaymentStatus;

/// Timer settings of a watch
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub countdown_seconds: u32,
    pub tick: Duration,
    pub poll_interval: Duration,
    pub redirect_delay: Duration,
    pub max_poll: Duration,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self::from(&PaymentConfig::default())
    }
}

impl From<&PaymentConfig> for WatchSettings {
    fn from(config: &PaymentConfig) -> Self {
        Self {
            countdown_seconds: config.countdown_seconds,
            tick: config.tick(),
            poll_interval: config.poll_interval(),
            redirect_delay: config.redirect_delay(),
            max_poll: config.max_poll(),
        }
    }
}

/// Where the pending page sends the visitor once the payment settles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Success,
    Failure,
}

impl Destination {
    pub fn for_status(status: PaymentStatus) -> Option<Self> {
        match status {
            PaymentStatus::Completed => Some(Self::Success),
            PaymentStatus::Failed => Some(Self::Failure),
            PaymentStatus::Pending => None,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Success => "/payment/success",
            Self::Failure => "/payment/failure",
        }
    }
}

/// Point-in-time view of a watch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchSnapshot {
    pub checkout_request_id: String,
    pub status: PaymentStatus,
    pub seconds_left: u32,
    /// Countdown reached zero; polling is unaffected
    pub expired: bool,
    /// Poller still running
    pub polling: bool,
    /// Status requests issued so far
    pub polls: u32,
    pub destination: Option<Destination>,
}

impl WatchSnapshot {
    fn new(checkout_request_id: String, countdown_seconds: u32) -> Self {
        Self {
            checkout_request_id,
            status: PaymentStatus::Pending,
            seconds_left: countdown_seconds,
            expired: countdown_seconds == 0,
            polling: true,
            polls: 0,
            destination: None,
        }
    }

    /// Countdown as `MM:SS`
    pub fn countdown(&self) -> String {
        format_countdown(self.seconds_left)
    }

    pub fn redirect_to(&self) -> Option<&'static str> {
        self.destination.map(Destination::path)
    }

    /// Polling gave up while the payment was still pending
    pub fn is_unconfirmed(&self) -> bool {
        !self.polling && self.status == PaymentStatus::Pending
    }
}

/// Format seconds as `MM:SS`
pub fn format_countdown(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Countdown and poller of one checkout
pub struct PaymentWatch {
    state: Arc<watch::Sender<WatchSnapshot>>,
    countdown: JoinHandle<()>,
    poller: JoinHandle<()>,
}

impl std::fmt::Debug for PaymentWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentWatch")
            .field("snapshot", &*self.state.borrow())
            .field("active", &self.is_active())
            .finish()
    }
}

impl PaymentWatch {
    /// Spawn both tasks on the current runtime
    pub fn start(
        backend: Arc<dyn PortalBackend>,
        checkout_request_id: impl Into<String>,
        settings: WatchSettings,
    ) -> Self {
        let checkout_request_id = checkout_request_id.into();
        let (tx, _) = watch::channel(WatchSnapshot::new(
            checkout_request_id.clone(),
            settings.countdown_seconds,
        ));
        let state = Arc::new(tx);

        let countdown = tokio::spawn(run_countdown(state.clone(), settings.tick));
        let poller = tokio::spawn(run_poller(
            backend,
            state.clone(),
            countdown.abort_handle(),
            checkout_request_id,
            settings,
        ));

        Self {
            state,
            countdown,
            poller,
        }
    }

    pub fn snapshot(&self) -> WatchSnapshot {
        self.state.borrow().clone()
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<WatchSnapshot> {
        self.state.subscribe()
    }

    /// Abort both tasks; the last snapshot stays readable
    pub fn cancel(&self) {
        self.countdown.abort();
        self.poller.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.poller.is_finished()
    }
}

impl Drop for PaymentWatch {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_countdown(state: Arc<watch::Sender<WatchSnapshot>>, tick: Duration) {
    if state.borrow().seconds_left == 0 {
        return;
    }

    let mut ticker = interval_at(Instant::now() + tick, tick);
    loop {
        ticker.tick().await;

        let mut finished = false;
        state.send_modify(|s| {
            s.seconds_left = s.seconds_left.saturating_sub(1);
            if s.seconds_left == 0 {
                s.expired = true;
                finished = true;
            }
        });

        if finished {
            tracing::debug!(
                checkout_request_id = %state.borrow().checkout_request_id,
                "Payment countdown expired"
            );
            return;
        }
    }
}

async fn run_poller(
    backend: Arc<dyn PortalBackend>,
    state: Arc<watch::Sender<WatchSnapshot>>,
    countdown: AbortHandle,
    checkout_request_id: String,
    settings: WatchSettings,
) {
    let started = Instant::now();
    let mut ticker = interval(settings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if started.elapsed() >= settings.max_poll {
            tracing::info!(%checkout_request_id, "Stopped polling unconfirmed payment");
            state.send_modify(|s| s.polling = false);
            return;
        }

        state.send_modify(|s| s.polls += 1);

        let response = match backend.payment_status(&checkout_request_id).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%checkout_request_id, "Error checking payment status: {}", e);
                continue;
            }
        };

        let status = match response.parsed() {
            Some(status) => status,
            None => {
                tracing::debug!(
                    %checkout_request_id,
                    status = %response.status,
                    "Ignoring unknown payment status"
                );
                continue;
            }
        };

        let Some(destination) = Destination::for_status(status) else {
            continue;
        };

        countdown.abort();
        state.send_modify(|s| {
            s.status = status;
            s.polling = false;
        });
        tracing::info!(%checkout_request_id, %status, "Payment settled");

        tokio::time::sleep(settings.redirect_delay).await;
        state.send_modify(|s| s.destination = Some(destination));
        return;
    }
}

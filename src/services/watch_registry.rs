//! Running payment watches keyed by checkout request id
//!
//! Backed by a moka cache with time-to-idle expiry. A pending page that stops
//! being viewed lets its watch go idle; eviction cancels the watch's tasks.
//!
//! Checkouts whose polling ran out are remembered for a while so a reload
//! shows the unconfirmed state instead of polling from scratch.

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::client::PortalBackend;
use crate::config::PaymentConfig;
use crate::services::payment_watch::{PaymentWatch, WatchSettings, WatchSnapshot};

/// Upper bound on concurrently watched checkouts
const MAX_WATCHES: u64 = 10_000;

/// How long an unconfirmed checkout stays unconfirmed
const UNCONFIRMED_TTL: Duration = Duration::from_secs(3600);

pub struct WatchRegistry {
    backend: Arc<dyn PortalBackend>,
    settings: WatchSettings,
    watches: Cache<String, Arc<PaymentWatch>>,
    unconfirmed: Cache<String, WatchSnapshot>,
}

impl std::fmt::Debug for WatchRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchRegistry")
            .field("entry_count", &self.watches.entry_count())
            .field("unconfirmed", &self.unconfirmed.entry_count())
            .field("settings", &self.settings)
            .finish()
    }
}

impl WatchRegistry {
    pub fn new(backend: Arc<dyn PortalBackend>, config: &PaymentConfig) -> Self {
        Self::with_idle(backend, WatchSettings::from(config), config.watch_idle())
    }

    pub fn with_idle(
        backend: Arc<dyn PortalBackend>,
        settings: WatchSettings,
        idle: Duration,
    ) -> Self {
        let watches = Cache::builder()
            .max_capacity(MAX_WATCHES)
            .time_to_idle(idle)
            .eviction_listener(|id: Arc<String>, watch: Arc<PaymentWatch>, cause| {
                tracing::debug!(checkout_request_id = %id, ?cause, "Payment watch evicted");
                watch.cancel();
            })
            .build();

        let unconfirmed = Cache::builder()
            .max_capacity(MAX_WATCHES)
            .time_to_live(UNCONFIRMED_TTL)
            .build();

        Self {
            backend,
            settings,
            watches,
            unconfirmed,
        }
    }

    /// Current state of a checkout as the pending page sees it
    ///
    /// Starts the watch on first view. Once polling has given up the final
    /// snapshot is kept, and later views return it without a new watch.
    pub async fn view(&self, checkout_request_id: &str) -> WatchSnapshot {
        if let Some(snapshot) = self.unconfirmed.get(checkout_request_id).await {
            return snapshot;
        }

        let snapshot = self.open(checkout_request_id).await.snapshot();
        if snapshot.is_unconfirmed() {
            tracing::debug!(%checkout_request_id, "Remembering unconfirmed checkout");
            self.unconfirmed
                .insert(checkout_request_id.to_string(), snapshot.clone())
                .await;
        }
        snapshot
    }

    /// Return the watch for a checkout, starting it on first use
    ///
    /// Each call counts as a view and resets the idle timer.
    async fn open(&self, checkout_request_id: &str) -> Arc<PaymentWatch> {
        self.watches
            .get_with(checkout_request_id.to_string(), async {
                tracing::debug!(%checkout_request_id, "Starting payment watch");
                Arc::new(PaymentWatch::start(
                    self.backend.clone(),
                    checkout_request_id,
                    self.settings.clone(),
                ))
            })
            .await
    }

    #[cfg(test)]
    async fn snapshot(&self, checkout_request_id: &str) -> Option<WatchSnapshot> {
        self.watches
            .get(checkout_request_id)
            .await
            .map(|watch| watch.snapshot())
    }

    /// Stop and forget a watch
    pub async fn cancel(&self, checkout_request_id: &str) -> bool {
        self.unconfirmed.invalidate(checkout_request_id).await;
        match self.watches.remove(checkout_request_id).await {
            Some(watch) => {
                watch.cancel();
                true
            }
            None => false,
        }
    }

    /// Run moka's pending maintenance so idle watches are evicted
    pub async fn run_pending_tasks(&self) {
        self.watches.run_pending_tasks().await;
        self.unconfirmed.run_pending_tasks().await;
    }

    pub fn len(&self) -> u64 {
        self.watches.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

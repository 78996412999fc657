//! Exchange-rate refresh.
//!
//! Rates are fetched from an external USD-based endpoint every few minutes.
//! When a fetch fails the last known table is kept as-is and flagged stale;
//! rates are never synthesized.

use crate::api::ApiError;
use crate::currency::{Currency, RateTable};
use crate::storage::{self, KeyValueStore, EXCHANGE_RATES_KEY};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Stored tables older than this are ignored at startup
pub fn max_stored_age() -> Duration {
    Duration::hours(1)
}

/// Body of the rates endpoint: `{"rates": {"BRL": 5.43, ...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct RatesResponse {
    pub rates: HashMap<String, f64>,
}

impl RatesResponse {
    fn usd_rate(&self, currency: Currency) -> Option<f64> {
        self.rates
            .get(currency.code())
            .copied()
            .filter(|r| r.is_finite() && *r > 0.0)
    }

    /// Build a table, keeping `previous` values for any currency the
    /// response leaves out.
    pub fn to_table(&self, previous: &RateTable, at: DateTime<Utc>) -> RateTable {
        RateTable::from_usd_rates(
            self.usd_rate(Currency::Brl).unwrap_or(previous.usd_brl),
            self.usd_rate(Currency::Pyg).unwrap_or(previous.usd_pyg),
            at,
        )
    }
}

#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self) -> Result<RatesResponse, ApiError>;
}

/// Rates endpoint over HTTP
pub struct HttpRateSource {
    client: Client,
    endpoint: String,
}

impl HttpRateSource {
    pub fn new(endpoint: impl Into<String>, timeout: std::time::Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch(&self) -> Result<RatesResponse, ApiError> {
        debug!("Fetching exchange rates from {}", self.endpoint);
        let response = self.client.get(&self.endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16()));
        }
        response
            .json::<RatesResponse>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Where the rates currently in use came from
#[derive(Debug, Clone, PartialEq)]
pub enum RateStatus {
    /// Fetched from the endpoint (now, or within the last hour before startup)
    Live,
    /// Last fetch failed; values are the last known ones
    Stale { as_of: DateTime<Utc> },
    /// Nothing fetched yet; built-in reference values
    Baseline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    pub table: RateTable,
    pub status: RateStatus,
}

impl RateSnapshot {
    /// Banner text for the UI when the rates are not current
    pub fn stale_notice(&self) -> Option<String> {
        match &self.status {
            RateStatus::Live => None,
            RateStatus::Stale { as_of } => Some(format!(
                "Rates unavailable, showing last known values as of {}",
                as_of.format("%Y-%m-%d %H:%M UTC")
            )),
            RateStatus::Baseline => {
                Some("Rates unavailable, showing reference values".to_string())
            }
        }
    }
}

/// Process-wide exchange-rate holder
pub struct RateService {
    source: Arc<dyn RateSource>,
    store: Arc<dyn KeyValueStore>,
    snapshot: Arc<RwLock<RateSnapshot>>,
}

impl RateService {
    /// Start from the stored table when it is recent enough, else from the baseline.
    pub fn new(source: Arc<dyn RateSource>, store: Arc<dyn KeyValueStore>) -> Self {
        Self::new_at(source, store, Utc::now())
    }

    pub fn new_at(
        source: Arc<dyn RateSource>,
        store: Arc<dyn KeyValueStore>,
        now: DateTime<Utc>,
    ) -> Self {
        let stored: Option<RateTable> = storage::load(store.as_ref(), EXCHANGE_RATES_KEY);
        let snapshot = match stored {
            Some(table) if !table.is_older_than(max_stored_age(), now) => {
                debug!("Using stored exchange rates from {}", table.last_update);
                RateSnapshot {
                    table,
                    status: RateStatus::Live,
                }
            }
            Some(table) => {
                info!("Discarding stored exchange rates from {}", table.last_update);
                Self::baseline(now)
            }
            None => Self::baseline(now),
        };

        Self {
            source,
            store,
            snapshot: Arc::new(RwLock::new(snapshot)),
        }
    }

    fn baseline(now: DateTime<Utc>) -> RateSnapshot {
        RateSnapshot {
            table: RateTable::baseline(now),
            status: RateStatus::Baseline,
        }
    }

    pub async fn snapshot(&self) -> RateSnapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn table(&self) -> RateTable {
        self.snapshot.read().await.table.clone()
    }

    /// Fetch once. Success replaces and persists the table; failure keeps
    /// the current values and marks them stale.
    pub async fn refresh(&self) -> RateStatus {
        match self.source.fetch().await {
            Ok(response) => {
                let mut snapshot = self.snapshot.write().await;
                let table = response.to_table(&snapshot.table, Utc::now());
                info!(
                    "Exchange rates updated: USD→BRL {:.4}, USD→PYG {:.2}",
                    table.usd_brl, table.usd_pyg
                );
                if let Err(e) = storage::save(self.store.as_ref(), EXCHANGE_RATES_KEY, &table) {
                    warn!("Failed to persist exchange rates: {}", e);
                }
                *snapshot = RateSnapshot {
                    table,
                    status: RateStatus::Live,
                };
                RateStatus::Live
            }
            Err(e) => {
                warn!("Exchange rate refresh failed, keeping last known values: {}", e);
                let mut snapshot = self.snapshot.write().await;
                if snapshot.status != RateStatus::Baseline {
                    snapshot.status = RateStatus::Stale {
                        as_of: snapshot.table.last_update,
                    };
                }
                snapshot.status.clone()
            }
        }
    }

    /// Refresh every `every`, first one period from now, until the handle is
    /// aborted. Intervals under a second are raised to one second.
    pub fn spawn_refresh_loop(self: Arc<Self>, every: std::time::Duration) -> JoinHandle<()> {
        let every = every.max(std::time::Duration::from_secs(1));
        info!("Refreshing exchange rates every {}s", every.as_secs());
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
            loop {
                ticker.tick().await;
                self.refresh().await;
            }
        })
    }
}

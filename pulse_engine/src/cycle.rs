//! One refresh cycle: fetch, derive, collect.
//!
//! ## Flow
//! 1. Ask the provider for every symbol in the [`Universe`].
//! 2. Derive a record per symbol; symbols the provider left out or whose
//!    series cannot support a record are listed in `skipped` with a reason.
//! 3. Hand the immutable [`CycleSnapshot`] to the presentation layer.
//!
//! A provider failure is returned as [`CycleError::Fetch`], never as an empty
//! snapshot, so [`Dashboard`] can keep showing the previous cycle.

use chrono::{DateTime, Utc};
use market_feed::{
    models::{request_params::BarsRequestParams, timeframe::Timeframe},
    providers::{DataProvider, FetchedBars, ProviderError},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    metrics::{MetricRecord, MetricsConfig, SkipReason, derive_record},
    views::{self, OptionClock, SignalView},
};

/// What to fetch each cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    pub symbols: Vec<String>,
    pub interval: Timeframe,
    pub lookback: Timeframe,
}

impl Universe {
    pub fn request(&self, now: DateTime<Utc>) -> BarsRequestParams {
        BarsRequestParams::trailing(self.symbols.clone(), self.interval, self.lookback, now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("market data fetch failed")]
    Fetch(#[source] ProviderError),
}

/// The immutable result of one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleSnapshot {
    /// Records in universe order.
    pub records: Vec<MetricRecord>,
    pub skipped: Vec<SkippedSymbol>,
    /// When the records were derived. A cached fetch may be older; each
    /// record's `observed_at` carries the time of its data.
    pub computed_at: DateTime<Utc>,
}

impl CycleSnapshot {
    /// Derives records for `symbols` from a completed fetch.
    pub fn from_fetch(
        symbols: &[String],
        fetched: &FetchedBars,
        config: &MetricsConfig,
        computed_at: DateTime<Utc>,
    ) -> Self {
        let mut records = Vec::with_capacity(symbols.len());
        let mut skipped = Vec::new();

        for symbol in symbols {
            let outcome = fetched
                .get(symbol)
                .ok_or(SkipReason::MissingSymbol)
                .and_then(|series| derive_record(series, config));
            match outcome {
                Ok(record) => records.push(record),
                Err(reason) => {
                    debug!(%symbol, %reason, "symbol skipped");
                    skipped.push(SkippedSymbol {
                        symbol: symbol.clone(),
                        reason,
                    });
                }
            }
        }

        Self {
            records,
            skipped,
            computed_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn gainers(&self) -> Vec<&MetricRecord> {
        views::gainers(&self.records)
    }

    pub fn losers(&self) -> Vec<&MetricRecord> {
        views::losers(&self.records)
    }

    pub fn trade_flow(&self) -> Vec<&MetricRecord> {
        views::trade_flow(&self.records)
    }

    pub fn index_movers(&self) -> Vec<&MetricRecord> {
        views::index_movers(&self.records)
    }

    pub fn signaled(&self) -> SignalView<'_> {
        views::signaled(&self.records)
    }

    pub fn option_clock(&self) -> OptionClock {
        views::option_clock(&self.records)
    }
}

/// Runs one cycle against `provider` as of `now`.
pub async fn run_cycle<P>(
    provider: &P,
    universe: &Universe,
    config: &MetricsConfig,
    now: DateTime<Utc>,
) -> Result<CycleSnapshot, CycleError>
where
    P: DataProvider + ?Sized,
{
    let fetched = provider
        .fetch_bars(universe.request(now))
        .await
        .map_err(CycleError::Fetch)?;

    let snapshot = CycleSnapshot::from_fetch(&universe.symbols, &fetched, config, now);
    info!(
        records = snapshot.records.len(),
        skipped = snapshot.skipped.len(),
        "refresh cycle complete"
    );
    Ok(snapshot)
}

/// What the screen shows: the last good cycle plus the most recent failure, if any.
#[derive(Debug, Default)]
pub struct Dashboard {
    current: Option<CycleSnapshot>,
    last_error: Option<String>,
    cycles: u64,
    failures: u64,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a cycle outcome. A failed cycle keeps the previous snapshot.
    pub fn apply(&mut self, outcome: Result<CycleSnapshot, CycleError>) {
        self.cycles += 1;
        match outcome {
            Ok(snapshot) => {
                self.current = Some(snapshot);
                self.last_error = None;
            }
            Err(e) => {
                self.failures += 1;
                let message = error_chain(&e);
                warn!(error = %message, "refresh failed, keeping previous data");
                self.last_error = Some(message);
            }
        }
    }

    pub fn current(&self) -> Option<&CycleSnapshot> {
        self.current.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }
}

fn error_chain(e: &dyn std::error::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

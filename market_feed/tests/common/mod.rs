#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use market_feed::{
    cache::Clock,
    models::{bar::RawBar, bar_series::BarSeries, request_params::BarsRequestParams},
    providers::{ApiSnafu, DataProvider, FetchedBars, ProviderError},
};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 4, 0, 0).unwrap()
}

pub fn params(symbols: &[&str], now: DateTime<Utc>) -> BarsRequestParams {
    BarsRequestParams::trailing(
        symbols.iter().map(|s| s.to_string()).collect(),
        "1m".parse().unwrap(),
        "5d".parse().unwrap(),
        now,
    )
}

/// Answers every request with two flat bars per symbol and counts calls.
#[derive(Default)]
pub struct CountingProvider {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl CountingProvider {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataProvider for CountingProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<FetchedBars, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return ApiSnafu {
                message: "upstream timeout",
            }
            .fail();
        }
        Ok(params
            .symbols
            .iter()
            .map(|s| {
                let bars = (0..2)
                    .map(|i| RawBar {
                        timestamp: params.end - Duration::minutes(2 - i),
                        open: Some(100.0),
                        high: Some(100.0),
                        low: Some(100.0),
                        close: Some(100.0),
                        volume: Some(1_000),
                    })
                    .collect();
                (s.clone(), BarSeries::new(s.clone(), params.timeframe, Tz::UTC, bars))
            })
            .collect())
    }
}

/// A clock tests can move by hand.
#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(start)))
    }

    pub fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }

    pub fn as_clock(&self) -> Clock {
        let inner = self.clone();
        Arc::new(move || inner.now())
    }
}

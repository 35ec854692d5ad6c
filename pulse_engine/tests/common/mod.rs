#![allow(dead_code)]

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use market_feed::{
    models::{bar::RawBar, bar_series::BarSeries, request_params::BarsRequestParams},
    providers::{ApiSnafu, DataProvider, FetchedBars, ProviderError},
};
use pulse_engine::cycle::Universe;

/// Monday 2025-01-06 09:30 IST.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 4, 0, 0).unwrap()
}

pub fn universe(symbols: &[&str]) -> Universe {
    Universe {
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
        interval: "1m".parse().unwrap(),
        lookback: "5d".parse().unwrap(),
    }
}

/// One-minute bars ending at `t0()`, from `(close, volume)` pairs.
pub fn series(symbol: &str, bars: &[(f64, u64)]) -> BarSeries {
    let n = bars.len() as i64;
    let raw = bars
        .iter()
        .enumerate()
        .map(|(i, &(close, volume))| RawBar {
            timestamp: t0() - Duration::minutes(n - 1 - i as i64),
            open: Some(close),
            high: Some(close),
            low: Some(close),
            close: Some(close),
            volume: Some(volume),
        })
        .collect();
    BarSeries::new(symbol, "1m".parse().unwrap(), Tz::Asia__Kolkata, raw)
}

pub fn fetched(entries: Vec<BarSeries>) -> FetchedBars {
    entries.into_iter().map(|s| (s.symbol.clone(), s)).collect()
}

/// Replays queued outcomes, one per fetch, and records what was asked for.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<FetchedBars, String>>>,
    pub requests: Mutex<Vec<BarsRequestParams>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<FetchedBars, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::default(),
        }
    }

    pub fn requests(&self) -> Vec<BarsRequestParams> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataProvider for ScriptedProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<FetchedBars, ProviderError> {
        self.requests.lock().unwrap().push(params);
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(bars)) => Ok(bars),
            Some(Err(message)) => ApiSnafu { message }.fail(),
            None => ApiSnafu {
                message: "script exhausted",
            }
            .fail(),
        }
    }
}

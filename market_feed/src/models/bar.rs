//! Canonical in-memory representation of a time-series bar (OHLCV).
//!
//! Providers emit [`RawBar`]s, where any field may be missing (vendors publish
//! `null` for intervals without trades). [`RawBar::complete`] is the only way
//! to obtain a [`Bar`], so downstream code never sees a partially filled bar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single complete OHLCV observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Start of the bar interval (UTC).
    pub timestamp: DateTime<Utc>,

    /// Opening price.
    pub open: f64,

    /// Highest price during the bar interval.
    pub high: f64,

    /// Lowest price during the bar interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Shares traded during the bar interval.
    pub volume: u64,
}

/// A bar exactly as received from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub timestamp: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

impl RawBar {
    /// Returns the bar if every field is present and every price is finite.
    pub fn complete(&self) -> Option<Bar> {
        let finite = |v: Option<f64>| v.filter(|p| p.is_finite());
        Some(Bar {
            timestamp: self.timestamp,
            open: finite(self.open)?,
            high: finite(self.high)?,
            low: finite(self.low)?,
            close: finite(self.close)?,
            volume: self.volume?,
        })
    }
}

impl From<Bar> for RawBar {
    fn from(bar: Bar) -> Self {
        Self {
            timestamp: bar.timestamp,
            open: Some(bar.open),
            high: Some(bar.high),
            low: Some(bar.low),
            close: Some(bar.close),
            volume: Some(bar.volume),
        }
    }
}

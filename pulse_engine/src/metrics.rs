//! Per-symbol metrics derivation.
//!
//! [`derive_record`] turns one [`BarSeries`] into a [`MetricRecord`], or a
//! [`SkipReason`] when the series cannot support one. Skips are routine
//! (thin data, a halted symbol) and never abort the rest of the cycle.

use std::num::NonZeroUsize;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use market_feed::models::{bar::Bar, bar_series::BarSeries};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::signal::{SignalLabel, SignalThresholds, classify};

/// Points of confidence per percent of price change.
pub const CHANGE_WEIGHT: f64 = 30.0;

/// Points of confidence per unit of volume multiple.
pub const VOLUME_WEIGHT: f64 = 15.0;

pub const CONFIDENCE_CAP: f64 = 100.0;

/// Average volume used when the real average is zero, keeping the multiple finite.
pub const FALLBACK_AVERAGE_VOLUME: f64 = 1.0;

/// Which bars the average volume is taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeWindow {
    /// Every complete bar in the series.
    #[default]
    WholeSeries,
    /// The last `n` complete bars, or all of them when the series is shorter.
    Trailing(NonZeroUsize),
}

/// Why a symbol produced no record this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum SkipReason {
    #[error("provider returned no data")]
    MissingSymbol,

    #[error("only {valid} complete bar(s), need 2")]
    InsufficientBars { valid: usize },

    #[error("previous close is zero")]
    ZeroPreviousClose,
}

/// Settings that shape derivation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsConfig {
    pub volume_window: VolumeWindow,
    pub thresholds: SignalThresholds,
    /// Provider suffix removed from symbols for display (e.g. `.NS`).
    pub display_suffix: Option<String>,
}

/// Derived metrics for one symbol in one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    pub symbol: String,
    pub last_price: f64,
    pub percent_change: f64,
    /// Volume of the most recent bar.
    pub volume: u64,
    pub volume_multiple: f64,
    pub confidence: f64,
    /// Timestamp of the most recent bar, in the exchange time zone.
    pub observed_at: DateTime<Tz>,
    pub signal: SignalLabel,
}

impl MetricRecord {
    /// `true` when the last bar is older than `max_age` at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now.signed_duration_since(&self.observed_at) > max_age
    }
}

pub fn display_symbol<'a>(symbol: &'a str, suffix: Option<&str>) -> &'a str {
    suffix
        .and_then(|s| symbol.strip_suffix(s))
        .filter(|s| !s.is_empty())
        .unwrap_or(symbol)
}

pub fn percent_change(prev_close: f64, last_close: f64) -> f64 {
    (last_close - prev_close) / prev_close * 100.0
}

/// Mean volume over `window`; [`FALLBACK_AVERAGE_VOLUME`] when that mean is zero.
pub fn average_volume(bars: &[Bar], window: VolumeWindow) -> f64 {
    let tail = match window {
        VolumeWindow::WholeSeries => bars,
        VolumeWindow::Trailing(n) => &bars[bars.len().saturating_sub(n.get())..],
    };
    if tail.is_empty() {
        return FALLBACK_AVERAGE_VOLUME;
    }
    let mean = tail.iter().map(|b| b.volume as f64).sum::<f64>() / tail.len() as f64;
    if mean > 0.0 && mean.is_finite() {
        mean
    } else {
        FALLBACK_AVERAGE_VOLUME
    }
}

/// Bounded heuristic score in `[0, CONFIDENCE_CAP]`. Display only.
pub fn confidence(percent_change: f64, volume_multiple: f64) -> f64 {
    let raw = percent_change.abs() * CHANGE_WEIGHT + volume_multiple * VOLUME_WEIGHT;
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, CONFIDENCE_CAP)
}

pub fn derive_record(
    series: &BarSeries,
    config: &MetricsConfig,
) -> Result<MetricRecord, SkipReason> {
    let bars = series.complete_bars();
    let [.., prev, last] = bars.as_slice() else {
        return Err(SkipReason::InsufficientBars { valid: bars.len() });
    };
    if prev.close == 0.0 {
        return Err(SkipReason::ZeroPreviousClose);
    }

    let percent_change = percent_change(prev.close, last.close);
    let volume_multiple = last.volume as f64 / average_volume(&bars, config.volume_window);

    Ok(MetricRecord {
        symbol: display_symbol(&series.symbol, config.display_suffix.as_deref()).to_string(),
        last_price: last.close,
        percent_change,
        volume: last.volume,
        volume_multiple,
        confidence: confidence(percent_change, volume_multiple),
        observed_at: last.timestamp.with_timezone(&series.timezone),
        signal: classify(percent_change, volume_multiple, &config.thresholds),
    })
}

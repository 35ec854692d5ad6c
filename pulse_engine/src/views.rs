//! Read-only views over one cycle's record set.
//!
//! Every view borrows the records and returns a new ordering; nothing here
//! mutates the set. Ties are always broken by symbol so output is stable
//! from one render to the next.

use std::cmp::Ordering;

use serde::Serialize;

use crate::metrics::MetricRecord;

/// Average change beyond which the Option Clock leans one way.
pub const BIAS_THRESHOLD_PCT: f64 = 0.3;

fn by_symbol(a: &MetricRecord, b: &MetricRecord) -> Ordering {
    a.symbol.cmp(&b.symbol)
}

fn change_desc(a: &&MetricRecord, b: &&MetricRecord) -> Ordering {
    b.percent_change
        .total_cmp(&a.percent_change)
        .then_with(|| by_symbol(a, b))
}

/// Records that rose, biggest gain first.
pub fn gainers(records: &[MetricRecord]) -> Vec<&MetricRecord> {
    let mut out: Vec<_> = records.iter().filter(|r| r.percent_change > 0.0).collect();
    out.sort_by(change_desc);
    out
}

/// Records that fell, biggest loss first.
pub fn losers(records: &[MetricRecord]) -> Vec<&MetricRecord> {
    let mut out: Vec<_> = records.iter().filter(|r| r.percent_change < 0.0).collect();
    out.sort_by(|a, b| {
        a.percent_change
            .total_cmp(&b.percent_change)
            .then_with(|| by_symbol(a, b))
    });
    out
}

/// Every record, heaviest last-bar volume first.
pub fn trade_flow(records: &[MetricRecord]) -> Vec<&MetricRecord> {
    let mut out: Vec<_> = records.iter().collect();
    out.sort_by(|a, b| b.volume.cmp(&a.volume).then_with(|| by_symbol(a, b)));
    out
}

/// Every record by change, strongest first.
pub fn index_movers(records: &[MetricRecord]) -> Vec<&MetricRecord> {
    let mut out: Vec<_> = records.iter().collect();
    out.sort_by(change_desc);
    out
}

/// Outcome of the live-signals view.
#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "records", rename_all = "snake_case")]
pub enum SignalView<'a> {
    /// The cycle produced no records at all.
    NoData,
    /// Records exist but none carries a signal.
    NoSignal,
    /// Signaled records in universe order.
    Signals(Vec<&'a MetricRecord>),
}

pub fn signaled(records: &[MetricRecord]) -> SignalView<'_> {
    if records.is_empty() {
        return SignalView::NoData;
    }
    let hits: Vec<_> = records.iter().filter(|r| r.signal.is_signal()).collect();
    if hits.is_empty() {
        SignalView::NoSignal
    } else {
        SignalView::Signals(hits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketBias {
    /// Broad strength; put writing likely.
    Bullish,
    /// Broad weakness; call writing likely.
    Bearish,
    Sideways,
}

/// Intraday bias read from the average change across the universe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptionClock {
    pub average_change: f64,
    pub bias: MarketBias,
}

pub fn option_clock(records: &[MetricRecord]) -> OptionClock {
    let average_change = if records.is_empty() {
        0.0
    } else {
        records.iter().map(|r| r.percent_change).sum::<f64>() / records.len() as f64
    };
    let bias = if average_change > BIAS_THRESHOLD_PCT {
        MarketBias::Bullish
    } else if average_change < -BIAS_THRESHOLD_PCT {
        MarketBias::Bearish
    } else {
        MarketBias::Sideways
    };
    OptionClock {
        average_change,
        bias,
    }
}

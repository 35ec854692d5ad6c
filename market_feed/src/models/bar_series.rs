//! A collection of time-series bars for a specific symbol and timeframe.

use chrono_tz::Tz;

use crate::models::{
    bar::{Bar, RawBar},
    timeframe::Timeframe,
};

/// Represents a complete set of time-series data for a single symbol.
///
/// Bars are kept in ascending timestamp order with no duplicate timestamps;
/// [`BarSeries::new`] enforces this, so the field is private.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    /// The symbol as the provider knows it (e.g., "RELIANCE.NS", "AAPL").
    pub symbol: String,
    /// The sampling interval of each bar.
    pub timeframe: Timeframe,
    /// Exchange time zone, used when displaying bar timestamps.
    pub timezone: Tz,
    bars: Vec<RawBar>,
}

impl BarSeries {
    /// Builds a series, sorting bars by timestamp. When two bars share a
    /// timestamp the one received last wins.
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        timezone: Tz,
        mut bars: Vec<RawBar>,
    ) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        let mut deduped: Vec<RawBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(prev) if prev.timestamp == bar.timestamp => *prev = bar,
                _ => deduped.push(bar),
            }
        }

        Self {
            symbol: symbol.into(),
            timeframe,
            timezone,
            bars: deduped,
        }
    }

    pub fn bars(&self) -> &[RawBar] {
        &self.bars
    }

    /// Bars with every field present, still in timestamp order.
    pub fn complete_bars(&self) -> Vec<Bar> {
        self.bars.iter().filter_map(RawBar::complete).collect()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn bar(minute: u32, close: f64) -> RawBar {
        RawBar {
            timestamp: Utc.with_ymd_and_hms(2025, 1, 6, 4, minute, 0).unwrap(),
            open: Some(close),
            high: Some(close),
            low: Some(close),
            close: Some(close),
            volume: Some(10),
        }
    }

    #[test]
    fn sorts_and_dedups_last_wins() {
        let series = BarSeries::new(
            "TCS.NS",
            "1m".parse().unwrap(),
            Tz::Asia__Kolkata,
            vec![bar(2, 3.0), bar(0, 1.0), bar(1, 2.0), bar(2, 4.0)],
        );

        let closes: Vec<_> = series.bars().iter().map(|b| b.close.unwrap()).collect();
        assert_eq!(closes, vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn complete_bars_skips_gaps() {
        let mut gap = bar(1, 2.0);
        gap.close = None;
        let series = BarSeries::new(
            "TCS.NS",
            "1m".parse().unwrap(),
            Tz::UTC,
            vec![bar(0, 1.0), gap, bar(2, 3.0)],
        );

        assert_eq!(series.len(), 3);
        let closes: Vec<_> = series.complete_bars().iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 3.0]);
    }
}

//! Wire format of the chart endpoint and its conversion into [`BarSeries`].

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Deserialize;

use crate::{
    models::{bar::RawBar, bar_series::BarSeries, timeframe::Timeframe},
    providers::{ApiSnafu, ProviderError},
};

#[derive(Deserialize, Debug)]
pub struct ChartEnvelope {
    pub chart: Chart,
}

#[derive(Deserialize, Debug)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Deserialize, Debug)]
pub struct ChartResult {
    pub meta: ChartMeta,
    /// Absent when the window holds no bars.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: String,
    pub exchange_timezone_name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
}

/// Column-oriented OHLCV; entries are `null` for minutes without trades.
#[derive(Deserialize, Debug, Default)]
pub struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

impl ChartEnvelope {
    /// Converts a chart payload into a series.
    ///
    /// * `Ok(Some(series))` - data was returned (it may still hold incomplete bars).
    /// * `Ok(None)` - the symbol exists but the window holds no bars.
    /// * `Err(Api)` - Yahoo reported an error for this symbol.
    pub fn into_series(self, timeframe: Timeframe) -> Result<Option<BarSeries>, ProviderError> {
        if let Some(err) = self.chart.error {
            return ApiSnafu {
                message: format!("{}: {}", err.code, err.description),
            }
            .fail();
        }

        let Some(result) = self.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(None);
        };
        if result.timestamp.is_empty() {
            return Ok(None);
        }

        let timezone = result
            .meta
            .exchange_timezone_name
            .as_deref()
            .and_then(|name| name.parse::<Tz>().ok())
            .unwrap_or(Tz::UTC);
        let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

        let at = |column: &[Option<f64>], i: usize| column.get(i).copied().flatten();
        let bars = result
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &secs)| {
                Some(RawBar {
                    timestamp: DateTime::from_timestamp(secs, 0)?,
                    open: at(&quote.open, i),
                    high: at(&quote.high, i),
                    low: at(&quote.low, i),
                    close: at(&quote.close, i),
                    volume: at(&quote.volume, i)
                        .filter(|v| v.is_finite() && *v >= 0.0)
                        .map(|v| v.round() as u64),
                })
            })
            .collect();

        Ok(Some(BarSeries::new(result.meta.symbol, timeframe, timezone, bars)))
    }
}

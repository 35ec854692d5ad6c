use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{models::timeframe::Timeframe, providers::alpaca_rest::AlpacaBarsParams};

/// Universal parameters for requesting time-series bar data from any market data provider.
///
/// It is the standard input for all [`DataProvider`](crate::providers::DataProvider)
/// implementations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BarsRequestParams {
    /// Symbols to request, in the provider's own notation (e.g. `["RELIANCE.NS"]`).
    pub symbols: Vec<String>,

    /// The sampling interval for each bar.
    ///
    /// **Validation of allowed values is performed by each data provider
    /// implementation, according to their own API rules.**
    pub timeframe: Timeframe,

    /// Start of the requested time range (inclusive, UTC).
    pub start: DateTime<Utc>,

    /// End of the requested time range (exclusive, UTC).
    pub end: DateTime<Utc>,

    /// Optional, provider-specific parameters.
    #[serde(default)]
    pub provider_specific: ProviderParams,
}

impl BarsRequestParams {
    /// Requests the window of length `lookback` ending at `now`.
    ///
    /// A lookback reaching past the earliest representable instant starts there.
    pub fn trailing(
        symbols: Vec<String>,
        timeframe: Timeframe,
        lookback: Timeframe,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            symbols,
            timeframe,
            start: now
                .checked_sub_signed(lookback.duration())
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            end: now,
            provider_specific: ProviderParams::None,
        }
    }
}

/// Provider-specific request parameters.
///
/// This allows callers to specify detailed, per-request options for a
/// particular provider without cluttering the universal `BarsRequestParams`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum ProviderParams {
    #[default]
    None,
    Alpaca(AlpacaBarsParams),
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 4, 0, 0).unwrap()
    }

    #[test]
    fn trailing_window_ends_now() {
        let p = BarsRequestParams::trailing(
            vec!["TCS.NS".into()],
            "1m".parse().unwrap(),
            "5d".parse().unwrap(),
            now(),
        );
        assert_eq!(p.end, now());
        assert_eq!(p.end - p.start, Duration::days(5));
    }

    #[test]
    fn oversized_lookback_clamps_to_earliest_instant() {
        let p = BarsRequestParams::trailing(
            vec!["TCS.NS".into()],
            "1m".parse().unwrap(),
            "200000000d".parse().unwrap(),
            now(),
        );
        assert_eq!(p.start, DateTime::<Utc>::MIN_UTC);
        assert_eq!(p.end, now());
    }
}

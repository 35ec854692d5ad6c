use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::{
    models::{
        request_params::{BarsRequestParams, ProviderParams},
        timeframe::{Timeframe, TimeframeUnit},
    },
    providers::{ProviderError, ValidationSnafu},
};

/// Specifies the corporate action adjustment for stock data.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    #[default]
    Raw,
    Split,
    Dividend,
    All,
}

impl Adjustment {
    fn as_str(self) -> &'static str {
        match self {
            Adjustment::Raw => "raw",
            Adjustment::Split => "split",
            Adjustment::Dividend => "dividend",
            Adjustment::All => "all",
        }
    }
}

/// Specifies the source feed for stock data.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    #[default]
    Sip,
    Iex,
    Otc,
}

impl Feed {
    fn as_str(self) -> &'static str {
        match self {
            Feed::Sip => "sip",
            Feed::Iex => "iex",
            Feed::Otc => "otc",
        }
    }
}

/// Specifies the sort order for the bars.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Sort {
    #[default]
    Asc,
    Desc,
}

impl Sort {
    fn as_str(self) -> &'static str {
        match self {
            Sort::Asc => "asc",
            Sort::Desc => "desc",
        }
    }
}

/// Alpaca-specific parameters for a bars request.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct AlpacaBarsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustment: Option<Adjustment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<Feed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
}

/// Checks the timeframe against Alpaca's accepted ranges and renders it in
/// Alpaca notation (`5Min`, `1Hour`, `1Day`, `1Week`, `3Month`).
pub fn alpaca_timeframe(tf: &Timeframe) -> Result<String, ProviderError> {
    let amount = tf.amount().get();
    let (ok, unit) = match tf.unit() {
        TimeframeUnit::Minute => ((1..=59).contains(&amount), "Min"),
        TimeframeUnit::Hour => ((1..=23).contains(&amount), "Hour"),
        TimeframeUnit::Day => (amount == 1, "Day"),
        TimeframeUnit::Week => (amount == 1, "Week"),
        TimeframeUnit::Month => ([1, 2, 3, 4, 6, 12].contains(&amount), "Month"),
    };
    if !ok {
        return ValidationSnafu {
            message: format!("Alpaca does not support a {tf} timeframe"),
        }
        .fail();
    }
    Ok(format!("{amount}{unit}"))
}

/// Builds the query string for one page of a bars request.
pub fn construct_params(params: &BarsRequestParams) -> Result<Vec<(String, String)>, ProviderError> {
    let mut query = vec![
        ("symbols".to_string(), params.symbols.join(",")),
        ("timeframe".to_string(), alpaca_timeframe(&params.timeframe)?),
        (
            "start".to_string(),
            params.start.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        (
            "end".to_string(),
            params.end.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
    ];

    if let ProviderParams::Alpaca(extra) = &params.provider_specific {
        if let Some(adjustment) = extra.adjustment {
            query.push(("adjustment".to_string(), adjustment.as_str().to_string()));
        }
        if let Some(feed) = extra.feed {
            query.push(("feed".to_string(), feed.as_str().to_string()));
        }
        if let Some(currency) = &extra.currency {
            query.push(("currency".to_string(), currency.clone()));
        }
        if let Some(limit) = extra.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(sort) = extra.sort {
            query.push(("sort".to_string(), sort.as_str().to_string()));
        }
    }

    Ok(query)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn tf(s: &str) -> Timeframe {
        s.parse().unwrap()
    }

    #[test]
    fn renders_supported_timeframes() {
        assert_eq!(alpaca_timeframe(&tf("5m")).unwrap(), "5Min");
        assert_eq!(alpaca_timeframe(&tf("1h")).unwrap(), "1Hour");
        assert_eq!(alpaca_timeframe(&tf("1d")).unwrap(), "1Day");
        assert_eq!(alpaca_timeframe(&tf("6M")).unwrap(), "6Month");
    }

    #[test]
    fn rejects_unsupported_timeframes() {
        for bad in ["60m", "24h", "2d", "2W", "5M"] {
            assert!(
                matches!(alpaca_timeframe(&tf(bad)), Err(ProviderError::Validation { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn query_includes_provider_specific_options() {
        let params = BarsRequestParams {
            symbols: vec!["AAPL".into(), "MSFT".into()],
            timeframe: tf("1m"),
            start: Utc.with_ymd_and_hms(2025, 1, 2, 14, 30, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 1, 2, 21, 0, 0).unwrap(),
            provider_specific: ProviderParams::Alpaca(AlpacaBarsParams {
                feed: Some(Feed::Iex),
                limit: Some(500),
                ..Default::default()
            }),
        };

        let query = construct_params(&params).unwrap();
        let get = |k: &str| query.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("symbols"), Some("AAPL,MSFT"));
        assert_eq!(get("timeframe"), Some("1Min"));
        assert_eq!(get("start"), Some("2025-01-02T14:30:00Z"));
        assert_eq!(get("feed"), Some("iex"));
        assert_eq!(get("limit"), Some("500"));
        assert_eq!(get("sort"), None);
    }
}

use crate::{
    models::{
        request_params::BarsRequestParams,
        timeframe::{Timeframe, TimeframeUnit},
    },
    providers::{ProviderError, ValidationSnafu},
};

/// Renders a timeframe as a Yahoo `interval` value.
///
/// Yahoo only accepts a fixed menu of intervals: 1m 2m 5m 15m 30m 60m 90m
/// 1h 1d 5d 1wk 1mo 3mo.
pub fn yahoo_interval(tf: &Timeframe) -> Result<&'static str, ProviderError> {
    let interval = match (tf.unit(), tf.amount().get()) {
        (TimeframeUnit::Minute, 1) => "1m",
        (TimeframeUnit::Minute, 2) => "2m",
        (TimeframeUnit::Minute, 5) => "5m",
        (TimeframeUnit::Minute, 15) => "15m",
        (TimeframeUnit::Minute, 30) => "30m",
        (TimeframeUnit::Minute, 60) => "60m",
        (TimeframeUnit::Minute, 90) => "90m",
        (TimeframeUnit::Hour, 1) => "1h",
        (TimeframeUnit::Day, 1) => "1d",
        (TimeframeUnit::Day, 5) => "5d",
        (TimeframeUnit::Week, 1) => "1wk",
        (TimeframeUnit::Month, 1) => "1mo",
        (TimeframeUnit::Month, 3) => "3mo",
        _ => {
            return ValidationSnafu {
                message: format!("Yahoo does not support a {tf} interval"),
            }
            .fail();
        }
    };
    Ok(interval)
}

/// Query string shared by every per-symbol request of one fetch.
pub fn construct_params(params: &BarsRequestParams) -> Result<Vec<(String, String)>, ProviderError> {
    Ok(vec![
        ("period1".to_string(), params.start.timestamp().to_string()),
        ("period2".to_string(), params.end.timestamp().to_string()),
        (
            "interval".to_string(),
            yahoo_interval(&params.timeframe)?.to_string(),
        ),
        ("includePrePost".to_string(), "false".to_string()),
    ])
}

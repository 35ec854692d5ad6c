use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::models::bar::RawBar;

#[derive(Deserialize, Debug)]
pub struct AlpacaBar {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: f64,
}

impl From<AlpacaBar> for RawBar {
    fn from(ab: AlpacaBar) -> Self {
        RawBar {
            timestamp: ab.timestamp,
            open: Some(ab.open),
            high: Some(ab.high),
            low: Some(ab.low),
            close: Some(ab.close),
            volume: (ab.volume.is_finite() && ab.volume >= 0.0).then(|| ab.volume.round() as u64),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct AlpacaResponse {
    /// Alpaca sends `null` instead of `{}` when no symbol has bars.
    #[serde(default)]
    pub bars: Option<IndexMap<String, Vec<AlpacaBar>>>,
    pub next_page_token: Option<String>,
}

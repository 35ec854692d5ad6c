//! Provider registry that helps the runtime map a [`ProviderId`] to a concrete provider.

use std::{fmt, num::NonZeroU32};

use serde::{Deserialize, Serialize};

use crate::providers::{
    DataProvider, ProviderInitError, alpaca_rest::AlpacaProvider, yahoo_chart::YahooChartProvider,
};

/// Market data vendors the application can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    #[default]
    Yahoo,
    Alpaca,
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProviderId::Yahoo => "yahoo",
            ProviderId::Alpaca => "alpaca",
        })
    }
}

/// Build and return a boxed data provider corresponding to the supplied ProviderId.
///
/// `requests_per_second` only applies to providers that issue one request per symbol.
pub fn build_provider(
    id: ProviderId,
    requests_per_second: NonZeroU32,
) -> Result<Box<dyn DataProvider>, ProviderInitError> {
    match id {
        ProviderId::Yahoo => Ok(Box::new(YahooChartProvider::with_rate_limit(
            requests_per_second,
        )?)),
        ProviderId::Alpaca => Ok(Box::new(AlpacaProvider::new()?)),
    }
}

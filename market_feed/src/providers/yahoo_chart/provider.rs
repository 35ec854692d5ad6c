use std::num::NonZeroU32;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use snafu::ResultExt;
use tracing::{debug, warn};

use crate::{
    models::{bar_series::BarSeries, request_params::BarsRequestParams},
    providers::{
        ApiSnafu, ClientBuildSnafu, DataProvider, FetchedBars, ProviderError, ProviderInitError,
        ReqwestSnafu,
        yahoo_chart::{params::construct_params, response::ChartEnvelope},
    },
};

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo rejects clients without a browser-like user agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) intraday-pulse/0.1";

pub const DEFAULT_REQUESTS_PER_SECOND: NonZeroU32 = nonzero!(5u32);

pub struct YahooChartProvider {
    client: Client,
    base_url: String,
    limiter: DefaultDirectRateLimiter,
}

impl YahooChartProvider {
    pub fn new() -> Result<Self, ProviderInitError> {
        Self::with_rate_limit(DEFAULT_REQUESTS_PER_SECOND)
    }

    /// Creates a provider that issues at most `per_second` chart requests per second.
    pub fn with_rate_limit(per_second: NonZeroU32) -> Result<Self, ProviderInitError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }

    /// Points the provider at a different endpoint (e.g. `query2` or a local mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_symbol(
        &self,
        symbol: &str,
        query: &[(String, String)],
        params: &BarsRequestParams,
    ) -> Result<Option<BarSeries>, ProviderError> {
        self.limiter.until_ready().await;

        let url = format!("{}/{}", self.base_url, symbol);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        let body = response.text().await.context(ReqwestSnafu)?;

        // Error statuses usually still carry a chart envelope with a readable reason.
        match serde_json::from_str::<ChartEnvelope>(&body) {
            Ok(envelope) => envelope.into_series(params.timeframe),
            Err(_) if !status.is_success() => ApiSnafu {
                message: format!("{status}: {body}"),
            }
            .fail(),
            Err(e) => ApiSnafu {
                message: format!("malformed chart payload for {symbol}: {e}"),
            }
            .fail(),
        }
    }
}

#[async_trait]
impl DataProvider for YahooChartProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<FetchedBars, ProviderError> {
        let query = construct_params(&params)?;

        let mut fetched = FetchedBars::new();
        let mut first_error: Option<ProviderError> = None;

        for symbol in &params.symbols {
            match self.fetch_symbol(symbol, &query, &params).await {
                Ok(Some(mut series)) => {
                    series.symbol = symbol.clone();
                    fetched.insert(symbol.clone(), series);
                }
                Ok(None) => debug!(%symbol, "no bars in window"),
                Err(e) => {
                    warn!(%symbol, error = %e, "chart request failed, skipping symbol");
                    first_error.get_or_insert(e);
                }
            }
        }

        // Only a fetch where nothing came back counts as a provider failure.
        match first_error {
            Some(e) if fetched.is_empty() => Err(e),
            _ => Ok(fetched),
        }
    }
}

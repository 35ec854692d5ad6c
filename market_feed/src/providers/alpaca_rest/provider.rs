use async_trait::async_trait;
use chrono_tz::Tz;
use indexmap::IndexMap;
use reqwest::{Client, header};
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_env_var;
use snafu::ResultExt;
use tracing::debug;

use crate::{
    models::{bar::RawBar, bar_series::BarSeries, request_params::BarsRequestParams},
    providers::{
        ApiSnafu, ClientBuildSnafu, DataProvider, FetchedBars, InvalidApiKeySnafu, ProviderError,
        ProviderInitError, ReqwestSnafu,
        alpaca_rest::{params::construct_params, response::AlpacaResponse},
    },
};

const BASE_URL: &str = "https://data.alpaca.markets/v2/stocks/bars";

/// Alpaca quotes US equities; bar times are shown in New York time.
const EXCHANGE_TZ: Tz = Tz::America__New_York;

pub struct AlpacaProvider {
    client: Client,
    base_url: String,
}

impl AlpacaProvider {
    /// Creates a new Alpaca provider.
    ///
    /// Reads API keys from the `APCA_API_KEY_ID` and `APCA_API_SECRET_KEY`
    /// environment variables.
    pub fn new() -> Result<Self, ProviderInitError> {
        let api_key = SecretString::new(get_env_var("APCA_API_KEY_ID")?.into());
        let secret_key = SecretString::new(get_env_var("APCA_API_SECRET_KEY")?.into());
        Self::with_keys(&api_key, &secret_key)
    }

    pub fn with_keys(
        api_key: &SecretString,
        secret_key: &SecretString,
    ) -> Result<Self, ProviderInitError> {
        let mut headers = header::HeaderMap::new();
        for (name, secret) in [
            ("APCA-API-KEY-ID", api_key),
            ("APCA-API-SECRET-KEY", secret_key),
        ] {
            let mut value = header::HeaderValue::from_str(secret.expose_secret())
                .context(InvalidApiKeySnafu)?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Points the provider at a different endpoint (e.g. a local mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl DataProvider for AlpacaProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<FetchedBars, ProviderError> {
        // Validates the timeframe before any request goes out.
        let base_query = construct_params(&params)?;

        let mut all_bars: IndexMap<String, Vec<RawBar>> = IndexMap::new();
        let mut next_page_token: Option<String> = None;

        loop {
            let mut query_params = base_query.clone();
            if let Some(token) = &next_page_token {
                query_params.push(("page_token".to_string(), token.clone()));
            }

            let response = self
                .client
                .get(&self.base_url)
                .query(&query_params)
                .send()
                .await
                .context(ReqwestSnafu)?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown API error".to_string());
                return ApiSnafu {
                    message: format!("{status}: {body}"),
                }
                .fail();
            }

            let page = response
                .json::<AlpacaResponse>()
                .await
                .context(ReqwestSnafu)?;

            for (symbol, bars) in page.bars.unwrap_or_default() {
                all_bars
                    .entry(symbol)
                    .or_default()
                    .extend(bars.into_iter().map(RawBar::from));
            }

            match page.next_page_token {
                Some(token) => next_page_token = Some(token),
                None => break,
            }
        }

        debug!(symbols = all_bars.len(), "alpaca fetch complete");

        Ok(all_bars
            .into_iter()
            .map(|(symbol, bars)| {
                let series = BarSeries::new(symbol.clone(), params.timeframe, EXCHANGE_TZ, bars);
                (symbol, series)
            })
            .collect())
    }
}

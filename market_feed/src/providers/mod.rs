//! Provider abstraction for market data sources.
//!
//! This module defines the [`DataProvider`] trait, the unified interface for
//! fetching bar data from a market data vendor (Yahoo chart API, Alpaca).
//!
//! A provider answers with one [`BarSeries`] per symbol it found data for.
//! Symbols it has nothing for are simply absent from the returned map; only a
//! failure of the whole request is an error.
//!
//! The trait is object safe, so the runtime can pick a provider from config
//! (see [`registry::build_provider`]).
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use market_feed::models::request_params::BarsRequestParams;
//! use market_feed::providers::{DataProvider, FetchedBars, ProviderError};
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl DataProvider for MyProvider {
//!     async fn fetch_bars(&self, _params: BarsRequestParams) -> Result<FetchedBars, ProviderError> {
//!         Ok(FetchedBars::new())
//!     }
//! }
//! ```

pub mod alpaca_rest;
pub mod registry;
pub mod yahoo_chart;

use async_trait::async_trait;
use indexmap::IndexMap;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::{bar_series::BarSeries, request_params::BarsRequestParams};

/// Bar series keyed by the requested symbol, in the order the provider returned them.
pub type FetchedBars = IndexMap<String, BarSeries>;

/// Trait for fetching time-series bar data from a market data provider.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetches bars for every symbol in `params`.
    ///
    /// * `Ok(map)` - one entry per symbol with data; missing symbols are absent.
    /// * `Err(ProviderError)` - the fetch as a whole failed.
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<FetchedBars, ProviderError>;
}

#[async_trait]
impl<T: DataProvider + ?Sized> DataProvider for Box<T> {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<FetchedBars, ProviderError> {
        (**self).fetch_bars(params).await
    }
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"), context(false))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// API key contains invalid characters.
    #[snafu(display("Invalid API key format: {source}"))]
    InvalidApiKey {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `DataProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider's API returned an error status or error payload.
    #[snafu(display("API error: {message}"))]
    Api {
        message: String,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid for this specific provider.
    #[snafu(display("Invalid parameters for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    /// An internal error occurred while processing data within the provider.
    #[snafu(display("Internal provider error: {message}"))]
    Internal {
        message: String,
        backtrace: Backtrace,
    },

    /// An error during provider configuration or initialization.
    #[snafu(display("Provider initialization error: {source}"))]
    Init {
        #[snafu(backtrace)]
        source: ProviderInitError,
    },
}

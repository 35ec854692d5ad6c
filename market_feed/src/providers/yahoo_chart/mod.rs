//! Yahoo Finance chart API (`/v8/finance/chart/{symbol}`) provider.
//!
//! The chart endpoint answers one symbol per request, so the provider issues
//! one rate-limited request per symbol and assembles the results. A symbol the
//! API rejects (delisted, typo) is left out of the result; the fetch only fails
//! as a whole when no symbol could be fetched at all.

pub mod params;
pub mod provider;
pub mod response;

pub use provider::YahooChartProvider;

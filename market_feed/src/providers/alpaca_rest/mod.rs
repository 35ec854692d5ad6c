//! Alpaca Market Data v2 (`/v2/stocks/bars`) provider.

pub mod params;
pub mod provider;
pub mod response;

pub use params::AlpacaBarsParams;
pub use provider::AlpacaProvider;

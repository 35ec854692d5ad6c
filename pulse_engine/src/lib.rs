//! Intraday market pulse: per-symbol momentum and volume metrics, signal
//! labels and dashboard views computed from recent bars.
//!
//! The pipeline for one refresh is [`cycle::run_cycle`]: fetch bars through a
//! [`market_feed::providers::DataProvider`], derive a
//! [`metrics::MetricRecord`] per symbol, and expose the record set through the
//! read-only orderings in [`views`]. [`render`] turns a snapshot into text or JSON.

pub mod config;
pub mod cycle;
pub mod metrics;
pub mod render;
pub mod session;
pub mod signal;
pub mod views;

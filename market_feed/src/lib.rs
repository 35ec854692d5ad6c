//! Market data retrieval: the bar model, provider implementations and the
//! fetch cache used by the dashboard's refresh cycle.

pub mod cache;
pub mod models;
pub mod providers;

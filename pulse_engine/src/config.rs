//! Dashboard configuration: parsing, normalization, and loading.
//!
//! Every section is optional and falls back to the built-in defaults, so an
//! empty file (or no file) yields the stock NSE dashboard:
//!
//! ```toml
//! [provider]
//! kind = "yahoo"            # or "alpaca"
//! interval = "1m"
//! lookback = "5d"
//! requests_per_second = 5
//!
//! [universe]
//! symbols = ["RELIANCE.NS", "TCS.NS"]
//! display_suffix = ".NS"
//!
//! [engine]
//! volume_window = "whole_series"   # or { trailing = 20 }
//! thresholds = { strong_move_pct = 0.8, volume_surge_multiple = 1.5 }
//!
//! [cache]
//! ttl_secs = 60                    # 0 disables caching
//!
//! [refresh]
//! auto = true
//! interval_secs = 15
//!
//! [session]
//! timezone = "Asia/Kolkata"
//! open = "09:15"
//! close = "15:30"
//! stale_after_secs = 300
//! ```
//!
//! Entrypoints:
//! - Parse + normalize from a TOML string: [`load_config_str`]
//! - Parse + normalize from a file path: [`load_config_path`]
//! - Environment overrides on top of a loaded config: [`PulseConfig::apply_env`]

use std::{collections::HashSet, mem, num::NonZeroU32, ops::RangeInclusive, path::Path};

use anyhow::Context;
use chrono::{Duration, NaiveTime};
use chrono_tz::Tz;
use market_feed::{
    models::timeframe::{Timeframe, TimeframeUnit},
    providers::{registry::ProviderId, yahoo_chart::provider::DEFAULT_REQUESTS_PER_SECOND},
};
use nonzero_ext::nonzero;
use serde::{Deserialize, Serialize};
use shared_utils::{env::parse_optional_env_var, toml_file::read_toml};
use thiserror::Error;
use tracing::debug;

use crate::{
    cycle::Universe,
    metrics::{MetricsConfig, VolumeWindow},
    session::MarketSession,
    signal::SignalThresholds,
};

/// Config file used when `--config` is not given.
pub const CONFIG_PATH_ENV: &str = "PULSE_CONFIG";

/// Overrides `cache.ttl_secs`.
pub const CACHE_TTL_ENV: &str = "PULSE_CACHE_TTL_SECS";

/// Overrides `refresh.interval_secs`.
pub const REFRESH_INTERVAL_ENV: &str = "PULSE_REFRESH_SECS";

/// Longest `provider.lookback` accepted, in days.
pub const MAX_LOOKBACK_DAYS: i64 = 366;

/// Allowed auto-refresh period, in seconds.
pub const REFRESH_INTERVAL_RANGE: RangeInclusive<u64> = 5..=60;

const DEFAULT_SYMBOLS: [&str; 15] = [
    "RELIANCE.NS",
    "TCS.NS",
    "HDFCBANK.NS",
    "ICICIBANK.NS",
    "INFY.NS",
    "SBIN.NS",
    "ITC.NS",
    "LT.NS",
    "BHARTIARTL.NS",
    "TATAMOTORS.NS",
    "AXISBANK.NS",
    "MARUTI.NS",
    "ADANIENT.NS",
    "BAJFINANCE.NS",
    "WIPRO.NS",
];

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PulseConfig {
    pub provider: ProviderCfg,
    pub universe: UniverseCfg,
    pub engine: EngineCfg,
    pub cache: CacheCfg,
    pub refresh: RefreshCfg,
    pub session: SessionCfg,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderCfg {
    pub kind: ProviderId,
    /// Bar interval, e.g. `"1m"`.
    pub interval: Timeframe,
    /// How far back each fetch reaches, e.g. `"5d"`.
    pub lookback: Timeframe,
    pub requests_per_second: NonZeroU32,
}

impl Default for ProviderCfg {
    fn default() -> Self {
        Self {
            kind: ProviderId::default(),
            interval: Timeframe::new(nonzero!(1u32), TimeframeUnit::Minute),
            lookback: Timeframe::new(nonzero!(5u32), TimeframeUnit::Day),
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UniverseCfg {
    /// Provider symbols, in display order.
    pub symbols: Vec<String>,
    /// Suffix stripped from symbols when shown.
    pub display_suffix: Option<String>,
}

impl Default for UniverseCfg {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            display_suffix: Some(".NS".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineCfg {
    pub volume_window: VolumeWindow,
    pub thresholds: SignalThresholds,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheCfg {
    /// Seconds a fetch stays fresh; `0` turns the cache off.
    pub ttl_secs: u64,
}

impl Default for CacheCfg {
    fn default() -> Self {
        Self { ttl_secs: 60 }
    }
}

impl CacheCfg {
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| seconds(self.ttl_secs))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RefreshCfg {
    pub auto: bool,
    pub interval_secs: u64,
}

impl Default for RefreshCfg {
    fn default() -> Self {
        Self {
            auto: true,
            interval_secs: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionCfg {
    pub timezone: Tz,
    #[serde(with = "hh_mm")]
    pub open: NaiveTime,
    #[serde(with = "hh_mm")]
    pub close: NaiveTime,
    /// Age after which the last bar is flagged as stale.
    pub stale_after_secs: u64,
}

impl Default for SessionCfg {
    fn default() -> Self {
        let nse = MarketSession::default();
        Self {
            timezone: nse.timezone,
            open: nse.open,
            close: nse.close,
            stale_after_secs: 300,
        }
    }
}

impl SessionCfg {
    pub fn stale_after(&self) -> Duration {
        seconds(self.stale_after_secs)
    }
}

fn seconds(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

/// `HH:MM` wall-clock times.
mod hh_mm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&t.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(raw.trim(), FORMAT)
            .map_err(|e| D::Error::custom(format!("invalid time {raw:?} (expected HH:MM): {e}")))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("universe.symbols is empty")]
    EmptyUniverse,

    #[error("universe.symbols[{index}] is blank")]
    BlankSymbol { index: usize },

    #[error("refresh interval {secs}s is outside {min}..={max}s")]
    RefreshInterval { secs: u64, min: u64, max: u64 },

    #[error("session open {open} is not before close {close}")]
    SessionHours { open: NaiveTime, close: NaiveTime },

    #[error("provider.lookback {lookback} exceeds {max_days} days")]
    Lookback { lookback: Timeframe, max_days: i64 },
}

/// Summary of changes performed during normalization.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    /// Symbols whose spelling changed (whitespace, case).
    pub symbols_rewritten: usize,
    /// Repeated symbols removed, first occurrence kept.
    pub symbols_deduped: usize,
    /// `true` when the display suffix was blank and dropped.
    pub display_suffix_dropped: bool,
}

impl RefreshCfg {
    fn validate(&self) -> Result<(), ConfigError> {
        if REFRESH_INTERVAL_RANGE.contains(&self.interval_secs) {
            Ok(())
        } else {
            Err(ConfigError::RefreshInterval {
                secs: self.interval_secs,
                min: *REFRESH_INTERVAL_RANGE.start(),
                max: *REFRESH_INTERVAL_RANGE.end(),
            })
        }
    }
}

impl PulseConfig {
    /// Normalizes the config in place.
    ///
    /// - Symbols are trimmed and upper-cased, then de-duplicated preserving order
    /// - The display suffix is trimmed and upper-cased; a blank one is dropped
    ///
    /// Errors on an empty universe, a blank symbol, a refresh interval outside
    /// [`REFRESH_INTERVAL_RANGE`], a lookback longer than [`MAX_LOOKBACK_DAYS`],
    /// or session hours that do not open before they close.
    pub fn normalize(&mut self) -> Result<NormalizationReport, ConfigError> {
        let mut report = NormalizationReport::default();

        let raw = mem::take(&mut self.universe.symbols);
        let before_len = raw.len();
        let mut seen = HashSet::new();
        let mut symbols = Vec::with_capacity(before_len);
        for (index, original) in raw.into_iter().enumerate() {
            let symbol = original.trim().to_uppercase();
            if symbol.is_empty() {
                return Err(ConfigError::BlankSymbol { index });
            }
            if symbol != original {
                report.symbols_rewritten += 1;
            }
            if seen.insert(symbol.clone()) {
                symbols.push(symbol);
            }
        }
        report.symbols_deduped = before_len - symbols.len();
        if symbols.is_empty() {
            return Err(ConfigError::EmptyUniverse);
        }
        self.universe.symbols = symbols;

        if let Some(suffix) = self.universe.display_suffix.take() {
            let suffix = suffix.trim().to_uppercase();
            if suffix.is_empty() {
                report.display_suffix_dropped = true;
            } else {
                self.universe.display_suffix = Some(suffix);
            }
        }

        self.refresh.validate()?;

        if self.provider.lookback.duration() > Duration::days(MAX_LOOKBACK_DAYS) {
            return Err(ConfigError::Lookback {
                lookback: self.provider.lookback,
                max_days: MAX_LOOKBACK_DAYS,
            });
        }

        if self.session.open >= self.session.close {
            return Err(ConfigError::SessionHours {
                open: self.session.open,
                close: self.session.close,
            });
        }

        Ok(report)
    }

    /// Applies [`CACHE_TTL_ENV`] and [`REFRESH_INTERVAL_ENV`] when set.
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Some(ttl) = parse_optional_env_var::<u64>(CACHE_TTL_ENV)? {
            self.cache.ttl_secs = ttl;
        }
        if let Some(secs) = parse_optional_env_var::<u64>(REFRESH_INTERVAL_ENV)? {
            self.refresh.interval_secs = secs;
            self.refresh.validate()?;
        }
        Ok(())
    }

    pub fn universe(&self) -> Universe {
        Universe {
            symbols: self.universe.symbols.clone(),
            interval: self.provider.interval,
            lookback: self.provider.lookback,
        }
    }

    pub fn metrics(&self) -> MetricsConfig {
        MetricsConfig {
            volume_window: self.engine.volume_window,
            thresholds: self.engine.thresholds,
            display_suffix: self.universe.display_suffix.clone(),
        }
    }

    pub fn market_session(&self) -> MarketSession {
        MarketSession {
            timezone: self.session.timezone,
            open: self.session.open,
            close: self.session.close,
        }
    }
}

/// The built-in configuration, normalized.
pub fn default_config() -> anyhow::Result<PulseConfig> {
    load_config_str("")
}

/// Parse and normalize a config from a TOML string.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<PulseConfig> {
    let mut cfg: PulseConfig = toml::from_str(toml_str).context("failed to parse config TOML")?;
    let report = cfg.normalize().context("invalid configuration")?;
    debug!(?report, "config normalized");
    Ok(cfg)
}

/// Read a config TOML file from disk, parse, and normalize it.
pub fn load_config_path(path: impl AsRef<Path>) -> anyhow::Result<PulseConfig> {
    let path = path.as_ref();
    let mut cfg: PulseConfig =
        read_toml(path).with_context(|| format!("load config {}", path.display()))?;
    let report = cfg
        .normalize()
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    debug!(?report, "config normalized");
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use std::{io::Write, num::NonZeroUsize};

    use chrono::Utc;
    use serial_test::serial;

    use super::*;

    #[test]
    fn empty_file_is_the_nse_dashboard() {
        let cfg = load_config_str("").unwrap();
        assert_eq!(cfg.universe.symbols.len(), 15);
        assert_eq!(cfg.universe.symbols[0], "RELIANCE.NS");
        assert_eq!(cfg.universe.display_suffix.as_deref(), Some(".NS"));
        assert_eq!(cfg.provider.kind, ProviderId::Yahoo);
        assert_eq!(cfg.provider.interval.to_string(), "1m");
        assert_eq!(cfg.provider.lookback.to_string(), "5d");
        assert_eq!(cfg.engine.volume_window, VolumeWindow::WholeSeries);
        assert_eq!(cfg.cache.ttl(), Some(Duration::seconds(60)));
        assert_eq!(cfg.refresh.interval_secs, 15);
        assert_eq!(cfg.market_session(), MarketSession::default());
    }

    #[test]
    fn parses_every_section() {
        let cfg = load_config_str(
            r#"
            [provider]
            kind = "alpaca"
            interval = "5m"
            lookback = "1W"
            requests_per_second = 2

            [universe]
            symbols = ["aapl", " msft ", "AAPL"]
            display_suffix = ""

            [engine]
            volume_window = { trailing = 20 }
            thresholds = { strong_move_pct = 1.0, volume_surge_multiple = 2.0 }

            [cache]
            ttl_secs = 0

            [refresh]
            auto = false
            interval_secs = 30

            [session]
            timezone = "America/New_York"
            open = "09:30"
            close = "16:00"
            stale_after_secs = 120
            "#,
        )
        .unwrap();

        assert_eq!(cfg.provider.kind, ProviderId::Alpaca);
        assert_eq!(cfg.provider.interval.to_string(), "5m");
        assert_eq!(cfg.provider.requests_per_second.get(), 2);
        assert_eq!(cfg.universe.symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(cfg.universe.display_suffix, None);
        assert_eq!(
            cfg.engine.volume_window,
            VolumeWindow::Trailing(NonZeroUsize::new(20).unwrap())
        );
        assert_eq!(cfg.engine.thresholds.strong_move_pct, 1.0);
        assert_eq!(cfg.cache.ttl(), None);
        assert!(!cfg.refresh.auto);
        assert_eq!(cfg.session.timezone, Tz::America__New_York);
        assert_eq!(cfg.session.open, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(cfg.session.stale_after(), Duration::seconds(120));

        let metrics = cfg.metrics();
        assert_eq!(metrics.display_suffix, None);
        assert_eq!(metrics.thresholds.volume_surge_multiple, 2.0);
    }

    #[test]
    fn normalization_report_counts_changes() {
        let mut cfg = PulseConfig::default();
        cfg.universe.symbols = vec!["tcs.ns".into(), "TCS.NS".into(), " itc.ns".into()];
        cfg.universe.display_suffix = Some("  ".into());

        let report = cfg.normalize().unwrap();
        assert_eq!(
            report,
            NormalizationReport {
                symbols_rewritten: 2,
                symbols_deduped: 1,
                display_suffix_dropped: true,
            }
        );
        assert_eq!(cfg.universe.symbols, vec!["TCS.NS", "ITC.NS"]);
    }

    #[test]
    fn rejects_empty_universe() {
        let err = load_config_str("[universe]\nsymbols = []").unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::EmptyUniverse)
        );
    }

    #[test]
    fn rejects_blank_symbol() {
        let mut cfg = PulseConfig::default();
        cfg.universe.symbols = vec!["TCS.NS".into(), "   ".into()];
        assert_eq!(cfg.normalize(), Err(ConfigError::BlankSymbol { index: 1 }));
    }

    #[test]
    fn rejects_out_of_range_refresh() {
        let err = load_config_str("[refresh]\ninterval_secs = 2").unwrap_err();
        assert!(format!("{err:#}").contains("outside 5..=60s"));
    }

    #[test]
    fn rejects_oversized_lookback() {
        let err = load_config_str("[provider]\nlookback = \"200000000d\"").unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::Lookback {
                lookback: "200000000d".parse().unwrap(),
                max_days: MAX_LOOKBACK_DAYS,
            })
        );
        assert!(load_config_str("[provider]\nlookback = \"53W\"").is_err());

        let cfg = load_config_str("[provider]\nlookback = \"12M\"").unwrap();
        let request = cfg.universe().request(Utc::now());
        assert_eq!(request.end - request.start, Duration::days(360));
    }

    #[test]
    fn rejects_inverted_session() {
        let err = load_config_str("[session]\nopen = \"16:00\"\nclose = \"09:00\"").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::SessionHours { .. })
        ));
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        assert!(load_config_str("[cache]\nttl = 5").is_err());
        assert!(load_config_str("[provider]\ninterval = \"1x\"").is_err());
        assert!(load_config_str("[provider]\nkind = \"bloomberg\"").is_err());
        assert!(load_config_str("[session]\nopen = \"9am\"").is_err());
        assert!(load_config_str("[session]\ntimezone = \"Mars/Olympus\"").is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[universe]\nsymbols = [\"wipro.ns\"]").unwrap();

        let cfg = load_config_path(file.path()).unwrap();
        assert_eq!(cfg.universe.symbols, vec!["WIPRO.NS"]);
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = load_config_path(&path).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn normalized_config_round_trips_through_toml() {
        let cfg = default_config().unwrap();
        let text = toml::to_string(&cfg).unwrap();
        assert_eq!(load_config_str(&text).unwrap(), cfg);
    }

    fn set(name: &str, value: &str) {
        unsafe { std::env::set_var(name, value) };
    }

    fn clear(name: &str) {
        unsafe { std::env::remove_var(name) };
    }

    #[test]
    #[serial]
    fn env_overrides_cache_and_refresh() {
        set(CACHE_TTL_ENV, "0");
        set(REFRESH_INTERVAL_ENV, "45");
        let mut cfg = default_config().unwrap();
        let result = cfg.apply_env();
        clear(CACHE_TTL_ENV);
        clear(REFRESH_INTERVAL_ENV);

        result.unwrap();
        assert_eq!(cfg.cache.ttl(), None);
        assert_eq!(cfg.refresh.interval_secs, 45);
    }

    #[test]
    #[serial]
    fn env_override_is_validated() {
        set(REFRESH_INTERVAL_ENV, "600");
        let mut cfg = default_config().unwrap();
        let out_of_range = cfg.apply_env();
        set(REFRESH_INTERVAL_ENV, "soon");
        let unparsable = cfg.apply_env();
        clear(REFRESH_INTERVAL_ENV);

        assert!(out_of_range.is_err());
        assert!(unparsable.unwrap_err().to_string().contains(REFRESH_INTERVAL_ENV));
    }
}

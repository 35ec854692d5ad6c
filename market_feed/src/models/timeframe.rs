//! Timeframe utilities for expressing uniform bar intervals and lookback windows.
//!
//! A [`Timeframe`] pairs a non-zero amount with a [`TimeframeUnit`]. The same
//! type describes the sampling interval of a bar series (`1m`, `5m`) and the
//! length of the lookback window requested from a provider (`5d`).
//!
//! ```
//! use market_feed::models::timeframe::{Timeframe, TimeframeUnit};
//!
//! let tf: Timeframe = "5m".parse().unwrap();
//! assert_eq!(tf.amount().get(), 5);
//! assert_eq!(tf.unit(), TimeframeUnit::Minute);
//! assert_eq!(tf.to_string(), "5m");
//! ```

use std::{fmt, num::NonZeroU32, str::FromStr};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeframeError {
    #[error("empty timeframe")]
    Empty,

    #[error("invalid timeframe amount in {input:?}")]
    InvalidAmount { input: String },

    #[error("unknown timeframe unit {unit:?} (expected m, h, d/D, w/W or M)")]
    UnknownUnit { unit: String },
}

/// Timeframe granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeframeUnit {
    Minute,
    Hour,
    Day,
    Week,
    /// Calendar months. Durations treat a month as 30 days.
    Month,
}

/// A timeframe = amount × unit (e.g., 1-Minute, 5-Minute, 5-Day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timeframe {
    amount: NonZeroU32,
    unit: TimeframeUnit,
}

impl Timeframe {
    pub const fn new(amount: NonZeroU32, unit: TimeframeUnit) -> Self {
        Self { amount, unit }
    }

    pub const fn amount(&self) -> NonZeroU32 {
        self.amount
    }

    pub const fn unit(&self) -> TimeframeUnit {
        self.unit
    }

    /// Wall-clock length of one timeframe, saturating at [`Duration::MAX`].
    pub fn duration(&self) -> Duration {
        let a = i64::from(self.amount.get());
        match self.unit {
            TimeframeUnit::Minute => Duration::try_minutes(a),
            TimeframeUnit::Hour => Duration::try_hours(a),
            TimeframeUnit::Day => Duration::try_days(a),
            TimeframeUnit::Week => Duration::try_weeks(a),
            TimeframeUnit::Month => Duration::try_days(30 * a),
        }
        .unwrap_or(Duration::MAX)
    }
}

/// `"5m"`, `"1h"`, `"5d"`, `"1W"`, `"6M"`.
impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.amount.get();
        let u = match self.unit {
            TimeframeUnit::Minute => "m",
            TimeframeUnit::Hour => "h",
            TimeframeUnit::Day => "d",
            TimeframeUnit::Week => "W",
            TimeframeUnit::Month => "M",
        };
        write!(f, "{a}{u}")
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TimeframeError::Empty);
        }
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| TimeframeError::UnknownUnit { unit: String::new() })?;
        let (digits, unit) = s.split_at(split);
        let amount = digits
            .parse::<u32>()
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| TimeframeError::InvalidAmount {
                input: s.to_string(),
            })?;
        // `m` is minute and `M` is month; day and week accept either case.
        let unit = match unit {
            "m" | "min" => TimeframeUnit::Minute,
            "h" | "H" => TimeframeUnit::Hour,
            "d" | "D" => TimeframeUnit::Day,
            "w" | "W" => TimeframeUnit::Week,
            "M" | "mo" => TimeframeUnit::Month,
            other => {
                return Err(TimeframeError::UnknownUnit {
                    unit: other.to_string(),
                });
            }
        };
        Ok(Timeframe::new(amount, unit))
    }
}

impl TryFrom<String> for Timeframe {
    type Error = TimeframeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.to_string()
    }
}

#[cfg(test)]
mod tests {
    use nonzero_ext::nonzero;

    use super::*;

    #[test]
    fn parses_units() {
        assert_eq!(
            "1m".parse::<Timeframe>().unwrap(),
            Timeframe::new(nonzero!(1u32), TimeframeUnit::Minute)
        );
        assert_eq!(
            "5d".parse::<Timeframe>().unwrap(),
            Timeframe::new(nonzero!(5u32), TimeframeUnit::Day)
        );
        assert_eq!(
            "5D".parse::<Timeframe>().unwrap(),
            "5d".parse::<Timeframe>().unwrap()
        );
        assert_eq!(
            "3M".parse::<Timeframe>().unwrap().unit(),
            TimeframeUnit::Month
        );
        assert_eq!(
            " 15min ".parse::<Timeframe>().unwrap().to_string(),
            "15m"
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!("".parse::<Timeframe>().unwrap_err(), TimeframeError::Empty);
        assert!(matches!(
            "0m".parse::<Timeframe>(),
            Err(TimeframeError::InvalidAmount { .. })
        ));
        assert!(matches!(
            "m".parse::<Timeframe>(),
            Err(TimeframeError::InvalidAmount { .. })
        ));
        assert!(matches!(
            "5".parse::<Timeframe>(),
            Err(TimeframeError::UnknownUnit { .. })
        ));
        assert!(matches!(
            "5y".parse::<Timeframe>(),
            Err(TimeframeError::UnknownUnit { .. })
        ));
    }

    #[test]
    fn durations() {
        let tf: Timeframe = "5d".parse().unwrap();
        assert_eq!(tf.duration(), Duration::days(5));
        let tf: Timeframe = "2h".parse().unwrap();
        assert_eq!(tf.duration(), Duration::minutes(120));
    }

    #[test]
    fn huge_amounts_saturate() {
        let tf: Timeframe = "200000000d".parse().unwrap();
        assert_eq!(tf.duration(), Duration::MAX);
        let tf: Timeframe = "4294967295M".parse().unwrap();
        assert_eq!(tf.duration(), Duration::MAX);
        let tf: Timeframe = "4294967295m".parse().unwrap();
        assert_eq!(tf.duration(), Duration::minutes(4_294_967_295));
    }

    #[test]
    fn serde_uses_string_form() {
        #[derive(Deserialize, Serialize)]
        struct Wrapper {
            interval: Timeframe,
        }
        let w: Wrapper = serde_json::from_str(r#"{"interval":"5m"}"#).unwrap();
        assert_eq!(w.interval.amount().get(), 5);
        assert_eq!(serde_json::to_string(&w).unwrap(), r#"{"interval":"5m"}"#);
        assert!(serde_json::from_str::<Wrapper>(r#"{"interval":"5x"}"#).is_err());
    }
}

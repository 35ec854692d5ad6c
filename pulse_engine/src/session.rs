//! Exchange trading-session clock.
//!
//! The exchange is open on weekdays between `open` and `close` local time,
//! both ends inclusive. Holidays are not modelled. Local wall-clock times are
//! resolved through `chrono-tz`, so a session defined in `Asia/Kolkata` is
//! judged correctly from a host running in any zone.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Live,
    Closed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionStatus::Live => "LIVE MARKET",
            SessionStatus::Closed => "MARKET CLOSED",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketSession {
    pub timezone: Tz,
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl Default for MarketSession {
    /// NSE cash market hours.
    fn default() -> Self {
        Self {
            timezone: Tz::Asia__Kolkata,
            open: NaiveTime::from_hms_opt(9, 15, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(15, 30, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl MarketSession {
    pub fn status_at(&self, now: DateTime<Utc>) -> SessionStatus {
        let local = now.with_timezone(&self.timezone);
        let weekday = !matches!(local.weekday(), Weekday::Sat | Weekday::Sun);
        let t = local.time();
        if weekday && self.open <= t && t <= self.close {
            SessionStatus::Live
        } else {
            SessionStatus::Closed
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.status_at(now) == SessionStatus::Live
    }
}

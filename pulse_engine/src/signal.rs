//! Signal classification.
//!
//! A record's label depends only on its percent change and volume multiple:
//!
//! | condition                                   | label         |
//! |---------------------------------------------|---------------|
//! | change > +move and multiple >= surge        | `StrongBuy`   |
//! | change < -move and multiple >= surge        | `StrongSell`  |
//! | multiple >= surge                           | `Watch`       |
//! | otherwise                                   | `NoSignal`    |

use std::fmt;

use serde::{Deserialize, Serialize};

/// Absolute percent change a bar must exceed to count as a strong move.
pub const STRONG_MOVE_PCT: f64 = 0.8;

/// Volume multiple at which a bar counts as a volume surge.
pub const VOLUME_SURGE_MULTIPLE: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SignalThresholds {
    pub strong_move_pct: f64,
    pub volume_surge_multiple: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            strong_move_pct: STRONG_MOVE_PCT,
            volume_surge_multiple: VOLUME_SURGE_MULTIPLE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalLabel {
    StrongBuy,
    StrongSell,
    Watch,
    #[serde(rename = "NONE")]
    NoSignal,
}

impl SignalLabel {
    /// `false` only for [`SignalLabel::NoSignal`].
    pub fn is_signal(self) -> bool {
        self != SignalLabel::NoSignal
    }
}

impl fmt::Display for SignalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignalLabel::StrongBuy => "STRONG BUY",
            SignalLabel::StrongSell => "STRONG SELL",
            SignalLabel::Watch => "WATCH",
            SignalLabel::NoSignal => "",
        })
    }
}

pub fn classify(
    percent_change: f64,
    volume_multiple: f64,
    thresholds: &SignalThresholds,
) -> SignalLabel {
    let surge = volume_multiple >= thresholds.volume_surge_multiple;
    if !surge {
        return SignalLabel::NoSignal;
    }
    if percent_change > thresholds.strong_move_pct {
        SignalLabel::StrongBuy
    } else if percent_change < -thresholds.strong_move_pct {
        SignalLabel::StrongSell
    } else {
        SignalLabel::Watch
    }
}

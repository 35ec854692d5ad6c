//! Terminal presentation of a cycle snapshot.
//!
//! All number formatting lives here; the engine hands over raw values.

use std::fmt::Write as _;

use chrono::{DateTime, Duration, Utc};
use clap::ValueEnum;
use serde::Serialize;
use serde_json::{Value, json};
use tabled::{Table, Tabled, settings::Style};

use crate::{
    cycle::CycleSnapshot,
    metrics::MetricRecord,
    session::SessionStatus,
    views::{MarketBias, OptionClock, SignalView},
};

pub const NO_SIGNAL_MESSAGE: &str = "No strong stock signal yet";
pub const NO_DATA_MESSAGE: &str = "No market data available";

/// Dashboard pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    MarketWise,
    TradeFlow,
    Signals,
    OptionClock,
    IndexMovers,
    All,
}

static PAGES: [View; 5] = [
    View::MarketWise,
    View::TradeFlow,
    View::Signals,
    View::OptionClock,
    View::IndexMovers,
];

impl View {
    fn pages(self) -> &'static [View] {
        match self {
            View::All => &PAGES,
            View::MarketWise => &PAGES[0..1],
            View::TradeFlow => &PAGES[1..2],
            View::Signals => &PAGES[2..3],
            View::OptionClock => &PAGES[3..4],
            View::IndexMovers => &PAGES[4..5],
        }
    }

    fn title(self) -> &'static str {
        match self {
            View::MarketWise => "Market Wise",
            View::TradeFlow => "Trade Flow (High Volume)",
            View::Signals => "Live Stock Signals (Intraday)",
            View::OptionClock => "Option Clock (Live Intraday Bias)",
            View::IndexMovers => "Index Movers",
            View::All => "All",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn of(confidence: f64) -> Self {
        if confidence >= 70.0 {
            ConfidenceBand::High
        } else if confidence >= 40.0 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ConfidenceBand::High => "high",
            ConfidenceBand::Medium => "medium",
            ConfidenceBand::Low => "low",
        }
    }
}

/// Context needed to format records.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub now: DateTime<Utc>,
    pub stale_after: Duration,
}

#[derive(Debug, Tabled)]
struct Row {
    #[tabled(rename = "SYMBOL")]
    symbol: String,
    #[tabled(rename = "LTP")]
    ltp: String,
    #[tabled(rename = "CHANGE")]
    change: String,
    #[tabled(rename = "VOL")]
    volume: String,
    #[tabled(rename = "X_FACTOR")]
    x_factor: String,
    #[tabled(rename = "CONFIDENCE")]
    confidence: String,
    #[tabled(rename = "TIME")]
    time: String,
    #[tabled(rename = "SIGNAL")]
    signal: String,
}

impl Row {
    fn new(r: &MetricRecord, opts: &RenderOptions) -> Self {
        let mut time = r.observed_at.format("%H:%M").to_string();
        if r.is_stale(opts.now, opts.stale_after) {
            time.push_str(" (stale)");
        }
        Self {
            symbol: r.symbol.clone(),
            ltp: format_price(r.last_price),
            change: format_change(r.percent_change),
            volume: group_thousands(r.volume),
            x_factor: format!("{:.2}x", r.volume_multiple),
            confidence: format!(
                "{:.1} ({})",
                r.confidence,
                ConfidenceBand::of(r.confidence).as_str()
            ),
            time,
            signal: r.signal.to_string(),
        }
    }
}

pub fn format_price(price: f64) -> String {
    format!("₹{price:.2}")
}

pub fn format_change(pct: f64) -> String {
    format!("{pct:+.2}%")
}

/// `1234567` → `1,234,567`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn table(records: &[&MetricRecord], opts: &RenderOptions) -> String {
    if records.is_empty() {
        return "(none)".to_string();
    }
    let mut table = Table::new(records.iter().map(|r| Row::new(r, opts)));
    table.with(Style::rounded());
    table.to_string()
}

fn bias_line(clock: &OptionClock) -> &'static str {
    match clock.bias {
        MarketBias::Bullish => "BULLISH (put writing likely)",
        MarketBias::Bearish => "BEARISH (call writing likely)",
        MarketBias::Sideways => "SIDEWAYS / WAIT",
    }
}

fn page(view: View, snapshot: &CycleSnapshot, opts: &RenderOptions) -> String {
    if snapshot.is_empty() && view != View::OptionClock {
        return NO_DATA_MESSAGE.to_string();
    }
    match view {
        View::MarketWise => format!(
            "Gainers\n{}\n\nLosers\n{}",
            table(&snapshot.gainers(), opts),
            table(&snapshot.losers(), opts)
        ),
        View::TradeFlow => table(&snapshot.trade_flow(), opts),
        View::IndexMovers => table(&snapshot.index_movers(), opts),
        View::Signals => match snapshot.signaled() {
            SignalView::NoData => NO_DATA_MESSAGE.to_string(),
            SignalView::NoSignal => NO_SIGNAL_MESSAGE.to_string(),
            SignalView::Signals(hits) => table(&hits, opts),
        },
        View::OptionClock => {
            let clock = snapshot.option_clock();
            format!(
                "{}\naverage change {} across {} stocks",
                bias_line(&clock),
                format_change(clock.average_change),
                snapshot.records.len()
            )
        }
        View::All => String::new(),
    }
}

/// Status line shown above every page.
pub fn header(
    status: SessionStatus,
    snapshot: Option<&CycleSnapshot>,
    last_error: Option<&str>,
) -> String {
    let mut out = format!("Intraday Pulse  [{status}]");
    match snapshot {
        Some(s) => {
            let _ = write!(
                out,
                "  computed {} UTC  {} stocks",
                s.computed_at.format("%H:%M:%S"),
                s.records.len()
            );
            if !s.skipped.is_empty() {
                let _ = write!(out, ", {} skipped", s.skipped.len());
            }
        }
        None => out.push_str("  waiting for first refresh"),
    }
    if let Some(e) = last_error {
        let _ = write!(out, "\nrefresh failed, showing previous data: {e}");
    }
    out
}

/// Renders `view` (every page for [`View::All`]) from `snapshot`.
pub fn render_view(view: View, snapshot: Option<&CycleSnapshot>, opts: &RenderOptions) -> String {
    let Some(snapshot) = snapshot else {
        return NO_DATA_MESSAGE.to_string();
    };
    view.pages()
        .iter()
        .map(|&p| format!("== {} ==\n{}", p.title(), page(p, snapshot, opts)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn page_json(view: View, snapshot: &CycleSnapshot) -> Value {
    match view {
        View::MarketWise => json!({
            "gainers": snapshot.gainers(),
            "losers": snapshot.losers(),
        }),
        View::TradeFlow => json!(snapshot.trade_flow()),
        View::IndexMovers => json!(snapshot.index_movers()),
        View::Signals => json!(snapshot.signaled()),
        View::OptionClock => json!(snapshot.option_clock()),
        View::All => Value::Null,
    }
}

/// Machine-readable form of [`render_view`].
///
/// `last_error` is the most recent refresh failure; when set, `views` holds
/// the previous good snapshot.
pub fn view_json(
    view: View,
    status: SessionStatus,
    snapshot: Option<&CycleSnapshot>,
    last_error: Option<&str>,
) -> Value {
    let Some(snapshot) = snapshot else {
        return json!({ "session": status, "last_error": last_error, "data": null });
    };
    let mut pages = serde_json::Map::new();
    for &p in view.pages() {
        let key = p
            .to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_default();
        pages.insert(key, page_json(p, snapshot));
    }
    json!({
        "session": status,
        "last_error": last_error,
        "computed_at": snapshot.computed_at,
        "skipped": snapshot.skipped,
        "views": pages,
    })
}

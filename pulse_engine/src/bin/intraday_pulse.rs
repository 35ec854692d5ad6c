use std::{
    io::{self, IsTerminal},
    path::PathBuf,
    process::ExitCode,
    time::Duration as StdDuration,
};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use market_feed::{
    cache::CachedProvider,
    providers::{DataProvider, registry::build_provider},
};
use pulse_engine::{
    config::{CONFIG_PATH_ENV, PulseConfig, default_config, load_config_path},
    cycle::{Dashboard, run_cycle},
    render::{RenderOptions, View, header, render_view, view_json},
};
use shared_utils::env::get_optional_env_var;
use tokio::{sync::mpsc, time::MissedTickBehavior};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Intraday stock pulse dashboard")]
struct Cli {
    /// Dashboard config (TOML). Defaults to $PULSE_CONFIG, then the built-in NSE universe
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch bars and render a dashboard view
    Show {
        #[arg(value_enum)]
        view: View,

        /// Keep refreshing until interrupted
        #[arg(long, conflicts_with = "once")]
        watch: bool,

        /// Render a single refresh even when auto refresh is configured
        #[arg(long)]
        once: bool,

        /// Seconds between refreshes (overrides refresh.interval_secs)
        #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(5..=60))]
        interval: Option<u64>,

        /// Always hit the provider
        #[arg(long)]
        no_cache: bool,

        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Validate the config and print it normalized
    CheckConfig,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<PulseConfig> {
    let path = path.or_else(|| get_optional_env_var(CONFIG_PATH_ENV).map(PathBuf::from));
    let mut cfg = match path {
        Some(path) => load_config_path(path)?,
        None => default_config()?,
    };
    cfg.apply_env().context("invalid environment override")?;
    Ok(cfg)
}

enum Source {
    Cached(CachedProvider<Box<dyn DataProvider>>),
    Direct(Box<dyn DataProvider>),
}

impl Source {
    fn connect(cfg: &PulseConfig, no_cache: bool) -> anyhow::Result<Self> {
        let provider = build_provider(cfg.provider.kind, cfg.provider.requests_per_second)
            .with_context(|| format!("failed to initialise {} provider", cfg.provider.kind))?;
        Ok(match cfg.cache.ttl() {
            Some(ttl) if !no_cache => Source::Cached(CachedProvider::new(provider, ttl)),
            _ => Source::Direct(provider),
        })
    }

    fn provider(&self) -> &dyn DataProvider {
        match self {
            Source::Cached(p) => p,
            Source::Direct(p) => p.as_ref(),
        }
    }

    fn invalidate(&self) {
        if let Source::Cached(p) = self {
            p.cache().clear();
        }
    }
}

/// Sends a unit for every line typed on a terminal stdin.
fn manual_refresh_requests() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    if io::stdin().is_terminal() {
        std::thread::spawn(move || {
            for line in io::stdin().lines() {
                if line.is_err() || tx.send(()).is_err() {
                    break;
                }
            }
        });
    }
    rx
}

fn draw(cfg: &PulseConfig, dashboard: &Dashboard, view: View, json: bool, clear: bool) {
    let now = Utc::now();
    let status = cfg.market_session().status_at(now);
    if json {
        println!("{}", view_json(view, status, dashboard.current(), dashboard.last_error()));
        return;
    }
    let opts = RenderOptions {
        now,
        stale_after: cfg.session.stale_after(),
    };
    if clear {
        print!("\x1B[2J\x1B[H");
    }
    println!("{}", header(status, dashboard.current(), dashboard.last_error()));
    println!();
    println!("{}", render_view(view, dashboard.current(), &opts));
}

async fn show(
    cfg: PulseConfig,
    view: View,
    watch: bool,
    interval: u64,
    no_cache: bool,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let source = Source::connect(&cfg, no_cache)?;
    let universe = cfg.universe();
    let metrics = cfg.metrics();
    let mut dashboard = Dashboard::new();

    if !watch {
        dashboard.apply(run_cycle(source.provider(), &universe, &metrics, Utc::now()).await);
        draw(&cfg, &dashboard, view, json, false);
        return Ok(if dashboard.failures() > 0 {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    info!(
        provider = %cfg.provider.kind,
        symbols = universe.symbols.len(),
        interval,
        "watching"
    );
    let mut manual = manual_refresh_requests();
    let mut ticker = tokio::time::interval(StdDuration::from_secs(interval));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            Some(()) = manual.recv() => {
                info!("manual refresh");
                source.invalidate();
                ticker.reset();
            }
            _ = tokio::signal::ctrl_c() => {
                info!(cycles = dashboard.cycles(), failures = dashboard.failures(), "stopped");
                return Ok(ExitCode::SUCCESS);
            }
        }
        dashboard.apply(run_cycle(source.provider(), &universe, &metrics, Utc::now()).await);
        draw(&cfg, &dashboard, view, json, !json);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();
    let cfg = load_config(cli.config)?;

    match cli.command {
        Commands::Show {
            view,
            watch,
            once,
            interval,
            no_cache,
            json,
        } => {
            let watch = watch || (!once && !json && cfg.refresh.auto && io::stdout().is_terminal());
            let interval = interval.unwrap_or(cfg.refresh.interval_secs);
            show(cfg, view, watch, interval, no_cache, json).await
        }
        Commands::CheckConfig => {
            print!("{}", toml::to_string_pretty(&cfg)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

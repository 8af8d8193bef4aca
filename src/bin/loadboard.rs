//! Dashboard server binary.
//!
//! Serves the live results page and, with `--dev`, drives it from a
//! synthetic workload so the rendering pipeline can be exercised without a
//! real load generator attached.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use indexmap::IndexMap;
use parking_lot::Mutex;
use rand::Rng;
use tracing::{info, Level};

use loadboard::config::DashboardConfig;
use loadboard::source::{MetricSource, SourceEvents};
use loadboard::{FieldMap, Report, ReportGroup};

#[derive(Parser, Debug)]
#[command(name = "loadboard", about = "Load test results dashboard", version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Listen address, e.g. 127.0.0.1:8080
    #[arg(short, long)]
    bind: Option<std::net::SocketAddr>,

    /// Write periodic HTML snapshots to the results log
    #[arg(short, long)]
    log: bool,

    /// Results log file (implies --log)
    #[arg(long)]
    log_file: Option<String>,

    /// Feed the dashboard from a synthetic workload
    #[arg(long)]
    dev: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let mut config = match &cli.config {
        Some(path) => DashboardConfig::from_file(path)?,
        None => DashboardConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if cli.log_file.is_some() {
        config.log_file = cli.log_file.clone();
    }

    let group = Arc::new(ReportGroup::new(&config));
    if cli.log || cli.log_file.is_some() {
        group.set_logging_enabled(true);
    }

    if cli.dev {
        spawn_demo_workload(Arc::clone(&group), config.refresh_period_ms);
        info!("Synthetic workload running");
    }

    loadboard::server::serve(config.bind, group).await?;
    Ok(())
}

/// A source producing plausible latency and throughput numbers.
struct DemoSource {
    state: Mutex<DemoState>,
}

struct DemoState {
    total: u64,
    last_interval: FieldMap,
    last_mean: f64,
}

impl DemoSource {
    fn new() -> Self {
        Self {
            state: Mutex::new(DemoState {
                total: 0,
                last_interval: FieldMap::new(),
                last_mean: 0.0,
            }),
        }
    }

    /// Advance one interval of simulated traffic.
    fn tick(&self) {
        let mut rng = rand::thread_rng();
        let requests = rng.gen_range(40..120);
        let mean = rng.gen_range(8.0..45.0);

        let mut state = self.state.lock();
        state.total += requests;
        state.last_mean = mean;
        state.last_interval = [
            ("mean".to_string(), mean),
            ("p95".to_string(), mean * rng.gen_range(1.5..2.5)),
            ("requests".to_string(), requests as f64),
        ]
        .into_iter()
        .collect();
    }
}

impl MetricSource for DemoSource {
    fn stats(&self) -> IndexMap<String, FieldMap> {
        let state = self.state.lock();
        let mut stats = IndexMap::new();
        stats.insert(
            "latency".to_string(),
            [
                ("mean".to_string(), state.last_mean),
                ("total requests".to_string(), state.total as f64),
            ]
            .into_iter()
            .collect(),
        );
        stats
    }

    fn interval(&self) -> IndexMap<String, FieldMap> {
        let state = self.state.lock();
        let mut interval = IndexMap::new();
        if !state.last_interval.is_empty() {
            interval.insert("latency".to_string(), state.last_interval.clone());
        }
        interval
    }
}

fn spawn_demo_workload(group: Arc<ReportGroup>, period_ms: u64) {
    let report = group.add_report(Report::new("Synthetic Load"));
    let mut events = SourceEvents::new();
    Report::subscribe_to_source(&report, &mut events);

    tokio::spawn(async move {
        let source = DemoSource::new();
        let mut ticker = tokio::time::interval(Duration::from_millis(period_ms));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            source.tick();
            events.notify(&source);
        }
    });
}

//! Report groups: dashboard assembly and the periodic persistence cycle.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::DashboardConfig;
use crate::render::{self, TemplateData};
use crate::report::{Report, SharedReport};
use crate::sink::{default_log_name, FileSink, LogSink};

struct LogState {
    file_name: String,
    sink: Option<Box<dyn LogSink>>,
    timer: Option<JoinHandle<()>>,
    enabled: bool,
}

/// An ordered collection of reports rendered as one dashboard.
///
/// One group exists per process run; it is shared (via `Arc`) between the
/// HTTP handlers, the workload wiring, and its own snapshot timer. The
/// logging subsystem is a two-state machine (disabled/enabled) with at most
/// one active timer and one open sink at any time.
pub struct ReportGroup {
    reports: Arc<Mutex<Vec<SharedReport>>>,
    log: Arc<Mutex<LogState>>,
    refresh_period_ms: u64,
    dygraph_script_source: String,
    epoch: Instant,
}

impl ReportGroup {
    pub fn new(config: &DashboardConfig) -> Self {
        let file_name = config
            .log_file
            .clone()
            .unwrap_or_else(|| default_log_name(Local::now()));
        Self {
            reports: Arc::new(Mutex::new(Vec::new())),
            log: Arc::new(Mutex::new(LogState {
                file_name,
                sink: None,
                timer: None,
                enabled: false,
            })),
            refresh_period_ms: config.refresh_period_ms,
            dygraph_script_source: config.dygraph_script_source.clone(),
            epoch: Instant::now(),
        }
    }

    pub fn refresh_period_ms(&self) -> u64 {
        self.refresh_period_ms
    }

    /// Append a report (by name or pre-built) in display order and hand
    /// back its shared handle for further configuration.
    pub fn add_report(&self, report: impl Into<Report>) -> SharedReport {
        let mut report = report.into();
        report.anchor(self.epoch);
        let shared = report.into_shared();
        self.reports.lock().push(Arc::clone(&shared));
        shared
    }

    /// Drop the first report with this name.
    pub fn remove_report(&self, name: &str) -> Option<SharedReport> {
        let mut reports = self.reports.lock();
        let idx = reports.iter().position(|r| r.lock().name() == name)?;
        Some(reports.remove(idx))
    }

    /// Current report handles in display order.
    pub fn reports(&self) -> Vec<SharedReport> {
        self.reports.lock().clone()
    }

    /// Empty the report collection in place.
    pub fn reset(&self) {
        self.reports.lock().clear();
    }

    /// Replace the named persistence target. Applies the next time a sink
    /// is opened; the enabled state and any running timer are untouched.
    pub fn set_log_file(&self, name: impl Into<String>) {
        self.log.lock().file_name = name.into();
    }

    /// Install an externally supplied sink. The enabled state and any
    /// running timer are untouched; a previously open sink is released
    /// first.
    pub fn set_log_sink(&self, sink: Box<dyn LogSink>) {
        let mut log = self.log.lock();
        if let Some(mut old) = log.sink.take() {
            if let Err(e) = old.close() {
                warn!("Failed to close replaced log sink: {}", e);
            }
        }
        log.sink = Some(sink);
    }

    /// Toggle periodic snapshot logging. Idempotent.
    ///
    /// Enabling cancels any previous timer before starting a new one and
    /// reuses an already open sink, so at most one timer and one sink exist
    /// per group. Disabling cancels the timer, then closes and drops the
    /// sink; a later enable reopens from the configured target.
    pub fn set_logging_enabled(&self, enabled: bool) {
        let mut log = self.log.lock();
        if let Some(timer) = log.timer.take() {
            timer.abort();
        }

        if enabled {
            if log.sink.is_none() {
                match FileSink::open(&log.file_name) {
                    Ok(sink) => log.sink = Some(Box::new(sink)),
                    Err(e) => {
                        warn!("Failed to open results log {}: {}", log.file_name, e);
                    }
                }
            }
            log.timer = Some(self.spawn_log_timer());
            if !log.enabled {
                info!("Results logging enabled ({})", log.file_name);
            }
            log.enabled = true;
        } else {
            if let Some(mut sink) = log.sink.take() {
                if let Err(e) = sink.close() {
                    warn!("Failed to close results log: {}", e);
                }
            }
            if log.enabled {
                info!("Results logging disabled");
            }
            log.enabled = false;
        }
    }

    /// Recurring snapshot writer. Each tick overwrites the sink with a
    /// fresh render; a write failure is logged and the next tick still
    /// fires. Fine with an empty report collection.
    fn spawn_log_timer(&self) -> JoinHandle<()> {
        let reports = Arc::clone(&self.reports);
        let log = Arc::clone(&self.log);
        let dygraph = self.dygraph_script_source.clone();
        let period_ms = self.refresh_period_ms;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(period_ms));
            // The first tick completes immediately; skip it so writes land
            // one full period after enabling.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let html = render_html(&reports, &dygraph, period_ms);
                let mut log = log.lock();
                if let Some(sink) = log.sink.as_mut() {
                    if let Err(e) = sink.clear(&html) {
                        warn!("Periodic results write failed: {}", e);
                    }
                }
            }
        })
    }

    /// Render the dashboard for the current state. Pure read; callable at
    /// any time regardless of the logging state, including with zero
    /// reports.
    pub fn html(&self) -> String {
        render_html(&self.reports, &self.dygraph_script_source, self.refresh_period_ms)
    }

    /// JSON export of the report collection.
    pub fn reports_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self.snapshot())
    }

    fn snapshot(&self) -> Vec<Report> {
        self.reports.lock().iter().map(|r| r.lock().clone()).collect()
    }
}

impl Drop for ReportGroup {
    fn drop(&mut self) {
        if let Some(timer) = self.log.lock().timer.take() {
            timer.abort();
        }
    }
}

fn render_html(
    reports: &Mutex<Vec<SharedReport>>,
    dygraph_script_source: &str,
    refresh_period_ms: u64,
) -> String {
    let snapshot: Vec<Report> = reports.lock().iter().map(|r| r.lock().clone()).collect();
    render::dashboard(&TemplateData {
        dygraph_script_source,
        refresh_period_ms,
        reports: &snapshot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_config(refresh_period_ms: u64) -> DashboardConfig {
        DashboardConfig {
            refresh_period_ms,
            ..DashboardConfig::default()
        }
    }

    struct CountingSink {
        clears: Arc<AtomicUsize>,
        closes: Arc<AtomicUsize>,
    }

    impl LogSink for CountingSink {
        fn clear(&mut self, _content: &str) -> std::io::Result<()> {
            self.clears.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn close(&mut self) -> std::io::Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn counting_group(
        refresh_period_ms: u64,
    ) -> (ReportGroup, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let group = ReportGroup::new(&test_config(refresh_period_ms));
        let clears = Arc::new(AtomicUsize::new(0));
        let closes = Arc::new(AtomicUsize::new(0));
        group.set_log_sink(Box::new(CountingSink {
            clears: Arc::clone(&clears),
            closes: Arc::clone(&closes),
        }));
        (group, clears, closes)
    }

    #[tokio::test(start_paused = true)]
    async fn double_enable_keeps_a_single_timer_and_sink() {
        let (group, clears, closes) = counting_group(20);

        group.set_logging_enabled(true);
        group.set_logging_enabled(true);
        tokio::time::sleep(Duration::from_millis(90)).await;

        // Ticks land at 20/40/60/80ms; a duplicated timer would double this.
        let count = clears.load(Ordering::SeqCst);
        assert!((3..=5).contains(&count), "unexpected clear count {}", count);
        // The installed sink was reused, never closed or reopened.
        assert_eq!(closes.load(Ordering::SeqCst), 0);

        group.set_logging_enabled(false);
    }

    #[tokio::test(start_paused = true)]
    async fn disable_stops_writes_and_closes_the_sink_once() {
        let (group, clears, closes) = counting_group(20);

        group.set_logging_enabled(true);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(clears.load(Ordering::SeqCst) >= 1);

        group.set_logging_enabled(false);
        let after_disable = clears.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(clears.load(Ordering::SeqCst), after_disable);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disable_when_already_disabled_is_a_no_op() {
        let (group, clears, closes) = counting_group(20);
        group.set_logging_enabled(false);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(clears.load(Ordering::SeqCst), 0);
        // The externally installed sink is released on the first disable.
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        group.set_logging_enabled(false);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_writes_reach_a_file_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.html");

        let group = ReportGroup::new(&test_config(20));
        group.add_report("Workload");
        group.set_log_file(path.to_string_lossy().to_string());
        group.set_logging_enabled(true);
        tokio::time::sleep(Duration::from_millis(30)).await;
        group.set_logging_enabled(false);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("<!DOCTYPE html>"));
        assert!(content.contains("Workload"));
    }

    #[test]
    fn html_renders_before_any_report_exists() {
        let group = ReportGroup::new(&test_config(2000));
        let html = group.html();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.ends_with("</html>"));
    }

    #[test]
    fn reset_empties_the_same_collection_add_report_appends_to() {
        let group = ReportGroup::new(&test_config(2000));
        group.add_report("a");
        group.add_report("b");
        assert_eq!(group.reports().len(), 2);

        group.reset();
        assert!(group.reports().is_empty());

        group.add_report("c");
        assert_eq!(group.reports().len(), 1);
    }

    #[test]
    fn remove_report_drops_by_name() {
        let group = ReportGroup::new(&test_config(2000));
        group.add_report("keep");
        group.add_report("drop");

        let removed = group.remove_report("drop");
        assert!(removed.is_some());
        assert!(group.remove_report("drop").is_none());
        assert_eq!(group.reports().len(), 1);
        assert_eq!(group.reports()[0].lock().name(), "keep");
    }
}

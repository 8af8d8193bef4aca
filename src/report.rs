//! Reports: a named collection of charts plus a flat summary mapping,
//! refreshed from one or many metric sources.

use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;

use crate::chart::Chart;
use crate::source::{GroupEvents, MetricSource, SourceEvents, SourceGroup};
use crate::next_id;

/// A report handle shared between its group, listener registrations, and
/// whoever configured it.
pub type SharedReport = Arc<Mutex<Report>>;

/// One report: `summary` accumulates the latest value per composite key
/// (last write wins, keys are never removed); `charts` are created on
/// demand and keep insertion order for rendering and serialization.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    name: String,
    id: u64,
    summary: IndexMap<String, f64>,
    charts: IndexMap<String, Chart>,
    #[serde(skip)]
    epoch: Instant,
}

impl Report {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: next_id(),
            summary: IndexMap::new(),
            charts: IndexMap::new(),
            epoch: Instant::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn summary(&self) -> &IndexMap<String, f64> {
        &self.summary
    }

    pub fn charts(&self) -> &IndexMap<String, Chart> {
        &self.charts
    }

    pub fn into_shared(self) -> SharedReport {
        Arc::new(Mutex::new(self))
    }

    /// Re-anchor the time axis used by charts created from now on. Called
    /// by the owning group so all its charts share the process start.
    pub(crate) fn anchor(&mut self, epoch: Instant) {
        self.epoch = epoch;
    }

    /// The chart for `name`, created on first use. Repeated calls hand back
    /// the same chart, so rows `put` through any call site accumulate in
    /// one place.
    pub fn chart_mut(&mut self, name: &str) -> &mut Chart {
        let epoch = self.epoch;
        self.charts
            .entry(name.to_string())
            .or_insert_with(|| Chart::with_epoch(name, epoch))
    }

    /// Merge a source's cumulative summaries into `summary` and append its
    /// interval summaries as chart rows.
    ///
    /// Summary keys follow `"<report> <stat> <field>"`. Stats without an
    /// interval entry update the summary only.
    pub fn update_from_source(&mut self, source: &dyn MetricSource) {
        self.merge_source(None, source);
    }

    /// Refresh from every monitor of a source group within one call, in
    /// monitor order; no partial state is observable between monitors.
    ///
    /// Summary keys follow `"<report> <monitor> <stat> <field>"` and charts
    /// are named `"<monitor> <stat>"`.
    pub fn update_from_group(&mut self, group: &dyn SourceGroup) {
        for (monitor_name, source) in group.monitors() {
            self.merge_source(Some(&monitor_name), source);
        }
    }

    fn merge_source(&mut self, monitor: Option<&str>, source: &dyn MetricSource) {
        let interval = source.interval();
        for (stat_name, fields) in source.stats() {
            for (field, value) in &fields {
                let key = summary_key(&self.name, monitor, &stat_name, field);
                self.summary.insert(key, *value);
            }
            if let Some(fields) = interval.get(&stat_name) {
                let chart_name = match monitor {
                    Some(m) => format!("{} {}", m, stat_name),
                    None => stat_name.clone(),
                };
                self.chart_mut(&chart_name).put(fields);
            }
        }
    }

    /// Register the shared report on a source's update notifications; each
    /// notification runs [`Report::update_from_source`].
    pub fn subscribe_to_source(this: &SharedReport, events: &mut SourceEvents) {
        let report = Arc::clone(this);
        events.subscribe(move |source| report.lock().update_from_source(source));
    }

    /// Register the shared report on a source group's update notifications.
    pub fn subscribe_to_source_group(this: &SharedReport, events: &mut GroupEvents) {
        let report = Arc::clone(this);
        events.subscribe(move |group| report.lock().update_from_group(group));
    }
}

impl From<&str> for Report {
    fn from(name: &str) -> Self {
        Report::new(name)
    }
}

impl From<String> for Report {
    fn from(name: String) -> Self {
        Report::new(name)
    }
}

/// Composite summary key: report name, optional monitor name, stat name and
/// field name joined by single spaces.
fn summary_key(report: &str, monitor: Option<&str>, stat: &str, field: &str) -> String {
    match monitor {
        Some(m) => format!("{} {} {} {}", report, m, stat, field),
        None => format!("{} {} {}", report, stat, field),
    }
}

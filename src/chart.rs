//! Time-series tables with a shared time axis and lazily discovered columns.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

use crate::source::{SampleEvents, DEFAULT_SAMPLE_EVENT};
use crate::{next_id, FieldMap};

/// A chart handle shareable with listener registrations.
pub type SharedChart = Arc<Mutex<Chart>>;

/// One multi-series table. Column 0 is always `"time"` (elapsed minutes at
/// hundredths precision); further columns are appended in the order their
/// names first appear and keep their index for the chart's lifetime.
///
/// Row 0 is a baseline row of zeros so every column has a defined value at
/// time zero even when its data arrives later. Slots a `put` did not supply
/// stay `None` and serialize as `null`; rows appended before a column was
/// discovered are shorter than `columns`, which readers must treat as
/// "unset", not an error.
#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    name: String,
    id: u64,
    columns: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
    #[serde(skip)]
    epoch: Instant,
}

impl Chart {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_epoch(name, Instant::now())
    }

    /// Chart anchored at an externally supplied start instant so that every
    /// chart in a process shares one time axis.
    pub fn with_epoch(name: impl Into<String>, epoch: Instant) -> Self {
        Self {
            name: name.into(),
            id: next_id(),
            columns: vec!["time".to_string()],
            rows: vec![vec![Some(0.0)]],
            epoch,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }

    /// Append one row for "now".
    ///
    /// Keys never seen before become new columns at the next free index,
    /// with a matching zero slot pushed onto the baseline row. The new row
    /// carries the elapsed time in its time slot and `Some(value)` for each
    /// supplied column; everything else is left unset. An empty `data` is
    /// fine and yields a time-only row.
    pub fn put(&mut self, data: &FieldMap) {
        let time = round_minutes(self.epoch.elapsed());
        self.put_at(time, data);
    }

    pub(crate) fn put_at(&mut self, time_minutes: f64, data: &FieldMap) {
        for name in data.keys() {
            if !self.columns.iter().any(|c| c == name) {
                self.columns.push(name.clone());
                self.rows[0].push(Some(0.0));
            }
        }

        let mut row = vec![None; self.columns.len()];
        row[0] = Some(time_minutes);
        for (name, value) in data {
            if let Some(idx) = self.columns.iter().position(|c| c == name) {
                row[idx] = Some(*value);
            }
        }
        self.rows.push(row);
    }

    /// Register this chart on a sample emitter. On each matching event the
    /// listed fields present in the payload are forwarded to [`Chart::put`];
    /// absent fields are skipped. With no event name, listens under
    /// [`DEFAULT_SAMPLE_EVENT`].
    pub fn subscribe_to_samples(
        chart: &SharedChart,
        events: &mut SampleEvents,
        fields: &[String],
        event_name: Option<&str>,
    ) {
        let chart = Arc::clone(chart);
        let fields = fields.to_vec();
        events.subscribe(
            event_name.unwrap_or(DEFAULT_SAMPLE_EVENT),
            move |payload| {
                let mut picked = FieldMap::new();
                for field in &fields {
                    if let Some(value) = payload.get(field) {
                        picked.insert(field.clone(), *value);
                    }
                }
                chart.lock().put(&picked);
            },
        );
    }
}

/// Elapsed time as minutes, rounded to hundredths of a minute.
pub(crate) fn round_minutes(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() / 60.0 * 100.0).round() / 100.0
}

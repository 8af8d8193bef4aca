//! Live report/chart aggregation for load-generation workloads.
//!
//! Measurements emitted periodically by a running workload are folded into
//! named, multi-series time charts ([`Chart`]), charts are bundled into
//! reports with flat summary mappings ([`Report`]), and an ordered group of
//! reports ([`ReportGroup`]) renders them as one HTML dashboard, exports
//! them as JSON, and optionally writes periodic snapshots to a results log.
//!
//! The metric-collection side is consumed through the contracts in
//! [`source`]; the HTTP surface lives in [`server`].

pub mod chart;
pub mod config;
pub mod error;
pub mod group;
pub mod render;
pub mod report;
pub mod server;
pub mod sink;
pub mod source;

use std::sync::atomic::{AtomicU64, Ordering};

pub use chart::Chart;
pub use error::{LoadboardError, Result};
pub use group::ReportGroup;
pub use report::{Report, SharedReport};

/// Ordered field-name to value mapping exchanged with metric sources.
pub type FieldMap = indexmap::IndexMap<String, f64>;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique id for charts and reports.
pub(crate) fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

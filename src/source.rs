//! Contracts for the metric-collection side and the observer lists that
//! deliver its update notifications.
//!
//! Sources announce "new data available" with no payload; listeners read the
//! source's current state at notification time. Listeners run synchronously,
//! in subscription order, and complete before the notifying call returns, so
//! no render can observe a half-applied merge.

use indexmap::IndexMap;

use crate::FieldMap;

/// A producer of named statistics.
///
/// `stats` holds the cumulative summary per statistic; `interval` holds the
/// summary for the most recent interval and may omit statistics present in
/// `stats`.
pub trait MetricSource: Send + Sync {
    fn stats(&self) -> IndexMap<String, FieldMap>;
    fn interval(&self) -> IndexMap<String, FieldMap>;
}

/// A named bundle of sources that refresh together.
pub trait SourceGroup: Send + Sync {
    /// Sub-sources in display order.
    fn monitors(&self) -> Vec<(String, &dyn MetricSource)>;
}

/// Event name sample listeners are registered under when none is given.
pub const DEFAULT_SAMPLE_EVENT: &str = "sample";

/// Observer list for a source's update notifications.
#[derive(Default)]
pub struct SourceEvents {
    listeners: Vec<Box<dyn FnMut(&dyn MetricSource) + Send>>,
}

impl SourceEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&dyn MetricSource) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Invoke every listener with the notifying source, in subscription
    /// order. Returns once all listeners have run.
    pub fn notify(&mut self, source: &dyn MetricSource) {
        for listener in &mut self.listeners {
            listener(source);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

/// Observer list for source-group update notifications.
#[derive(Default)]
pub struct GroupEvents {
    listeners: Vec<Box<dyn FnMut(&dyn SourceGroup) + Send>>,
}

impl GroupEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&dyn SourceGroup) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn notify(&mut self, group: &dyn SourceGroup) {
        for listener in &mut self.listeners {
            listener(group);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

/// Named-event emitter carrying raw sample payloads, for feeding charts
/// directly without a full source contract.
#[derive(Default)]
pub struct SampleEvents {
    listeners: Vec<(String, Box<dyn FnMut(&FieldMap) + Send>)>,
}

impl SampleEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, event: &str, listener: impl FnMut(&FieldMap) + Send + 'static) {
        self.listeners.push((event.to_string(), Box::new(listener)));
    }

    /// Invoke the listeners registered under `event`, in subscription order.
    pub fn notify(&mut self, event: &str, payload: &FieldMap) {
        for (name, listener) in &mut self.listeners {
            if name == event {
                listener(payload);
            }
        }
    }
}

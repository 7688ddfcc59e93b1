use std::ops::Deref;
use std::sync::Arc;

use super::Event;

/// A frozen, time-ordered event sequence.
///
/// Built once after normalization and shared read-only by the dispatcher and
/// every module. Cloning is cheap; the events themselves are never mutated.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<[Event]>,
}

impl EventLog {
    /// Freeze a sequence, stable-sorting it by timestamp so that events sharing
    /// a timestamp keep their original relative order.
    pub fn freeze(mut events: Vec<Event>) -> Self {
        events.sort_by_key(|e| e.timestamp);
        Self {
            events: events.into(),
        }
    }

    /// Timestamp of the first event, if any
    pub fn start(&self) -> Option<i64> {
        self.events.first().map(|e| e.timestamp)
    }

    /// Timestamp of the last event, if any
    pub fn end(&self) -> Option<i64> {
        self.events.last().map(|e| e.timestamp)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

impl Deref for EventLog {
    type Target = [Event];

    fn deref(&self) -> &Self::Target {
        &self.events
    }
}

/// Index of the first event that is earlier than its predecessor
pub(crate) fn first_unordered(events: &[Event]) -> Option<usize> {
    events
        .windows(2)
        .position(|w| w[0].timestamp > w[1].timestamp)
        .map(|i| i + 1)
}

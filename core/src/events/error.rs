//! Error types for event validation

use thiserror::Error;

use super::EventKind;

/// An event that cannot be dispatched as-is.
///
/// Malformed events are skipped with a warning; they never fail a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventError {
    #[error("{kind:?} event at {timestamp}ms is missing required field `{field}`")]
    MissingField {
        timestamp: i64,
        kind: EventKind,
        field: &'static str,
    },

    #[error("event has negative timestamp {timestamp}ms")]
    NegativeTimestamp { timestamp: i64 },

    #[error("{kind:?} event at {timestamp}ms has non-finite `{field}`")]
    NonFinite {
        timestamp: i64,
        kind: EventKind,
        field: &'static str,
    },
}

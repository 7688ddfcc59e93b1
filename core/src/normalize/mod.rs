//! Event normalization
//!
//! Normalizers rewrite the raw event sequence once, before any module is
//! constructed. Each consumes the previous one's output; the final sequence
//! is frozen into an [`EventLog`].
//!
//! ```text
//!   raw events ──► stable sort ──► prepull_buffs ──► cast_order ──► freeze
//! ```

mod cast_order;
mod error;
mod prepull;


use std::sync::Arc;

use tracing::debug;

use crate::events::{Event, EventLog, first_unordered};

pub use cast_order::CastOrder;
pub use error::NormalizeError;
pub use prepull::PrePullBuffs;

/// A rewrite over the whole event sequence.
///
/// Output must stay non-decreasing in timestamp.
pub trait Normalizer: Send + Sync {
    fn name(&self) -> &str;

    fn normalize(&self, events: Vec<Event>) -> Result<Vec<Event>, NormalizeError>;
}

/// Built-in normalizer by its configuration name
pub fn builtin_normalizer(name: &str) -> Option<Arc<dyn Normalizer>> {
    match name {
        PrePullBuffs::NAME => Some(Arc::new(PrePullBuffs)),
        CastOrder::NAME => Some(Arc::new(CastOrder)),
        _ => None,
    }
}

/// Normalizers in their fixed run order.
#[derive(Clone, Default)]
pub struct NormalizerPass {
    normalizers: Vec<Arc<dyn Normalizer>>,
}

impl std::fmt::Debug for NormalizerPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.normalizers.iter().map(|n| n.name()))
            .finish()
    }
}

impl NormalizerPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve built-in normalizers by name, keeping the given order
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, NormalizeError> {
        let normalizers = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                builtin_normalizer(name).ok_or_else(|| NormalizeError::UnknownNormalizer {
                    name: name.to_string(),
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { normalizers })
    }

    pub fn with(mut self, normalizer: impl Normalizer + 'static) -> Self {
        self.normalizers.push(Arc::new(normalizer));
        self
    }

    pub fn push(&mut self, normalizer: Arc<dyn Normalizer>) {
        self.normalizers.push(normalizer);
    }

    pub fn is_empty(&self) -> bool {
        self.normalizers.is_empty()
    }

    /// Stable-sort the raw events, run every normalizer in order, and freeze
    /// the result.
    pub fn run(&self, mut events: Vec<Event>) -> Result<EventLog, NormalizeError> {
        events.sort_by_key(|e| e.timestamp);

        for normalizer in &self.normalizers {
            let before = events.len();
            events = normalizer.normalize(events)?;
            if let Some(index) = first_unordered(&events) {
                return Err(NormalizeError::OutOfOrder {
                    normalizer: normalizer.name().to_string(),
                    index,
                });
            }
            debug!(
                normalizer = normalizer.name(),
                before,
                after = events.len(),
                "normalizer applied"
            );
        }

        Ok(EventLog::freeze(events))
    }
}

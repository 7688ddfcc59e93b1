//! Error types for the normalizer pass

use thiserror::Error;

/// Normalization failures. Any of these aborts the run before modules are
/// constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("unknown normalizer '{name}'")]
    UnknownNormalizer { name: String },

    #[error("normalizer '{normalizer}' produced out-of-order output at index {index}")]
    OutOfOrder { normalizer: String, index: usize },

    #[error("normalizer '{normalizer}' failed: {reason}")]
    Failed { normalizer: String, reason: String },
}

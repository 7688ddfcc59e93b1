//! Error types for module construction and execution

use thiserror::Error;

/// Construction-time failures. Any of these aborts the run before a single
/// factory executes or event is processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("cyclic module dependency: {}", cycle.join(" -> "))]
    CyclicDependency {
        /// The cycle path, starting and ending with the same module
        cycle: Vec<String>,
    },

    #[error("module '{module}' depends on unknown module '{dependency}'")]
    UnknownDependency { module: String, dependency: String },

    #[error("module '{name}' is defined more than once")]
    DuplicateModule { name: String },
}

/// Failures of a single module. Recovered locally: the module is disabled and
/// left out of the output while the run continues.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("'{requester}' did not declare a dependency on '{dependency}'")]
    UndeclaredDependency {
        requester: String,
        dependency: String,
    },

    #[error("dependency '{dependency}' is not a {expected}")]
    WrongType {
        dependency: String,
        expected: &'static str,
    },

    #[error("dependency '{dependency}' failed")]
    DependencyFailed { dependency: String },

    #[error("dependency '{dependency}' is borrowed mutably")]
    DependencyBusy { dependency: String },

    #[error("invalid value for option '{key}'")]
    InvalidOption {
        key: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required option '{key}'")]
    MissingOption { key: String },

    #[error("module panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Failed(String),
}

impl ModuleError {
    /// Convenience constructor for handler failures
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

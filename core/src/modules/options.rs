use serde::de::DeserializeOwned;

use aegis_types::OptionTable;

use super::ModuleError;

/// Per-module configuration values.
///
/// Options parameterize a module (e.g. a reduced weighting factor) without
/// changing its identity in the dependency graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleOptions {
    table: OptionTable,
}

impl ModuleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(table: OptionTable) -> Self {
        Self { table }
    }

    /// Builder-style setter, mostly for tests and programmatic setups
    pub fn set(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.table.insert(key.into(), value.into());
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.table.contains_key(key)
    }

    /// Typed lookup; `Ok(None)` when the option is absent
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ModuleError> {
        self.table
            .get(key)
            .map(|value| {
                value
                    .clone()
                    .try_into()
                    .map_err(|source| ModuleError::InvalidOption {
                        key: key.to_string(),
                        source,
                    })
            })
            .transpose()
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, ModuleError> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T, ModuleError> {
        self.get(key)?.ok_or_else(|| ModuleError::MissingOption {
            key: key.to_string(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

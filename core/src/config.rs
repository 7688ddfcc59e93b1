//! Loading analysis input from disk
//!
//! The run configuration is TOML ([`AnalysisConfig`]); the event log is a
//! JSON array of [`Event`] records.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

pub use aegis_types::AnalysisConfig;

use crate::events::Event;

/// Errors while reading configuration or event files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML in {path}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse events JSON in {path}")]
    ParseEvents {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Load an [`AnalysisConfig`] from a TOML file
pub fn load_config(path: &Path) -> Result<AnalysisConfig, ConfigError> {
    let content = read(path)?;
    let config: AnalysisConfig = toml::from_str(&content).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        modules = config.modules.len(),
        cooldowns = config.cooldowns.cooldowns.len(),
        "loaded config"
    );
    Ok(config)
}

/// Events read from a JSON file, minus the records that could not be decoded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedEvents {
    pub events: Vec<Event>,
    /// Records skipped because they were not valid events
    pub skipped: usize,
}

/// Load a JSON array of events.
///
/// Only invalid JSON or a non-array top level fails the file; individual
/// records that do not decode as an [`Event`] are skipped with a warning.
pub fn load_events(path: &Path) -> Result<LoadedEvents, ConfigError> {
    let content = read(path)?;
    let records: Vec<serde_json::Value> =
        serde_json::from_str(&content).map_err(|source| ConfigError::ParseEvents {
            path: path.to_path_buf(),
            source,
        })?;

    let mut loaded = LoadedEvents {
        events: Vec::with_capacity(records.len()),
        skipped: 0,
    };
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Event>(record) {
            Ok(event) => loaded.events.push(event),
            Err(error) => {
                warn!(path = %path.display(), index, %error, "skipping malformed event record");
                loaded.skipped += 1;
            }
        }
    }

    debug!(
        path = %path.display(),
        events = loaded.events.len(),
        skipped = loaded.skipped,
        "loaded events"
    );
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_load_config_and_events() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("aegis.toml");
        fs::write(
            &config_path,
            "tracked_actor = 4\nnormalizers = [\"cast_order\"]\n",
        )
        .unwrap();
        let events_path = dir.path().join("events.json");
        fs::write(
            &events_path,
            r#"[{"timestamp": 0, "kind": "cast", "source_id": 4, "target_id": 4, "ability_id": 12}]"#,
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.tracked_actor, Some(4));
        assert_eq!(config.normalizers, vec!["cast_order"]);

        let loaded = load_events(&events_path).unwrap();
        assert_eq!(loaded.events.len(), 1);
        assert_eq!(loaded.skipped, 0);
        assert_eq!(loaded.events[0].ability_id, Some(12));
    }

    #[test]
    fn test_malformed_records_are_skipped_and_counted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.json");
        fs::write(
            &path,
            r#"[
                {"timestamp": 0, "kind": "cast", "source_id": 1, "target_id": 1, "ability_id": 5},
                {"timestamp": 1, "kind": "damage", "target_id": 2, "amount": 10.0},
                {"timestamp": 2, "kind": "summon", "source_id": 1, "target_id": 3},
                {"timestamp": 3, "kind": "damage", "source_id": 1, "target_id": 2, "ability_id": 5, "amount": 40.0}
            ]"#,
        )
        .unwrap();

        let loaded = load_events(&path).unwrap();
        assert_eq!(loaded.skipped, 2);
        let timestamps: Vec<_> = loaded.events.iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![0, 3]);
    }

    #[test]
    fn test_errors_name_the_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        let err = load_config(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
        assert!(err.to_string().contains("missing.toml"));

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "tracked_actor = \"seven\"").unwrap();
        assert!(matches!(
            load_config(&bad).unwrap_err(),
            ConfigError::ParseToml { .. }
        ));

        let not_json = dir.path().join("bad.json");
        fs::write(&not_json, "[{\"timestamp\": 0").unwrap();
        assert!(matches!(
            load_events(&not_json).unwrap_err(),
            ConfigError::ParseEvents { .. }
        ));

        let not_array = dir.path().join("object.json");
        fs::write(&not_array, "{\"timestamp\": 0}").unwrap();
        assert!(matches!(
            load_events(&not_array).unwrap_err(),
            ConfigError::ParseEvents { .. }
        ));
    }
}

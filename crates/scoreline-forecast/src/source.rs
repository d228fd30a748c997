use std::fs;
use std::path::{Path, PathBuf};

use scoreline_core::{EventLog, EventLogSource, ModelError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read event log {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to decode event log {path:?}: {source}")]
    Decode {
        #[source]
        source: ModelError,
        path: PathBuf,
    },
}

/// Reads event logs from JSON files; locators are paths relative to `root`.
#[derive(Debug, Clone, Default)]
pub struct JsonFileSource {
    root: PathBuf,
}

impl JsonFileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, locator: &str) -> PathBuf {
        let path = Path::new(locator);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl EventLogSource for JsonFileSource {
    type Error = SourceError;

    fn fetch(&self, locator: &str) -> Result<EventLog, SourceError> {
        let path = self.resolve(locator);
        let json = fs::read_to_string(&path).map_err(|source| SourceError::Read {
            source,
            path: path.clone(),
        })?;
        EventLog::from_json(&json).map_err(|source| SourceError::Decode { source, path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoreline_core::ScoreKind;
    use tempfile::tempdir;

    #[test]
    fn fetches_relative_locators_from_root() {
        let dir = tempdir().expect("temp dir");
        fs::write(
            dir.path().join("harbor.json"),
            r#"{"games":[{"events":[{"remaining_minutes":41.0,"kind":"FG","team":"Harbor"}]}]}"#,
        )
        .expect("write log");

        let source = JsonFileSource::new(dir.path());
        let log = source.fetch("harbor.json").expect("fetch");
        assert_eq!(log.games.len(), 1);
        assert_eq!(log.games[0].events[0].kind, ScoreKind::FieldGoal);
    }

    #[test]
    fn reports_missing_and_malformed_files() {
        let dir = tempdir().expect("temp dir");
        let source = JsonFileSource::new(dir.path());
        assert!(matches!(
            source.fetch("missing.json"),
            Err(SourceError::Read { .. })
        ));

        fs::write(dir.path().join("broken.json"), "not json").expect("write");
        assert!(matches!(
            source.fetch("broken.json"),
            Err(SourceError::Decode { .. })
        ));
    }
}

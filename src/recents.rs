//! Recently chosen destinations, persisted as JSON.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RecentsConfig;
use crate::route::Location;

pub const DEFAULT_CAPACITY: usize = 10;

#[derive(Debug, Error)]
pub enum RecentsError {
    #[error("Failed to read recents '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse recents '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write recents '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Most-recent-first list of destinations, unique by coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentDestinations {
    entries: Vec<Location>,
    capacity: usize,
}

#[derive(Serialize, Deserialize)]
struct Stored {
    entries: Vec<Location>,
}

impl Default for RecentDestinations {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl RecentDestinations {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn entries(&self) -> &[Location] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Put `location` at the front.
    ///
    /// An entry at the same coordinate is replaced rather than duplicated;
    /// past capacity the oldest entry falls off.
    pub fn insert(&mut self, location: Location) {
        let coordinate = location.coordinate();
        self.entries.retain(|entry| entry.coordinate() != coordinate);
        self.entries.insert(0, location);
        self.entries.truncate(self.capacity);
    }

    /// Load from `path`. A missing file is an empty list.
    pub fn load(path: &Path, capacity: usize) -> Result<Self, RecentsError> {
        let mut recents = Self::with_capacity(capacity);
        if !path.exists() {
            return Ok(recents);
        }

        let content = fs::read_to_string(path).map_err(|e| RecentsError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let stored: Stored = serde_json::from_str(&content).map_err(|e| RecentsError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        // Re-insert oldest first so dedupe and capacity hold for hand-edited files
        for location in stored.entries.into_iter().rev() {
            recents.insert(location);
        }
        debug!("loaded {} recent destination(s)", recents.len());
        Ok(recents)
    }

    /// Load using the configured location and capacity.
    ///
    /// An unreadable or corrupt file is logged and treated as empty.
    pub fn load_configured(config: &RecentsConfig) -> Self {
        let path = config.resolved_path();
        Self::load(&path, config.capacity).unwrap_or_else(|e| {
            warn!("{e}; starting with no recent destinations");
            Self::with_capacity(config.capacity)
        })
    }

    /// Write to `path`, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), RecentsError> {
        let write_error = |e| RecentsError::Write {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        let stored = Stored {
            entries: self.entries.clone(),
        };
        let content = serde_json::to_string_pretty(&stored).map_err(|e| RecentsError::Write {
            path: path.to_path_buf(),
            source: io::Error::other(e),
        })?;
        fs::write(path, content).map_err(write_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::Coordinate;

    fn place(lat: f64, name: &str) -> Location {
        Location::NamedPlace {
            coordinate: Coordinate::new(lat, -122.42),
            name: name.into(),
        }
    }

    #[test]
    fn reinserting_moves_to_front() {
        let mut recents = RecentDestinations::default();
        recents.insert(place(37.1, "Bakery"));
        recents.insert(place(37.2, "Library"));
        recents.insert(place(37.1, "Bakery on 24th"));

        assert_eq!(recents.len(), 2);
        assert_eq!(recents.entries()[0], place(37.1, "Bakery on 24th"));
        assert_eq!(recents.entries()[1], place(37.2, "Library"));
    }

    #[test]
    fn eleventh_entry_evicts_oldest() {
        let mut recents = RecentDestinations::default();
        for i in 0..11 {
            recents.insert(place(37.0 + f64::from(i) * 0.01, &format!("Stop {i}")));
        }

        assert_eq!(recents.len(), 10);
        assert_eq!(recents.entries()[0].display_name(), "Stop 10");
        assert!(recents.entries().iter().all(|l| l.display_name() != "Stop 0"));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("recents.json");

        let mut recents = RecentDestinations::default();
        recents.insert(place(37.1, "Bakery"));
        recents.insert(place(37.2, "Library"));
        recents.save(&path).unwrap();

        let loaded = RecentDestinations::load(&path, DEFAULT_CAPACITY).unwrap();
        assert_eq!(loaded, recents);
    }

    #[test]
    fn load_applies_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recents.json");

        let mut recents = RecentDestinations::default();
        for i in 0..5 {
            recents.insert(place(37.0 + f64::from(i) * 0.01, &format!("Stop {i}")));
        }
        recents.save(&path).unwrap();

        let loaded = RecentDestinations::load(&path, 2).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.entries()[0].display_name(), "Stop 4");
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = RecentDestinations::load(&dir.path().join("none.json"), 10).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recents.json");
        fs::write(&path, "{ not json").unwrap();

        let err = RecentDestinations::load(&path, 10).unwrap_err();
        assert!(matches!(err, RecentsError::Parse { .. }));

        let config = RecentsConfig {
            capacity: 3,
            path: Some(path),
        };
        assert!(RecentDestinations::load_configured(&config).is_empty());
    }
}

//! Contains the settings of a cache.
//!
//! Settings are read from a YAML document, which has to contain an object named **cache**:
//!
//! ```yaml
//! cache:
//!     # Specifies the maximal number of entries to store
//!     capacity: 1024
//!     # Specifies the file used to persist the cache contents (optional)
//!     file: data/cache.json
//! ```
//!
//! A [SharedCache](crate::lru::SharedCache) can be created from these settings via
//! [SharedCache::from_settings](crate::lru::SharedCache::from_settings).
//!
//! # Examples
//! ```
//! # use lru_store::settings::Settings;
//! let settings = Settings::from_yaml("
//! cache:
//!     capacity: 1024
//!     file: data/cache.json
//! ").unwrap();
//!
//! assert_eq!(settings.capacity(), 1024);
//! assert_eq!(settings.file().unwrap().to_str(), Some("data/cache.json"));
//! ```
use std::path::{Path, PathBuf};

use anyhow::Context;
use yaml_rust::YamlLoader;

use crate::error::CacheError;

/// Describes the capacity and the persistence file of a cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    capacity: usize,
    file: Option<PathBuf>,
}

impl Settings {
    /// Creates settings for a cache with the given capacity which isn't persisted.
    pub fn new(capacity: usize) -> Self {
        Settings {
            capacity,
            file: None,
        }
    }

    /// Specifies the file used to persist the cache contents.
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Reads the settings from the given YAML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        log::info!("Loading settings from {}...", path.display());

        let data = std::fs::read_to_string(path)
            .map_err(|error| CacheError::io(path, error))
            .with_context(|| format!("Cannot load settings file {}.", path.display()))?;

        Settings::from_yaml(&data)
            .with_context(|| format!("Cannot parse settings file {}.", path.display()))
    }

    /// Parses the settings from the given YAML data.
    ///
    /// # Errors
    /// Fails if the data isn't valid YAML or if no positive **cache.capacity** is given.
    ///
    /// # Examples
    /// ```
    /// # use lru_store::settings::Settings;
    /// assert_eq!(Settings::from_yaml("cache:\n    capacity: 16").unwrap().capacity(), 16);
    ///
    /// assert_eq!(Settings::from_yaml("cache:\n    capacity: 0").is_err(), true);
    /// assert_eq!(Settings::from_yaml("cache: \"test").is_err(), true);
    /// ```
    pub fn from_yaml(data: &str) -> anyhow::Result<Self> {
        let docs = YamlLoader::load_from_str(data)
            .map_err(|error| CacheError::Settings(format!("Cannot parse YAML: {}", error)))?;

        let config = match docs.first() {
            Some(doc) => &doc["cache"],
            None => {
                return Err(
                    CacheError::Settings("The settings do not contain any data.".to_owned()).into(),
                )
            }
        };

        let capacity = match config["capacity"].as_i64().filter(|value| *value > 0) {
            Some(capacity) => capacity as usize,
            None => {
                log::error!("No valid 'cache.capacity' was given in the settings.");
                return Err(CacheError::Settings(
                    "'cache.capacity' has to be a positive number.".to_owned(),
                )
                .into());
            }
        };

        Ok(Settings {
            capacity,
            file: config["file"].as_str().map(PathBuf::from),
        })
    }

    /// Returns the maximal number of entries to store.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the file used to persist the cache contents if one was given.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

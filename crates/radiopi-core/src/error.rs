use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RadioError>;

#[derive(Debug, Error)]
pub enum RadioError {
    /// The station catalog produced no stations. The radio cannot run without one.
    #[error("station catalog is empty")]
    EmptyCatalog,

    #[error("failed to read station catalog {path:?}: {source}")]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse station catalog: {0}")]
    CatalogParse(#[from] serde_json::Error),

    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: String },

    #[error("failed to spawn `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("LED {name}: {source}")]
    Led {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{watcher}: watcher failed: {source}")]
    WatcherFailed {
        watcher: &'static str,
        #[source]
        source: Box<RadioError>,
    },

    #[error("{watcher}: watcher panicked")]
    WatcherPanicked { watcher: &'static str },

    /// A watcher did not observe `stopping` within the join timeout.
    #[error("{watcher}: Zombie (still running after {timeout:?})")]
    ZombieWatcher {
        watcher: &'static str,
        timeout: Duration,
    },

    #[error("failed to read config {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config {path:?}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to serialise config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

impl RadioError {
    /// True for the failures that mean a reactor left its cooperative shutdown contract.
    pub fn is_fatal_teardown(&self) -> bool {
        matches!(
            self,
            RadioError::ZombieWatcher { .. } | RadioError::WatcherPanicked { .. }
        )
    }
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::platform;
use crate::error::{RadioError, Result};
use crate::runner::DEFAULT_RADIO_CLI;
use crate::state::RadioOptions;
use crate::transition::TransitionTiming;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub radio: RadioConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub stations: StationsConfig,
    #[serde(default)]
    pub leds: LedConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioConfig {
    /// Start playing as soon as the watchers are up.
    #[serde(default = "default_true")]
    pub autoplay: bool,
    /// Whether next/prev move the index when only one station exists.
    #[serde(default = "default_true")]
    pub single_station_moves: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerKind {
    /// Subprocess when `radio_cli` is installed, mock otherwise.
    #[default]
    Auto,
    Mock,
    Subprocess,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub kind: RunnerKind,
    /// Path of the DABBoard `radio_cli` binary, resolved against `$PATH`.
    #[serde(default = "default_radio_cli_path")]
    pub radio_cli_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationsConfig {
    #[serde(default = "default_stations_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedKind {
    #[default]
    Mock,
    Sysfs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedConfig {
    #[serde(default)]
    pub kind: LedKind,
    /// sysfs LED device names under /sys/class/leds.
    #[serde(default = "default_play_led")]
    pub play: String,
    #[serde(default = "default_next_led")]
    pub next: String,
    #[serde(default = "default_prev_led")]
    pub prev: String,
    /// Overrides the per-kind fade duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_ms: Option<u64>,
    /// Overrides the per-kind fade step count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_steps: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_join_timeout_secs")]
    pub watcher_join_timeout_secs: u64,
    /// Run after an orderly power-off request.  Empty disables it.
    #[serde(default = "default_power_off_command")]
    pub power_off_command: Vec<String>,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            single_station_moves: true,
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            kind: RunnerKind::default(),
            radio_cli_path: default_radio_cli_path(),
        }
    }
}

impl Default for StationsConfig {
    fn default() -> Self {
        Self {
            path: default_stations_path(),
        }
    }
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            kind: LedKind::default(),
            play: default_play_led(),
            next: default_next_led(),
            prev: default_prev_led(),
            transition_ms: None,
            transition_steps: None,
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            watcher_join_timeout_secs: default_join_timeout_secs(),
            power_off_command: default_power_off_command(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_radio_cli_path() -> String {
    DEFAULT_RADIO_CLI.to_string()
}

fn default_stations_path() -> PathBuf {
    PathBuf::from("/etc/radiopi/stations.json")
}

fn default_play_led() -> String {
    "radiopi:play".to_string()
}

fn default_next_led() -> String {
    "radiopi:next".to_string()
}

fn default_prev_led() -> String {
    "radiopi:prev".to_string()
}

fn default_join_timeout_secs() -> u64 {
    15
}

fn default_power_off_command() -> Vec<String> {
    vec!["systemctl".to_string(), "poweroff".to_string()]
}

impl RadioConfig {
    pub fn options(&self) -> RadioOptions {
        RadioOptions {
            single_station_moves: self.single_station_moves,
        }
    }
}

impl LedConfig {
    /// Mock LEDs transition instantly; real ones fade over 300ms in 100 steps.
    pub fn timing(&self) -> TransitionTiming {
        let (ms, steps) = match self.kind {
            LedKind::Mock => (0, 1),
            LedKind::Sysfs => (300, 100),
        };
        TransitionTiming {
            duration: Duration::from_millis(self.transition_ms.unwrap_or(ms)),
            steps: self.transition_steps.unwrap_or(steps),
        }
    }
}

impl DaemonConfig {
    pub fn join_timeout(&self) -> Duration {
        Duration::from_secs(self.watcher_join_timeout_secs)
    }
}

impl Config {
    /// Load from `path`, writing the defaults there first if it does not exist.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|source| RadioError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        let write_err = |source| RadioError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(write_err)?;
        Ok(())
    }

    /// `$RADIOPI_CONFIG`, or `config.toml` in the platform config directory.
    pub fn config_path() -> PathBuf {
        std::env::var_os(platform::CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| platform::config_dir().join("config.toml"))
    }
}

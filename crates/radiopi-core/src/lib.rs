//! Core of the RadioPi appliance: the radio state, its broadcast to watcher
//! tasks, and the reactors that turn state transitions into tuner commands and
//! LED transitions.

pub mod config;
pub mod error;
pub mod led;
pub mod platform;
pub mod reactor;
pub mod runner;
pub mod state;
pub mod station;
pub mod transition;
pub mod watcher;

pub use error::{RadioError, Result};
pub use state::{Radio, State};
pub use station::Station;

//! Radio state and the single owner that publishes it.
//!
//! `State` is an immutable snapshot.  `Radio` holds the current snapshot and
//! fans every distinct new snapshot out to its subscribers (one unbounded
//! channel per watcher), so every watcher sees the same ordered sequence of
//! published states without ever blocking the mutator.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::{RadioError, Result};
use crate::station::Station;

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub playing: bool,
    /// Raw index.  Never clamped; resolved against the station count on read.
    pub station_index: i64,
    /// Shared by every snapshot of one radio.  Compared by content.
    pub stations: Arc<[Station]>,
    /// Sticky: once set, the radio accepts no further changes.
    pub stopping: bool,
}

impl State {
    pub fn new(stations: Arc<[Station]>) -> Self {
        Self {
            playing: false,
            station_index: 0,
            stations,
            stopping: false,
        }
    }

    /// The station the raw index currently resolves to.
    pub fn station(&self) -> &Station {
        let len = self.stations.len() as i64;
        &self.stations[self.station_index.rem_euclid(len) as usize]
    }
}

/// Options that change how the radio reacts to input.
#[derive(Debug, Clone, Copy)]
pub struct RadioOptions {
    /// When false and the catalog holds a single station, next/prev only
    /// start playback instead of moving the index.
    pub single_station_moves: bool,
}

impl Default for RadioOptions {
    fn default() -> Self {
        Self {
            single_station_moves: true,
        }
    }
}

struct Inner {
    state: State,
    subscribers: Vec<mpsc::UnboundedSender<State>>,
}

pub struct Radio {
    initial: State,
    options: RadioOptions,
    inner: Mutex<Inner>,
}

impl Radio {
    /// Create a paused radio tuned to the first station.
    pub fn new(stations: Vec<Station>) -> Result<Self> {
        Self::with_options(stations, RadioOptions::default())
    }

    pub fn with_options(stations: Vec<Station>, options: RadioOptions) -> Result<Self> {
        if stations.is_empty() {
            return Err(RadioError::EmptyCatalog);
        }
        let initial = State::new(stations.into());
        Ok(Self {
            initial: initial.clone(),
            options,
            inner: Mutex::new(Inner {
                state: initial,
                subscribers: Vec::new(),
            }),
        })
    }

    /// Current snapshot.
    pub fn state(&self) -> State {
        self.lock().state.clone()
    }

    /// Snapshot captured at construction.  Watchers diff their first
    /// observation against this.
    pub fn initial_state(&self) -> &State {
        &self.initial
    }

    /// Register a new observer.  Returns the state to diff against plus a
    /// receiver of every state published from now on.  If the radio already
    /// moved away from its initial state, the current state is queued first so
    /// that the observer still sees that transition.
    pub fn subscribe(&self) -> (State, mpsc::UnboundedReceiver<State>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        if inner.state != self.initial {
            let _ = tx.send(inner.state.clone());
        }
        inner.subscribers.push(tx);
        (self.initial.clone(), rx)
    }

    pub fn play(&self) {
        self.update("play", |state| State {
            playing: true,
            ..state.clone()
        });
    }

    pub fn pause(&self) {
        self.update("pause", |state| State {
            playing: false,
            ..state.clone()
        });
    }

    pub fn toggle_play(&self) {
        self.update("toggle_play", |state| State {
            playing: !state.playing,
            ..state.clone()
        });
    }

    pub fn next_station(&self) {
        self.step("next_station", 1);
    }

    pub fn prev_station(&self) {
        self.step("prev_station", -1);
    }

    /// Request shutdown.  Every watcher observes the stopping state exactly once
    /// and then exits.  Repeated calls are no-ops.
    pub fn stop(&self) {
        info!("Radio: stop requested");
        self.update("stop", |state| State {
            playing: false,
            stopping: true,
            ..state.clone()
        });
    }

    fn step(&self, op: &'static str, delta: i64) {
        let moves = self.options.single_station_moves || self.initial.stations.len() > 1;
        self.update(op, |state| State {
            playing: true,
            station_index: if moves {
                state.station_index + delta
            } else {
                state.station_index
            },
            ..state.clone()
        });
    }

    /// Compute a new state from the current one and publish it if it differs.
    /// Returns whether anything was published.
    fn update(&self, op: &'static str, f: impl FnOnce(&State) -> State) -> bool {
        let mut inner = self.lock();
        if inner.state.stopping {
            debug!("Radio: {} ignored, radio is stopping", op);
            return false;
        }
        let next = f(&inner.state);
        if next == inner.state {
            debug!("Radio: {} is a no-op", op);
            return false;
        }
        debug!(
            "Radio: {} -> playing={} station_index={} stopping={}",
            op, next.playing, next.station_index, next.stopping
        );
        inner
            .subscribers
            .retain(|tx| tx.send(next.clone()).is_ok());
        inner.state = next;
        true
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a panic elsewhere mid-publish; the stored
        // state is always a complete snapshot, so keep going with it.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

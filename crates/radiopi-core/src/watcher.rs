//! Background tasks that feed state transitions to reactors.
//!
//! ```text
//!   Radio::update  ──┬── mpsc ──> watcher "Radio" ──> RadioReactor ──> Runner
//!                    └── mpsc ──> watcher "LEDs"  ──> LedReactor   ──> LedBank
//! ```
//!
//! Each watcher keeps its own `prev` cursor, starting from the radio's initial
//! snapshot.  It exits after reacting to the first stopping state.  Owners must
//! `join` every watcher; one still running at the deadline is a zombie.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::error::{RadioError, Result};
use crate::reactor::Reactor;
use crate::state::{Radio, State};

pub struct Watcher {
    name: &'static str,
    handle: JoinHandle<Result<()>>,
}

impl Watcher {
    /// Subscribe `reactor` to `radio` and start reacting in a new task.
    pub fn spawn<R: Reactor>(radio: &Radio, mut reactor: R) -> Self {
        let name = reactor.name();
        info!("{}: Starting", name);
        let (prev, rx) = radio.subscribe();
        let handle = tokio::spawn(async move {
            let result = watch(&mut reactor, prev, rx).await;
            reactor.finish();
            result
        });
        info!("{}: Started", name);
        Self { name, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn join(self, timeout: Duration) -> Result<()> {
        self.join_until(Instant::now() + timeout, timeout).await
    }

    async fn join_until(mut self, deadline: Instant, timeout: Duration) -> Result<()> {
        info!("{}: Stopping", self.name);
        match tokio::time::timeout_at(deadline, &mut self.handle).await {
            Err(_) => {
                self.handle.abort();
                error!("{}: Zombie, still running after {:?}", self.name, timeout);
                Err(RadioError::ZombieWatcher {
                    watcher: self.name,
                    timeout,
                })
            }
            Ok(Err(e)) => {
                error!("{}: task panicked: {}", self.name, e);
                Err(RadioError::WatcherPanicked { watcher: self.name })
            }
            Ok(Ok(Err(e))) => Err(RadioError::WatcherFailed {
                watcher: self.name,
                source: Box::new(e),
            }),
            Ok(Ok(Ok(()))) => {
                info!("{}: Stopped", self.name);
                Ok(())
            }
        }
    }
}

/// Join every watcher against one shared deadline.  All watchers are joined
/// even after a failure; the first failure is returned.
pub async fn join_all(watchers: Vec<Watcher>, timeout: Duration) -> Result<()> {
    let deadline = Instant::now() + timeout;
    let mut first_err = None;
    for watcher in watchers {
        if let Err(e) = watcher.join_until(deadline, timeout).await {
            first_err.get_or_insert(e);
        }
    }
    first_err.map_or(Ok(()), Err)
}

async fn watch<R: Reactor>(
    reactor: &mut R,
    mut prev: State,
    mut rx: mpsc::UnboundedReceiver<State>,
) -> Result<()> {
    while let Some(state) = rx.recv().await {
        if let Err(e) = reactor.react(&prev, &state).await {
            error!("{}: reaction failed: {}", reactor.name(), e);
            return Err(e);
        }
        let stopping = state.stopping;
        prev = state;
        if stopping {
            return Ok(());
        }
    }
    warn!("{}: radio went away before stopping", reactor.name());
    Ok(())
}

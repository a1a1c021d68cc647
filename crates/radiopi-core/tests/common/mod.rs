#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use radiopi_core::led::{LedBank, LedController};
use radiopi_core::reactor::{LedReactor, RadioReactor};
use radiopi_core::runner::{RadioCli, Runner};
use radiopi_core::station::load_stations;
use radiopi_core::transition::TransitionTiming;
use radiopi_core::watcher::{join_all, Watcher};
use radiopi_core::{Radio, Result, Station};
use tokio::sync::mpsc;

pub const JOIN_TIMEOUT: Duration = Duration::from_secs(15);

pub fn workspace_root() -> PathBuf {
    let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    crate_dir
        .parent()
        .and_then(|p| p.parent())
        .unwrap_or(crate_dir.as_path())
        .to_path_buf()
}

pub fn stations() -> Vec<Station> {
    load_stations(&workspace_root().join("stations.json")).expect("failed to load stations.json")
}

/// Runner that queues every command for the test to inspect.
#[derive(Clone)]
pub struct QueueRunner {
    tx: mpsc::UnboundedSender<Vec<String>>,
}

pub struct RunnerQueue {
    rx: mpsc::UnboundedReceiver<Vec<String>>,
}

impl Runner for QueueRunner {
    async fn call(&self, args: &[String]) -> Result<()> {
        let _ = self.tx.send(args.to_vec());
        Ok(())
    }
}

impl RunnerQueue {
    /// Wait up to a second for the next command and compare it.
    pub async fn assert_called(&mut self, expected: Vec<String>) {
        let args = tokio::time::timeout(Duration::from_secs(1), self.rx.recv())
            .await
            .expect("timed out waiting for runner call")
            .expect("runner queue closed");
        assert_eq!(args, expected);
    }

    pub fn assert_idle(&mut self) {
        if let Ok(args) = self.rx.try_recv() {
            panic!("unexpected runner call: {:?}", args);
        }
    }
}

pub fn queue_runner() -> (QueueRunner, RunnerQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (QueueRunner { tx }, RunnerQueue { rx })
}

/// LED that records every value it is given.
#[derive(Clone, Default)]
pub struct RecordingLed {
    name: String,
    values: Arc<Mutex<Vec<f32>>>,
}

impl RecordingLed {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            values: Default::default(),
        }
    }

    pub fn take(&self) -> Vec<f32> {
        std::mem::take(&mut *self.values.lock().unwrap())
    }
}

impl LedController for RecordingLed {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_value(&mut self, value: f32) -> Result<()> {
        self.values.lock().unwrap().push(value);
        Ok(())
    }

    fn close(&mut self) {}
}

/// Radio wired to a queue runner and recording LEDs, as the daemon wires it.
pub struct Harness {
    pub radio: Radio,
    pub runner: RunnerQueue,
    pub play: RecordingLed,
    pub next: RecordingLed,
    pub prev: RecordingLed,
    watchers: Vec<Watcher>,
}

impl Harness {
    pub fn start() -> Self {
        let radio = Radio::new(stations()).unwrap();
        let (runner, queue) = queue_runner();
        let play = RecordingLed::new("Play");
        let next = RecordingLed::new("Next station");
        let prev = RecordingLed::new("Prev station");
        let leds = LedBank {
            play: play.clone(),
            next: next.clone(),
            prev: prev.clone(),
        };
        let watchers = vec![
            Watcher::spawn(&radio, RadioReactor::new(runner, RadioCli::default())),
            Watcher::spawn(&radio, LedReactor::new(leds, TransitionTiming::INSTANT)),
        ];
        Self {
            radio,
            runner: queue,
            play,
            next,
            prev,
            watchers,
        }
    }

    /// Start playing and consume the boot + tune that follows.
    pub async fn start_playing() -> Self {
        let mut harness = Self::start();
        harness.radio.play();
        let cli = RadioCli::default();
        let first = harness.radio.state().stations[0].clone();
        harness.runner.assert_called(cli.boot()).await;
        harness.runner.assert_called(cli.tune(&first)).await;
        harness
    }

    /// Stop the radio and join every watcher.
    pub async fn stop(&mut self) {
        self.radio.stop();
        let watchers = std::mem::take(&mut self.watchers);
        join_all(watchers, JOIN_TIMEOUT).await.unwrap();
    }

    pub fn take_leds(&self) -> [Vec<f32>; 3] {
        [self.play.take(), self.next.take(), self.prev.take()]
    }
}

//! Reactions to state transitions.
//!
//! A reactor looks at two consecutive snapshots and drives one collaborator:
//! the tuner (through a [`Runner`]) or the button LEDs.  Reactors never assume
//! that exactly one field changed between the two snapshots.

use std::future::Future;

use tracing::{error, info};

use crate::error::Result;
use crate::led::{Channel, LedBank, LedController};
use crate::runner::{RadioCli, Runner};
use crate::state::State;
use crate::transition::TransitionTiming;

pub trait Reactor: Send + 'static {
    /// Name used for the watcher task and in log lines.
    fn name(&self) -> &'static str;

    fn react(&mut self, prev: &State, curr: &State) -> impl Future<Output = Result<()>> + Send;

    /// Called once after the last reaction, whether or not it succeeded.
    fn finish(&mut self) {}
}

// ── tuner ─────────────────────────────────────────────────────────────────────

/// Boots, tunes and shuts down the DAB board.
pub struct RadioReactor<R> {
    runner: R,
    cli: RadioCli,
}

impl<R: Runner> RadioReactor<R> {
    pub fn new(runner: R, cli: RadioCli) -> Self {
        Self { runner, cli }
    }

    async fn run(&self, args: Vec<String>, curr: &State) -> Result<()> {
        let command = args.join(" ");
        info!("Runner: {}", command);
        self.runner.call(&args).await.inspect_err(|e| {
            error!(
                "Runner: `{}` failed (station {:?}): {}",
                command,
                curr.station(),
                e
            );
        })
    }
}

impl<R: Runner> Reactor for RadioReactor<R> {
    fn name(&self) -> &'static str {
        "Radio"
    }

    async fn react(&mut self, prev: &State, curr: &State) -> Result<()> {
        if curr.playing && !prev.playing {
            // A freshly booted board has nothing selected, so always tune.
            self.run(self.cli.boot(), curr).await?;
            self.run(self.cli.tune(curr.station()), curr).await?;
        } else if curr.playing && curr.station() != prev.station() {
            self.run(self.cli.tune(curr.station()), curr).await?;
        }
        if !curr.playing && prev.playing {
            self.run(self.cli.shutdown(), curr).await?;
        }
        Ok(())
    }
}

// ── LEDs ──────────────────────────────────────────────────────────────────────

const ON: f32 = 1.0;
const OFF: f32 = 0.0;

/// Fades the button LEDs with playback and pulses them on station changes.
pub struct LedReactor<L> {
    leds: LedBank<L>,
    timing: TransitionTiming,
}

impl<L: LedController> LedReactor<L> {
    pub fn new(leds: LedBank<L>, timing: TransitionTiming) -> Self {
        Self { leds, timing }
    }

    /// Push `values` to every channel in lockstep, one step delay per value.
    async fn transition(&mut self, values: Vec<f32>, channels: &[Channel]) -> Result<()> {
        let delay = self.timing.step_delay();
        let last = values.len().saturating_sub(1);
        for (n, value) in values.into_iter().enumerate() {
            for &channel in channels {
                self.leds.get_mut(channel).set_value(value)?;
            }
            if n < last && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        Ok(())
    }
}

impl<L: LedController> Reactor for LedReactor<L> {
    fn name(&self) -> &'static str {
        "LEDs"
    }

    async fn react(&mut self, prev: &State, curr: &State) -> Result<()> {
        use Channel::{Next, Play, Prev};

        if curr.playing && !prev.playing {
            let values = self.timing.fade(OFF, ON);
            self.transition(values, &Channel::ALL).await?;
        } else if curr.playing && curr.station_index == prev.station_index + 1 {
            let values = self.timing.pulse(ON, OFF);
            self.transition(values, &[Play, Next]).await?;
        } else if curr.playing && curr.station_index == prev.station_index - 1 {
            let values = self.timing.pulse(ON, OFF);
            self.transition(values, &[Play, Prev]).await?;
        } else if curr.playing && curr.station() != prev.station() {
            let values = self.timing.pulse(ON, OFF);
            self.transition(values, &Channel::ALL).await?;
        } else if !curr.playing && prev.playing {
            let values = self.timing.fade(ON, OFF);
            self.transition(values, &Channel::ALL).await?;
        }
        Ok(())
    }

    fn finish(&mut self) {
        self.leds.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::error::RadioError;
    use crate::station::Station;
    use crate::transition::assert_values_approx;

    fn state(playing: bool, station_index: i64, stations: &Arc<[Station]>) -> State {
        State {
            playing,
            station_index,
            stations: stations.clone(),
            stopping: false,
        }
    }

    fn stations(n: u32) -> Arc<[Station]> {
        (0..n)
            .map(|i| Station {
                frequency_index: i,
                service_id: 1000 + i,
                component_id: i,
                label: format!("S{}", i),
            })
            .collect::<Vec<_>>()
            .into()
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Vec<String>>>>);

    impl Recorder {
        fn take(&self) -> Vec<Vec<String>> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    impl Runner for Recorder {
        async fn call(&self, args: &[String]) -> Result<()> {
            self.0.lock().unwrap().push(args.to_vec());
            Ok(())
        }
    }

    struct Failing;

    impl Runner for Failing {
        async fn call(&self, args: &[String]) -> Result<()> {
            Err(RadioError::CommandFailed {
                command: args.join(" "),
                status: "exit status: 1".to_string(),
            })
        }
    }

    #[derive(Clone)]
    struct RecordingLed {
        name: &'static str,
        values: Arc<Mutex<Vec<f32>>>,
        closed: Arc<Mutex<u32>>,
    }

    impl RecordingLed {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                values: Default::default(),
                closed: Default::default(),
            }
        }

        fn take(&self) -> Vec<f32> {
            std::mem::take(&mut *self.values.lock().unwrap())
        }
    }

    impl LedController for RecordingLed {
        fn name(&self) -> &str {
            self.name
        }

        fn set_value(&mut self, value: f32) -> Result<()> {
            self.values.lock().unwrap().push(value);
            Ok(())
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() += 1;
        }
    }

    fn led_reactor(steps: u32) -> (LedReactor<RecordingLed>, [RecordingLed; 3]) {
        let leds = [
            RecordingLed::new("Play"),
            RecordingLed::new("Next station"),
            RecordingLed::new("Prev station"),
        ];
        let bank = LedBank {
            play: leds[0].clone(),
            next: leds[1].clone(),
            prev: leds[2].clone(),
        };
        let timing = TransitionTiming {
            duration: std::time::Duration::ZERO,
            steps,
        };
        (LedReactor::new(bank, timing), leds)
    }

    fn take_all(leds: &[RecordingLed; 3]) -> [Vec<f32>; 3] {
        [leds[0].take(), leds[1].take(), leds[2].take()]
    }

    #[tokio::test]
    async fn test_radio_boot_then_tune() {
        let s = stations(3);
        let runner = Recorder::default();
        let mut reactor = RadioReactor::new(runner.clone(), RadioCli::default());
        reactor
            .react(&state(false, 2, &s), &state(true, 2, &s))
            .await
            .unwrap();
        let cli = RadioCli::default();
        assert_eq!(runner.take(), vec![cli.boot(), cli.tune(&s[2])]);
    }

    #[tokio::test]
    async fn test_radio_boot_on_resume_at_new_station() {
        let s = stations(3);
        let runner = Recorder::default();
        let mut reactor = RadioReactor::new(runner.clone(), RadioCli::default());
        reactor
            .react(&state(false, 0, &s), &state(true, 1, &s))
            .await
            .unwrap();
        let cli = RadioCli::default();
        assert_eq!(runner.take(), vec![cli.boot(), cli.tune(&s[1])]);
    }

    #[tokio::test]
    async fn test_radio_retune_only_when_station_changes() {
        let s = stations(3);
        let runner = Recorder::default();
        let mut reactor = RadioReactor::new(runner.clone(), RadioCli::default());
        let cli = RadioCli::default();

        reactor
            .react(&state(true, 0, &s), &state(true, 1, &s))
            .await
            .unwrap();
        assert_eq!(runner.take(), vec![cli.tune(&s[1])]);

        // Three steps on a three-station list lands on the same station.
        reactor
            .react(&state(true, 1, &s), &state(true, 4, &s))
            .await
            .unwrap();
        assert!(runner.take().is_empty());
    }

    #[tokio::test]
    async fn test_radio_single_station_index_move_is_silent() {
        let s = stations(1);
        let runner = Recorder::default();
        let mut reactor = RadioReactor::new(runner.clone(), RadioCli::default());
        reactor
            .react(&state(true, 0, &s), &state(true, 1, &s))
            .await
            .unwrap();
        assert!(runner.take().is_empty());
    }

    #[tokio::test]
    async fn test_radio_pause_and_stop_only() {
        let s = stations(3);
        let runner = Recorder::default();
        let mut reactor = RadioReactor::new(runner.clone(), RadioCli::default());

        let mut stopped = state(false, 0, &s);
        stopped.stopping = true;
        reactor.react(&state(true, 0, &s), &stopped).await.unwrap();
        assert_eq!(runner.take(), vec![RadioCli::default().shutdown()]);

        reactor.react(&state(false, 0, &s), &stopped).await.unwrap();
        assert!(runner.take().is_empty());
    }

    #[tokio::test]
    async fn test_radio_runner_failure_propagates() {
        let s = stations(2);
        let mut reactor = RadioReactor::new(Failing, RadioCli::default());
        let err = reactor
            .react(&state(false, 0, &s), &state(true, 0, &s))
            .await
            .unwrap_err();
        assert!(matches!(err, RadioError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn test_leds_fade_in_all() {
        let s = stations(3);
        let (mut reactor, leds) = led_reactor(4);
        reactor
            .react(&state(false, 0, &s), &state(true, 0, &s))
            .await
            .unwrap();
        for values in take_all(&leds) {
            assert_values_approx(&values, &[0.0, 0.25, 0.5, 0.75, 1.0]);
        }
    }

    #[tokio::test]
    async fn test_leds_fade_out_all() {
        let s = stations(3);
        let (mut reactor, leds) = led_reactor(4);
        reactor
            .react(&state(true, 1, &s), &state(false, 1, &s))
            .await
            .unwrap();
        for values in take_all(&leds) {
            assert_values_approx(&values, &[1.0, 0.75, 0.5, 0.25, 0.0]);
        }
    }

    #[tokio::test]
    async fn test_leds_next_pulses_play_and_next() {
        let s = stations(3);
        let (mut reactor, leds) = led_reactor(4);
        reactor
            .react(&state(true, 0, &s), &state(true, 1, &s))
            .await
            .unwrap();
        let [play, next, prev] = take_all(&leds);
        assert_values_approx(&play, &[1.0, 0.5, 0.0, 0.0, 0.5, 1.0]);
        assert_eq!(play, next);
        assert!(prev.is_empty());
    }

    #[tokio::test]
    async fn test_leds_prev_pulses_play_and_prev() {
        let s = stations(3);
        let (mut reactor, leds) = led_reactor(2);
        reactor
            .react(&state(true, 0, &s), &state(true, -1, &s))
            .await
            .unwrap();
        let [play, next, prev] = take_all(&leds);
        assert_values_approx(&play, &[1.0, 0.0, 0.0, 1.0]);
        assert!(next.is_empty());
        assert_eq!(play, prev);
    }

    #[tokio::test]
    async fn test_leds_jump_pulses_all() {
        let s = stations(5);
        let (mut reactor, leds) = led_reactor(2);
        reactor
            .react(&state(true, 0, &s), &state(true, 3, &s))
            .await
            .unwrap();
        let [play, next, prev] = take_all(&leds);
        assert_eq!(play.len(), 4);
        assert_eq!(play, next);
        assert_eq!(play, prev);
    }

    #[tokio::test]
    async fn test_leds_single_station_step_still_pulses() {
        let s = stations(1);
        let (mut reactor, leds) = led_reactor(2);
        reactor
            .react(&state(true, 0, &s), &state(true, 1, &s))
            .await
            .unwrap();
        let [play, next, prev] = take_all(&leds);
        assert_eq!(play.len(), 4);
        assert_eq!(play, next);
        assert!(prev.is_empty());
    }

    #[tokio::test]
    async fn test_leds_quiet_on_stop_while_paused() {
        let s = stations(3);
        let (mut reactor, leds) = led_reactor(2);
        let mut stopped = state(false, 0, &s);
        stopped.stopping = true;
        reactor.react(&state(false, 0, &s), &stopped).await.unwrap();
        assert!(take_all(&leds).iter().all(Vec::is_empty));
    }

    #[tokio::test]
    async fn test_leds_finish_closes_every_channel() {
        let (mut reactor, leds) = led_reactor(1);
        reactor.finish();
        for led in &leds {
            assert_eq!(*led.closed.lock().unwrap(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_leds_sleep_once_per_step_across_channels() {
        let s = stations(3);
        let leds = LedBank {
            play: RecordingLed::new("Play"),
            next: RecordingLed::new("Next station"),
            prev: RecordingLed::new("Prev station"),
        };
        let timing = TransitionTiming {
            duration: std::time::Duration::from_millis(400),
            steps: 4,
        };
        let mut reactor = LedReactor::new(leds, timing);
        let start = tokio::time::Instant::now();
        reactor
            .react(&state(false, 0, &s), &state(true, 0, &s))
            .await
            .unwrap();
        // Four gaps of 100ms between five values, shared by all three LEDs.
        let elapsed = start.elapsed();
        assert!(elapsed >= std::time::Duration::from_millis(400), "{:?}", elapsed);
        assert!(elapsed < std::time::Duration::from_millis(500), "{:?}", elapsed);
    }
}

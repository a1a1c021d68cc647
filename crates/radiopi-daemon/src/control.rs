//! Control surface adapter.
//!
//! The front panel buttons map onto a handful of radio operations.  Without
//! button hardware the daemon takes the same events from stdin, one per line.

use std::io::BufRead;
use std::str::FromStr;

use radiopi_core::Radio;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Short press on the play button.
    TogglePlay,
    /// Press, or hold-repeat, on the next button.
    NextStation,
    /// Press, or hold-repeat, on the prev button.
    PrevStation,
    Play,
    Pause,
    /// Long hold on the power button.
    PowerOff,
    Quit,
}

impl FromStr for ControlEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "t" | "toggle" => Ok(ControlEvent::TogglePlay),
            "n" | "next" => Ok(ControlEvent::NextStation),
            "p" | "prev" => Ok(ControlEvent::PrevStation),
            "play" => Ok(ControlEvent::Play),
            "pause" => Ok(ControlEvent::Pause),
            "off" | "power-off" => Ok(ControlEvent::PowerOff),
            "q" | "quit" => Ok(ControlEvent::Quit),
            other => Err(format!("unknown control event {:?}", other)),
        }
    }
}

/// Why the control loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Quit,
    PowerOff,
}

impl ControlEvent {
    /// Apply the event.  Returns `Some` when the event ends the session.
    pub fn apply(self, radio: &Radio) -> Option<Exit> {
        match self {
            ControlEvent::TogglePlay => radio.toggle_play(),
            ControlEvent::NextStation => radio.next_station(),
            ControlEvent::PrevStation => radio.prev_station(),
            ControlEvent::Play => radio.play(),
            ControlEvent::Pause => radio.pause(),
            ControlEvent::PowerOff => return Some(Exit::PowerOff),
            ControlEvent::Quit => return Some(Exit::Quit),
        }
        None
    }
}

/// Read stdin lines on a dedicated thread.  A blocking stdin read must not
/// live on the runtime, or the process cannot exit until the next newline.
pub fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Control: read error: {}", e);
                    break;
                }
            }
        }
        debug!("Control: stdin reader exiting");
    });
    rx
}

/// Feed events from `lines` into `radio` until a quit or power-off event.
/// Closed input ends only the reading: under a service manager stdin is
/// `/dev/null`, and the radio keeps playing until a signal arrives.
pub async fn run(radio: &Radio, mut lines: mpsc::UnboundedReceiver<String>) -> Exit {
    while let Some(line) = lines.recv().await {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<ControlEvent>() {
            Ok(event) => {
                info!("Control: {:?}", event);
                if let Some(exit) = event.apply(radio) {
                    return exit;
                }
            }
            Err(e) => warn!("Control: {}", e),
        }
    }
    info!("Control: input closed, waiting for a signal");
    std::future::pending().await
}

//! LED channels.
//!
//! Each front-panel button has a backlight LED whose brightness is set as a
//! value in `0.0..=1.0`.

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{LedConfig, LedKind};
use crate::error::{RadioError, Result};

pub trait LedController: Send + 'static {
    fn name(&self) -> &str;

    fn set_value(&mut self, value: f32) -> Result<()>;

    /// Release the LED.  Safe to call more than once.
    fn close(&mut self);
}

/// Logs values and drives nothing.
#[derive(Debug)]
pub struct MockLed {
    name: String,
}

impl MockLed {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl LedController for MockLed {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_value(&mut self, value: f32) -> Result<()> {
        debug!("LED: {}: Value: {}", self.name, value);
        Ok(())
    }

    fn close(&mut self) {}
}

/// An LED under `/sys/class/leds`, driven through its `brightness` file.
#[derive(Debug)]
pub struct SysfsLed {
    name: String,
    brightness: Option<File>,
    max_brightness: u32,
}

pub const SYSFS_LEDS_DIR: &str = "/sys/class/leds";

impl SysfsLed {
    pub fn open(name: impl Into<String>, device: &str) -> Result<Self> {
        Self::open_in(name, &Path::new(SYSFS_LEDS_DIR).join(device))
    }

    /// Open the LED whose sysfs directory is `dir`.
    pub fn open_in(name: impl Into<String>, dir: &Path) -> Result<Self> {
        let name = name.into();
        let io_err = |name: &str, source| RadioError::Led {
            name: name.to_string(),
            source,
        };

        let max = std::fs::read_to_string(dir.join("max_brightness"))
            .map_err(|e| io_err(&name, e))?;
        let max_brightness = max.trim().parse::<u32>().map_err(|e| {
            io_err(
                &name,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;
        let brightness = std::fs::OpenOptions::new()
            .write(true)
            .open(brightness_path(dir))
            .map_err(|e| io_err(&name, e))?;

        debug!("LED: {}: opened {:?} (max {})", name, dir, max_brightness);
        Ok(Self {
            name,
            brightness: Some(brightness),
            max_brightness,
        })
    }

    fn level(&self, value: f32) -> u32 {
        (value.clamp(0.0, 1.0) * self.max_brightness as f32).round() as u32
    }
}

fn brightness_path(dir: &Path) -> PathBuf {
    dir.join("brightness")
}

impl LedController for SysfsLed {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_value(&mut self, value: f32) -> Result<()> {
        debug!("LED: {}: Value: {}", self.name, value);
        let level = self.level(value);
        let Some(file) = self.brightness.as_mut() else {
            return Ok(());
        };
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.write_all(format!("{}\n", level).as_bytes()))
            .map_err(|source| RadioError::Led {
                name: self.name.clone(),
                source,
            })
    }

    fn close(&mut self) {
        if let Some(mut file) = self.brightness.take() {
            let _ = file
                .seek(SeekFrom::Start(0))
                .and_then(|_| file.write_all(b"0\n"));
            debug!("LED: {}: closed", self.name);
        }
    }
}

impl Drop for SysfsLed {
    fn drop(&mut self) {
        self.close();
    }
}

/// The LED selected by configuration.
#[derive(Debug)]
pub enum Led {
    Mock(MockLed),
    Sysfs(SysfsLed),
}

impl LedController for Led {
    fn name(&self) -> &str {
        match self {
            Led::Mock(l) => l.name(),
            Led::Sysfs(l) => l.name(),
        }
    }

    fn set_value(&mut self, value: f32) -> Result<()> {
        match self {
            Led::Mock(l) => l.set_value(value),
            Led::Sysfs(l) => l.set_value(value),
        }
    }

    fn close(&mut self) {
        match self {
            Led::Mock(l) => l.close(),
            Led::Sysfs(l) => l.close(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Play,
    Next,
    Prev,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Play, Channel::Next, Channel::Prev];

    pub fn label(&self) -> &'static str {
        match self {
            Channel::Play => "Play",
            Channel::Next => "Next station",
            Channel::Prev => "Prev station",
        }
    }
}

/// The three button LEDs.
#[derive(Debug)]
pub struct LedBank<L> {
    pub play: L,
    pub next: L,
    pub prev: L,
}

impl<L: LedController> LedBank<L> {
    pub fn get_mut(&mut self, channel: Channel) -> &mut L {
        match channel {
            Channel::Play => &mut self.play,
            Channel::Next => &mut self.next,
            Channel::Prev => &mut self.prev,
        }
    }

    pub fn close(&mut self) {
        for channel in Channel::ALL {
            self.get_mut(channel).close();
        }
    }
}

impl LedBank<Led> {
    pub fn from_config(config: &LedConfig) -> Result<Self> {
        let open = |channel: Channel, device: &str| -> Result<Led> {
            Ok(match config.kind {
                LedKind::Mock => Led::Mock(MockLed::new(channel.label())),
                LedKind::Sysfs => Led::Sysfs(SysfsLed::open(channel.label(), device)?),
            })
        };
        Ok(Self {
            play: open(Channel::Play, &config.play)?,
            next: open(Channel::Next, &config.next)?,
            prev: open(Channel::Prev, &config.prev)?,
        })
    }
}

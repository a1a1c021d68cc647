mod control;
mod shutdown;

use std::path::PathBuf;

use radiopi_core::config::Config;
use radiopi_core::led::LedBank;
use radiopi_core::reactor::{LedReactor, RadioReactor};
use radiopi_core::runner::{CommandRunner, RadioCli, Runner};
use radiopi_core::station::load_stations;
use radiopi_core::watcher::{join_all, Watcher};
use radiopi_core::{platform, Radio};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::control::Exit;

fn init_logging() -> anyhow::Result<PathBuf> {
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("radiopi.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // File for later inspection, stderr for the journal.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_ansi(false);
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,radiopi_core=debug,radiopi=debug")
            }),
        )
        .init();

    Ok(log_path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_path = init_logging()?;
    eprintln!("radiopi log: {}", log_path.display());
    info!("All we hear is RadioPi...");

    let config = Config::load()?;
    info!("Config loaded from: {:?}", Config::config_path());

    // An empty or unreadable catalog is fatal: the radio never runs without stations.
    let stations = load_stations(&config.stations.path)?;
    let radio = Radio::with_options(stations, config.radio.options())?;

    let runner = CommandRunner::discover(config.runner.kind, &config.runner.radio_cli_path);
    let cli = RadioCli::new(config.runner.radio_cli_path.clone());
    let leds = LedBank::from_config(&config.leds)?;

    let watchers = vec![
        Watcher::spawn(&radio, RadioReactor::new(runner, cli)),
        Watcher::spawn(&radio, LedReactor::new(leds, config.leds.timing())),
    ];

    if config.radio.autoplay {
        radio.play();
    }

    info!("RadioPi running, reading control events from stdin");
    let exit = tokio::select! {
        exit = control::run(&radio, control::stdin_lines()) => exit,
        _ = shutdown::signal() => Exit::Quit,
    };

    radio.stop();
    if let Err(e) = join_all(watchers, config.daemon.join_timeout()).await {
        if e.is_fatal_teardown() {
            error!("Watcher did not shut down: {}", e);
        } else {
            error!("Watcher failed, radio state unknown: {}", e);
        }
        return Err(e.into());
    }

    if exit == Exit::PowerOff && !config.daemon.power_off_command.is_empty() {
        info!("Powering off: {}", config.daemon.power_off_command.join(" "));
        CommandRunner::for_power_off(config.runner.kind)
            .call(&config.daemon.power_off_command)
            .await?;
    }

    info!("RadioPi stopped");
    Ok(())
}

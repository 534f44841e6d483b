// blinkd - lässt die in einer JSON-Datei beschriebenen GPIO-LEDs blinken
// und nimmt über stdin neue Ein-/Ausschaltdauern entgegen

use std::io::{self, BufReader};
use std::sync::mpsc;

use anyhow::Context;
use log::{debug, info};

use blink_daemon::config::{DaemonConfig, load_led_configs};
use blink_daemon::console::{Shutdown, spawn_console};
use blink_daemon::{AttributeClass, LedDevice};

/// Main Entry Point
///
/// Lädt Konfiguration und LED-Beschreibungen, fährt das Gerät hoch und
/// bedient die Konsole. Bei EOF, `quit`, SIGINT oder SIGTERM wird das Gerät
/// sauber entfernt.
fn main() -> anyhow::Result<()> {
    // .env ist optional, Fehler erst nach Logger-Init melden
    let dotenv = dotenvy::dotenv();
    let config = DaemonConfig::from_env()?;
    config.logger().try_init().context("cannot install logger")?;
    match dotenv {
        Ok(path) => info!("environment loaded from {}", path.display()),
        Err(e) => debug!(".env not loaded: {e}"),
    }

    let leds = load_led_configs(&config.config_path)?;
    info!(
        "{} LED(s) described in {}",
        leds.len(),
        config.config_path.display()
    );

    // Eigener Attribut-Kontext für diese Geräte-Instanz
    let class = AttributeClass::new(&config.class_name);
    let device = LedDevice::probe(leds.iter().map(|led| led.descriptor()), class.clone())
        .context("cannot bring up LED device")?;
    info!("{} ready, labels: {:?}", class.name(), device.table().labels());

    let (events, shutdown) = mpsc::channel();
    let signal = events.clone();
    ctrlc::set_handler(move || {
        signal.send(Shutdown::Signal).ok();
    })
    .context("cannot install signal handler")?;
    spawn_console(BufReader::new(io::stdin()), io::stdout(), class, events)
        .context("cannot start console")?;

    // Der Signal-Handler hält einen Sender, recv() endet also nur mit einem Grund
    let reason = shutdown.recv().context("shutdown channel closed")?;
    info!("shutting down: {reason:?}");

    device.remove();

    if let Shutdown::ConsoleClosed(Err(e)) = reason {
        return Err(e).context("console failed");
    }
    Ok(())
}

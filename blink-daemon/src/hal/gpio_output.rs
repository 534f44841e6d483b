// GPIO-Ausgang über das Linux sysfs GPIO-Interface (sysfs_gpio)
//
// Belegen:   export (falls noch nicht exportiert), direction = out, active_low
// Pegel:     value = 1 | 0 (active_low invertiert im Kernel)
// Freigeben: unexport, nur wenn selbst exportiert

use std::io;

use blink_core::{GpioOutput, Level, OutputError, OutputSource};
use log::{debug, warn};
use sysfs_gpio::{Direction, Pin};

/// Noch nicht belegter sysfs GPIO-Pin
#[derive(Debug, Clone)]
pub struct SysfsPin {
    pin: Pin,
    active_low: bool,
}

impl SysfsPin {
    pub fn new(number: u32) -> Self {
        Self {
            pin: Pin::new(u64::from(number)),
            active_low: false,
        }
    }

    /// Pin schaltet die LED mit Low-Pegel ein
    pub fn active_low(mut self, active_low: bool) -> Self {
        self.active_low = active_low;
        self
    }

    pub fn number(&self) -> u64 {
        self.pin.get_pin_num()
    }

    pub fn is_active_low(&self) -> bool {
        self.active_low
    }
}

impl OutputSource for SysfsPin {
    type Output = SysfsOutput;

    fn acquire(self) -> Result<SysfsOutput, OutputError> {
        let exported = !self.pin.is_exported();
        if exported {
            self.pin
                .export()
                .map_err(|e| output_error(self.number(), "cannot export", e))?;
            debug!("gpio{} exported", self.number());
        }

        let active_low = self.active_low;
        let output = SysfsOutput {
            pin: self.pin,
            exported,
        };
        // Bei Fehlschlag gibt Drop den Pin wieder frei
        output.configure(active_low)?;
        Ok(output)
    }
}

/// Übersetzt einen sysfs_gpio-Fehler beim Belegen
///
/// `EBUSY` heißt: ein anderer Treiber hält den Pin.
pub fn output_error(number: u64, what: &str, e: sysfs_gpio::Error) -> OutputError {
    match e {
        sysfs_gpio::Error::Io(ref err) if err.kind() == io::ErrorKind::ResourceBusy => {
            OutputError::Busy
        }
        e => OutputError::Unavailable(format!("gpio{number}: {what}: {e}")),
    }
}

/// Belegter sysfs GPIO-Ausgang
///
/// Schreibfehler werden nur geloggt: einmal belegt gilt der Ausgang als
/// immer verfügbar.
#[derive(Debug)]
pub struct SysfsOutput {
    pin: Pin,
    exported: bool,
}

impl SysfsOutput {
    pub fn number(&self) -> u64 {
        self.pin.get_pin_num()
    }

    fn configure(&self, active_low: bool) -> Result<(), OutputError> {
        self.pin
            .set_direction(Direction::Out)
            .map_err(|e| output_error(self.number(), "cannot set direction", e))?;
        self.pin
            .set_active_low(active_low)
            .map_err(|e| output_error(self.number(), "cannot set active_low", e))
    }
}

impl GpioOutput for SysfsOutput {
    fn set_level(&mut self, level: Level) {
        if let Err(e) = self.pin.set_value(u8::from(level == Level::High)) {
            warn!("gpio{}: cannot write value: {e}", self.number());
        }
    }
}

impl Drop for SysfsOutput {
    fn drop(&mut self) {
        if !self.exported {
            return;
        }
        match self.pin.unexport() {
            Ok(()) => debug!("gpio{} unexported", self.number()),
            Err(e) => warn!("gpio{}: cannot unexport: {e}", self.number()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

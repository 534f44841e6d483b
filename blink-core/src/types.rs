//! Core Types für die LED-Blinksteuerung
//!
//! Datenstrukturen ohne Hardware-Dependencies

use core::fmt;

/// Ausgangspegel eines GPIO-Pins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// Aktuelle Phase einer blinkenden LED
///
/// Jede Timer-Auslösung wechselt bedingungslos `On -> Off` bzw. `Off -> On`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    On,
    Off,
}

impl Phase {
    /// Liefert die jeweils andere Phase
    pub fn toggled(self) -> Self {
        match self {
            Phase::On => Phase::Off,
            Phase::Off => Phase::On,
        }
    }

    /// Pegel, mit dem der Ausgang in dieser Phase getrieben wird
    pub fn level(self) -> Level {
        match self {
            Phase::On => Level::High,
            Phase::Off => Level::Low,
        }
    }
}

/// Ein- und Ausschaltdauer einer LED in Millisekunden
///
/// Der Wert 0 bedeutet "nicht weiterschalten": die LED bleibt auf dem
/// zuletzt getriebenen Pegel stehen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Durations {
    pub on_ms: u32,
    pub off_ms: u32,
}

impl Durations {
    pub const fn new(on_ms: u32, off_ms: u32) -> Self {
        Self { on_ms, off_ms }
    }

    /// Intervall (ms), das für die gegebene Phase gilt
    pub fn interval(self, phase: Phase) -> u32 {
        match phase {
            Phase::On => self.on_ms,
            Phase::Off => self.off_ms,
        }
    }

    /// Packt beide Werte in ein `u64` (on in den oberen 32 Bit)
    pub(crate) fn pack(self) -> u64 {
        (u64::from(self.on_ms) << 32) | u64::from(self.off_ms)
    }

    pub(crate) fn unpack(bits: u64) -> Self {
        Self {
            on_ms: (bits >> 32) as u32,
            off_ms: bits as u32,
        }
    }
}

impl fmt::Display for Durations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.on_ms, self.off_ms)
    }
}

/// Beschreibung einer LED, wie sie ein externer Parser liefert
///
/// `output` ist die noch nicht belegte Ausgangs-Capability, bereits an einen
/// konkreten Pin gebunden. Sie wird erst beim Aufbau der `LedTable` belegt.
#[derive(Debug, Clone)]
pub struct LedDescriptor<S> {
    pub label: String,
    pub on_time_ms: u32,
    pub off_time_ms: u32,
    pub output: S,
}

impl<S> LedDescriptor<S> {
    /// Descriptor ohne Zeiten: die LED bleibt nach dem Start dauerhaft an
    pub fn new(label: impl Into<String>, output: S) -> Self {
        Self {
            label: label.into(),
            on_time_ms: 0,
            off_time_ms: 0,
            output,
        }
    }

    pub fn with_times(mut self, on_time_ms: u32, off_time_ms: u32) -> Self {
        self.on_time_ms = on_time_ms;
        self.off_time_ms = off_time_ms;
        self
    }

    pub fn durations(&self) -> Durations {
        Durations::new(self.on_time_ms, self.off_time_ms)
    }
}

/// Zugriffsrechte für ein Control-Attribut (`rw-rw----`)
pub const CONTROL_MODE: u32 = 0o660;

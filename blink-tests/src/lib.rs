//! Mocks für die Host-Tests der Blinksteuerung
//!
//! `MockBoard` simuliert eine Platine mit beliebig vielen Pins und zählt,
//! wie viele Ausgänge belegt und wieder freigegeben wurden.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Instant;

use blink_core::{
    AttributeClass, AttributeOps, AttributeRegistrar, GpioOutput, LedDescriptor, Level,
    OutputError, OutputSource, RegistrationError,
};

// ============================================================================
// Mock Board / Mock Output
// ============================================================================

/// Ein aufgezeichneter Pegelwechsel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelEvent {
    pub pin: u32,
    pub level: Level,
    pub at: Instant,
}

#[derive(Default)]
struct BoardState {
    acquired: usize,
    released: usize,
    released_by_timer: usize,
    events: Vec<LevelEvent>,
}

#[derive(Clone, Default)]
pub struct MockBoard {
    state: Arc<Mutex<BoardState>>,
}

impl MockBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap()
    }

    /// Pin, der sich belegen lässt
    pub fn pin(&self, pin: u32) -> MockSource {
        MockSource {
            pin,
            board: self.clone(),
            broken: false,
        }
    }

    /// Pin, dessen Belegung fehlschlägt
    pub fn broken_pin(&self, pin: u32) -> MockSource {
        MockSource {
            pin,
            board: self.clone(),
            broken: true,
        }
    }

    pub fn acquired(&self) -> usize {
        self.lock().acquired
    }

    pub fn released(&self) -> usize {
        self.lock().released
    }

    /// Freigaben, die beim Beenden eines Timer-Workers (`blink-*`) passierten
    ///
    /// Der Worker hält die letzte Referenz auf den Ausgang, bis sein Thread
    /// endet. Jede solche Freigabe belegt also einen beendeten Timer.
    pub fn released_by_timer(&self) -> usize {
        self.lock().released_by_timer
    }

    /// Alle Pegelwechsel eines Pins in zeitlicher Reihenfolge
    pub fn events(&self, pin: u32) -> Vec<LevelEvent> {
        self.lock()
            .events
            .iter()
            .filter(|event| event.pin == pin)
            .copied()
            .collect()
    }

    pub fn levels(&self, pin: u32) -> Vec<Level> {
        self.events(pin).iter().map(|event| event.level).collect()
    }

    /// Anzahl aller Pegelwechsel über alle Pins
    pub fn change_count(&self) -> usize {
        self.lock().events.len()
    }
}

pub struct MockSource {
    pin: u32,
    board: MockBoard,
    broken: bool,
}

impl OutputSource for MockSource {
    type Output = MockOutput;

    fn acquire(self) -> Result<MockOutput, OutputError> {
        if self.broken {
            return Err(OutputError::Unavailable(format!("pin {} not wired", self.pin)));
        }
        self.board.lock().acquired += 1;
        Ok(MockOutput {
            pin: self.pin,
            board: self.board,
        })
    }
}

pub struct MockOutput {
    pin: u32,
    board: MockBoard,
}

impl GpioOutput for MockOutput {
    fn set_level(&mut self, level: Level) {
        self.board.lock().events.push(LevelEvent {
            pin: self.pin,
            level,
            at: Instant::now(),
        });
    }
}

impl Drop for MockOutput {
    fn drop(&mut self) {
        let on_timer = thread::current()
            .name()
            .is_some_and(|name| name.starts_with("blink-"));
        let mut board = self.board.lock();
        board.released += 1;
        if on_timer {
            board.released_by_timer += 1;
        }
    }
}

/// Descriptor für einen funktionierenden Pin
pub fn descriptor(
    board: &MockBoard,
    pin: u32,
    label: &str,
    on_ms: u32,
    off_ms: u32,
) -> LedDescriptor<MockSource> {
    LedDescriptor::new(label, board.pin(pin)).with_times(on_ms, off_ms)
}

// ============================================================================
// Failing Registrar
// ============================================================================

/// Registrar, der beim Attribut `fail_on` mit `ResourceExhausted` scheitert
///
/// Alle anderen Aufrufe werden an die innere `AttributeClass` durchgereicht.
pub struct FailingRegistrar {
    inner: AttributeClass,
    fail_on: String,
    unregistered: Arc<Mutex<Vec<String>>>,
}

impl FailingRegistrar {
    pub fn new(inner: AttributeClass, fail_on: &str) -> Self {
        Self {
            inner,
            fail_on: fail_on.into(),
            unregistered: Arc::default(),
        }
    }

    /// Gemeinsames Protokoll der `unregister`-Aufrufe
    pub fn unregistered(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.unregistered)
    }
}

impl AttributeRegistrar for FailingRegistrar {
    fn register(
        &mut self,
        name: &str,
        mode: u32,
        ops: Arc<dyn AttributeOps>,
    ) -> Result<(), RegistrationError> {
        if name == self.fail_on {
            return Err(RegistrationError::ResourceExhausted(name.into()));
        }
        self.inner.register(name, mode, ops)
    }

    fn unregister(&mut self, name: &str) {
        self.unregistered.lock().unwrap().push(name.into());
        self.inner.unregister(name);
    }
}

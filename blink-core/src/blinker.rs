//! LedBlinker - Blink-Zustandsmaschine für eine LED
//!
//! Zwei Ausführungskontexte greifen auf einen Blinker zu:
//! - der Timer-Worker (liest/schreibt die Phase, liest die Dauern)
//! - der Control-Schreibzugriff (schreibt die Dauern)
//!
//! Das Dauer-Paar liegt in einem einzigen `AtomicU64` und wird daher nie
//! zerrissen gelesen. Phase und Ausgang teilen sich einen Mutex, der nur
//! vom Timer-Worker und von `start()` genommen wird.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, trace};

use crate::control::ControlEndpoint;
use crate::logic::interval_for;
use crate::timer::BlinkTimer;
use crate::traits::GpioOutput;
use crate::types::{Durations, Phase};

/// Atomar austauschbares Paar aus Ein- und Ausschaltdauer
#[derive(Debug, Default)]
pub struct DurationCell(AtomicU64);

impl DurationCell {
    pub fn new(durations: Durations) -> Self {
        Self(AtomicU64::new(durations.pack()))
    }

    pub fn load(&self) -> Durations {
        Durations::unpack(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, durations: Durations) {
        self.0.store(durations.pack(), Ordering::Release);
    }
}

/// Einziger Schreibweg auf das Dauer-Paar einer LED
///
/// Wird vom Blinker selbst und von seinem Control-Endpoint geteilt.
#[derive(Debug, Clone)]
pub(crate) struct DurationHandle {
    label: Arc<str>,
    cell: Arc<DurationCell>,
}

impl DurationHandle {
    pub(crate) fn new(label: &str, durations: Durations) -> Self {
        Self {
            label: label.into(),
            cell: Arc::new(DurationCell::new(durations)),
        }
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn load(&self) -> Durations {
        self.cell.load()
    }

    pub(crate) fn set_durations(&self, on_ms: u32, off_ms: u32) {
        self.cell.store(Durations::new(on_ms, off_ms));
        debug!("{}: durations set to {} {}", self.label, on_ms, off_ms);
    }
}

struct Drive<O> {
    phase: Phase,
    output: O,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Zustandsmaschine {On, Off} einer LED samt eigenem Ausgang und Timer
pub struct LedBlinker<O: GpioOutput> {
    label: String,
    durations: DurationHandle,
    drive: Arc<Mutex<Drive<O>>>,
    // Zuletzt freigegeben: der Worker hält die letzte Referenz auf `drive`
    // und gibt den Ausgang beim Beenden ab
    timer: BlinkTimer,
}

impl<O: GpioOutput> LedBlinker<O> {
    /// Erstellt den Blinker, ohne ihn zu starten
    ///
    /// # Fehlerbehandlung
    /// Gibt den `io::Error` zurück, wenn der Timer nicht erstellt werden kann.
    /// Der Ausgang wird dann wieder freigegeben.
    pub fn new(label: impl Into<String>, durations: Durations, output: O) -> io::Result<Self> {
        let label = label.into();
        let durations = DurationHandle::new(&label, durations);
        let drive = Arc::new(Mutex::new(Drive {
            phase: Phase::On,
            output,
        }));

        let timer = {
            let label = label.clone();
            let durations = durations.clone();
            let drive = Arc::clone(&drive);
            BlinkTimer::new(thread_name(&label), move || {
                fire(&label, &drive, &durations)
            })?
        };

        Ok(Self {
            label,
            durations,
            drive,
            timer,
        })
    }

    /// Startet (oder startet neu) mit Phase `On` und Pegel High
    ///
    /// Bei `on_ms == 0` bleibt die LED an und der Timer untätig.
    pub fn start(&self) {
        self.timer.cancel();

        let mut drive = lock(&self.drive);
        drive.phase = Phase::On;
        drive.output.set_level(Phase::On.level());
        let interval = interval_for(Phase::On, self.durations.load());
        if let Some(interval) = interval {
            self.timer.arm(interval);
        }
        debug!("{}: started, first interval {:?}", self.label, interval);
    }

    /// Stoppt den Timer und wartet auf eine laufende Auslösung
    ///
    /// Der zuletzt getriebene Pegel bleibt stehen.
    pub fn stop(&self) {
        self.timer.cancel();
        debug!("{}: stopped", self.label);
    }

    /// Ersetzt beide Dauern als Einheit
    ///
    /// Es wird nicht neu geplant: die Werte gelten ab der nächsten Auslösung.
    /// Ein untätiger Blinker (Dauer 0) wird dadurch nicht geweckt, dafür
    /// muss `start()` erneut aufgerufen werden.
    pub fn set_durations(&self, on_ms: u32, off_ms: u32) {
        self.durations.set_durations(on_ms, off_ms);
    }

    pub fn durations(&self) -> Durations {
        self.durations.load()
    }

    pub fn phase(&self) -> Phase {
        lock(&self.drive).phase
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// `true`, solange eine Auslösung geplant ist
    pub fn is_running(&self) -> bool {
        self.timer.is_armed()
    }

    /// Control-Endpoint, der an das Dauer-Paar dieses Blinkers gebunden ist
    pub fn control_endpoint(&self) -> ControlEndpoint {
        ControlEndpoint::new(self.durations.clone())
    }
}

fn fire<O: GpioOutput>(
    label: &str,
    drive: &Mutex<Drive<O>>,
    durations: &DurationHandle,
) -> Option<Duration> {
    let mut drive = lock(drive);
    let phase = drive.phase.toggled();
    drive.phase = phase;
    drive.output.set_level(phase.level());
    // Dauern erst nach dem Umschalten lesen: eine Phase, die nach einem
    // Schreibzugriff beginnt, sieht immer die neuen Werte
    let interval = interval_for(phase, durations.load());
    trace!("{label}: {phase:?}, next in {interval:?}");
    interval
}

// Thread-Namen dürfen kein NUL-Byte enthalten
fn thread_name(label: &str) -> String {
    format!("blink-{}", label.replace('\0', ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Level;
    use std::thread;

    #[derive(Clone, Default)]
    struct RecordingOutput {
        levels: Arc<Mutex<Vec<Level>>>,
    }

    impl GpioOutput for RecordingOutput {
        fn set_level(&mut self, level: Level) {
            self.levels.lock().unwrap().push(level);
        }
    }

    #[test]
    fn test_new_does_not_drive_output() {
        let output = RecordingOutput::default();
        let blinker = LedBlinker::new("led0", Durations::new(10, 10), output.clone()).unwrap();
        assert!(!blinker.is_running());
        assert_eq!(blinker.phase(), Phase::On);
        assert!(output.levels.lock().unwrap().is_empty());
    }

    #[test]
    fn test_start_drives_high_and_arms() {
        let output = RecordingOutput::default();
        let blinker = LedBlinker::new("led0", Durations::new(200, 200), output.clone()).unwrap();
        blinker.start();
        assert!(blinker.is_running());
        assert_eq!(*output.levels.lock().unwrap(), vec![Level::High]);
        blinker.stop();
        assert!(!blinker.is_running());
    }

    #[test]
    fn test_zero_on_time_holds_high() {
        let output = RecordingOutput::default();
        let blinker = LedBlinker::new("led0", Durations::new(0, 50), output.clone()).unwrap();
        blinker.start();
        assert!(!blinker.is_running());
        thread::sleep(Duration::from_millis(100));
        assert_eq!(*output.levels.lock().unwrap(), vec![Level::High]);
        assert_eq!(blinker.phase(), Phase::On);
    }

    #[test]
    fn test_zero_off_time_goes_idle_low() {
        let output = RecordingOutput::default();
        let blinker = LedBlinker::new("led0", Durations::new(10, 0), output.clone()).unwrap();
        blinker.start();
        thread::sleep(Duration::from_millis(100));
        assert_eq!(*output.levels.lock().unwrap(), vec![Level::High, Level::Low]);
        assert_eq!(blinker.phase(), Phase::Off);
        assert!(!blinker.is_running());
    }

    #[test]
    fn test_set_durations_does_not_wake_idle_blinker() {
        let output = RecordingOutput::default();
        let blinker = LedBlinker::new("led0", Durations::new(0, 0), output.clone()).unwrap();
        blinker.start();
        blinker.set_durations(10, 10);
        thread::sleep(Duration::from_millis(60));
        assert_eq!(output.levels.lock().unwrap().len(), 1);
        assert_eq!(blinker.durations(), Durations::new(10, 10));

        // Erst ein erneuter Start weckt ihn
        blinker.start();
        thread::sleep(Duration::from_millis(60));
        blinker.stop();
        assert!(output.levels.lock().unwrap().len() > 2);
    }

    #[test]
    fn test_stop_keeps_last_level() {
        let output = RecordingOutput::default();
        let blinker = LedBlinker::new("led0", Durations::new(5, 5), output.clone()).unwrap();
        blinker.start();
        thread::sleep(Duration::from_millis(50));
        blinker.stop();

        let count = output.levels.lock().unwrap().len();
        let phase = blinker.phase();
        thread::sleep(Duration::from_millis(50));
        let levels = output.levels.lock().unwrap();
        assert_eq!(levels.len(), count);
        assert_eq!(levels.last().copied(), Some(phase.level()));
    }

    #[test]
    fn test_drop_releases_output() {
        let output = RecordingOutput::default();
        let levels = Arc::clone(&output.levels);
        let blinker = LedBlinker::new("led0", Durations::new(5, 5), output).unwrap();
        blinker.start();
        thread::sleep(Duration::from_millis(20));
        drop(blinker);
        assert_eq!(Arc::strong_count(&levels), 1);
    }

    #[test]
    fn test_control_endpoint_updates_blinker_durations() {
        let blinker =
            LedBlinker::new("led0", Durations::new(1, 2), RecordingOutput::default()).unwrap();
        let endpoint = blinker.control_endpoint();

        assert_eq!(endpoint.write("250 500"), 7);
        assert_eq!(blinker.durations(), Durations::new(250, 500));

        blinker.set_durations(30, 40);
        assert_eq!(endpoint.read(), "30 40\n");
    }

    #[test]
    fn test_duration_cell_roundtrip() {
        let cell = DurationCell::new(Durations::new(1, 2));
        assert_eq!(cell.load(), Durations::new(1, 2));
        cell.store(Durations::new(250, 500));
        assert_eq!(cell.load(), Durations::new(250, 500));
    }
}

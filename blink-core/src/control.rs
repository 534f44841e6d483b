//! ControlEndpoint - Text-Protokoll für das Dauer-Paar einer LED
//!
//! Lesen:     `"<on_ms> <off_ms>\n"`
//! Schreiben: genau zwei nicht-negative Ganzzahlen, sonst wird der
//!            Zugriff stillschweigend verworfen (0 Bytes akzeptiert)

use log::debug;

use crate::blinker::DurationHandle;
use crate::logic::{parse_durations, render_durations};
use crate::traits::AttributeOps;
use crate::types::Durations;

#[derive(Debug, Clone)]
pub struct ControlEndpoint {
    durations: DurationHandle,
}

impl ControlEndpoint {
    pub(crate) fn new(durations: DurationHandle) -> Self {
        Self { durations }
    }

    /// Name, unter dem das Attribut registriert wird
    pub fn name(&self) -> &str {
        self.durations.label()
    }

    pub fn read(&self) -> String {
        render_durations(self.durations.load())
    }

    /// Übernimmt die Dauern und meldet alle Bytes als akzeptiert
    ///
    /// Bei ungültiger Eingabe bleibt alles unverändert und es wird 0 gemeldet.
    pub fn write(&self, input: &str) -> usize {
        match parse_durations(input) {
            Some(Durations { on_ms, off_ms }) => {
                self.durations.set_durations(on_ms, off_ms);
                input.len()
            }
            None => {
                debug!("{}: control write ignored: {:?}", self.name(), input);
                0
            }
        }
    }
}

impl AttributeOps for ControlEndpoint {
    fn show(&self) -> String {
        self.read()
    }

    fn store(&self, input: &[u8]) -> usize {
        match core::str::from_utf8(input) {
            Ok(text) => self.write(text),
            Err(_) => {
                debug!("{}: control write ignored: not UTF-8", self.name());
                0
            }
        }
    }
}

//! Hardware Abstraction Traits
//!
//! Diese Traits definieren Schnittstellen zu den externen Kollaborateuren
//! (GPIO-Ausgang, Attribut-Registrar) ohne konkrete Implementierung.

use std::sync::Arc;

use crate::error::{OutputError, RegistrationError};
use crate::types::Level;

/// Trait für einen einzelnen digitalen Ausgang
///
/// Einmal belegt gilt der Ausgang als immer verfügbar, daher ist
/// `set_level` unfehlbar. Freigegeben wird er per `Drop`.
///
/// # Implementierungen
/// - **Production:** `SysfsOutput` (blink-daemon, Linux sysfs GPIO)
/// - **Testing:** `MockOutput` (blink-tests, in-memory Mock)
pub trait GpioOutput: Send + 'static {
    fn set_level(&mut self, level: Level);
}

/// An einen Pin gebundene, noch nicht belegte Ausgangs-Capability
pub trait OutputSource {
    type Output: GpioOutput;

    /// Belegt den Ausgang
    ///
    /// # Fehlerbehandlung
    /// Gibt `OutputError` zurück, wenn der Pin nicht verfügbar ist
    fn acquire(self) -> Result<Self::Output, OutputError>;
}

/// Callback-Slots eines lesbaren/schreibbaren Text-Attributs
pub trait AttributeOps: Send + Sync {
    /// Rendert den aktuellen Inhalt des Attributs
    fn show(&self) -> String;

    /// Verarbeitet einen Schreibzugriff, gibt die Anzahl akzeptierter Bytes zurück
    fn store(&self, input: &[u8]) -> usize;
}

/// Registrierungs-Kontext für die Control-Attribute einer Geräte-Instanz
pub trait AttributeRegistrar: Send {
    fn register(
        &mut self,
        name: &str,
        mode: u32,
        ops: Arc<dyn AttributeOps>,
    ) -> Result<(), RegistrationError>;

    fn unregister(&mut self, name: &str);
}

impl<R: AttributeRegistrar + ?Sized> AttributeRegistrar for Box<R> {
    fn register(
        &mut self,
        name: &str,
        mode: u32,
        ops: Arc<dyn AttributeOps>,
    ) -> Result<(), RegistrationError> {
        (**self).register(name, mode, ops)
    }

    fn unregister(&mut self, name: &str) {
        (**self).unregister(name)
    }
}

// Library-Root: Linux-Anbindung der Blinksteuerung
//
// Die Zustandsmaschine, Timer und das Control-Protokoll liegen in
// blink-core; hier leben nur die Kollaborateure für den Host:
// sysfs GPIO-Ausgänge, Konfiguration und die stdin-Konsole.

pub mod config;
pub mod console;
pub mod hal;

// Re-exports von blink-core
pub use blink_core::{AttributeClass, LedDevice};

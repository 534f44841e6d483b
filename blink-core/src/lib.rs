//! Blink Core - Blink-Zustandsmaschine, Timer und Control-Protokoll
//!
//! Diese Crate enthält KEINE Hardware-Dependencies.
//! GPIO-Ausgang und Attribut-Registrar sind Traits, die von außen
//! implementiert werden (blink-daemon bzw. Mocks in blink-tests).

pub mod blinker;
pub mod control;
pub mod device;
pub mod error;
pub mod logic;
pub mod registrar;
pub mod table;
pub mod timer;
pub mod traits;
pub mod types;

// Re-exports für einfachen Zugriff
pub use blinker::{DurationCell, LedBlinker};
pub use control::ControlEndpoint;
pub use device::LedDevice;
pub use error::{ConstructionError, DeviceError, NotFound, OutputError, RegistrationError};
pub use logic::{interval_for, parse_durations, render_durations};
pub use registrar::AttributeClass;
pub use table::LedTable;
pub use timer::BlinkTimer;
pub use traits::{AttributeOps, AttributeRegistrar, GpioOutput, OutputSource};
pub use types::{CONTROL_MODE, Durations, LedDescriptor, Level, Phase};

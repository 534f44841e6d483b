//! Fehler-Typen für Aufbau, Registrierung und Lookup

use core::fmt;
use std::io;

/// Fehler beim Belegen einer Ausgangs-Capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputError {
    /// Pin existiert nicht oder ist nicht ansteuerbar
    Unavailable(String),
    /// Pin ist bereits von einem anderen Besitzer belegt
    Busy,
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "output unavailable: {reason}"),
            Self::Busy => write!(f, "output already in use"),
        }
    }
}

impl std::error::Error for OutputError {}

/// Fehler beim Aufbau einer `LedTable`
///
/// Alles-oder-nichts: bei einem Fehler wurden alle bereits belegten
/// Ausgänge und Timer wieder freigegeben.
#[derive(Debug)]
pub enum ConstructionError {
    /// Descriptor-Liste ist leer
    NoLeds,
    OutputUnavailable {
        label: String,
        source: OutputError,
    },
    TimerUnavailable {
        label: String,
        source: io::Error,
    },
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoLeds => write!(f, "no LED descriptors supplied"),
            Self::OutputUnavailable { label, source } => {
                write!(f, "LED '{label}': {source}")
            }
            Self::TimerUnavailable { label, source } => {
                write!(f, "LED '{label}': cannot create blink timer: {source}")
            }
        }
    }
}

impl std::error::Error for ConstructionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NoLeds => None,
            Self::OutputUnavailable { source, .. } => Some(source),
            Self::TimerUnavailable { source, .. } => Some(source),
        }
    }
}

/// Fehler beim Installieren eines Control-Attributs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// Ein Attribut mit diesem Namen existiert bereits
    NameCollision(String),
    /// Registrar kann keine weiteren Attribute aufnehmen
    ResourceExhausted(String),
    /// Name ist leer oder enthält '/'
    InvalidName(String),
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameCollision(name) => write!(f, "attribute '{name}' already registered"),
            Self::ResourceExhausted(name) => {
                write!(f, "no room left to register attribute '{name}'")
            }
            Self::InvalidName(name) => write!(f, "invalid attribute name '{name}'"),
        }
    }
}

impl std::error::Error for RegistrationError {}

/// Kein Eintrag mit diesem Label in der Tabelle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound(pub String);

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no LED labelled '{}'", self.0)
    }
}

impl std::error::Error for NotFound {}

/// Einziger Fehlerwert, der beim Hochfahren einer Geräte-Instanz entsteht
#[derive(Debug)]
pub enum DeviceError {
    Construction(ConstructionError),
    Registration(RegistrationError),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construction(e) => write!(f, "construction failed: {e}"),
            Self::Registration(e) => write!(f, "registration failed: {e}"),
        }
    }
}

impl std::error::Error for DeviceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Construction(e) => Some(e),
            Self::Registration(e) => Some(e),
        }
    }
}

impl From<ConstructionError> for DeviceError {
    fn from(e: ConstructionError) -> Self {
        Self::Construction(e)
    }
}

impl From<RegistrationError> for DeviceError {
    fn from(e: RegistrationError) -> Self {
        Self::Registration(e)
    }
}

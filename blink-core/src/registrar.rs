//! AttributeClass - In-Memory Registrierungs-Kontext für Control-Attribute
//!
//! Jede Geräte-Instanz bekommt einen eigenen Kontext, so dass sich mehrere
//! Instanzen nie in die Quere kommen. Klone teilen sich denselben Inhalt:
//! die `LedTable` besitzt einen Klon zum Registrieren, der Aufrufer behält
//! einen zum Lesen/Schreiben der Attribute.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::error::RegistrationError;
use crate::traits::{AttributeOps, AttributeRegistrar};

struct Attribute {
    mode: u32,
    ops: Arc<dyn AttributeOps>,
}

#[derive(Default)]
struct Attributes {
    capacity: Option<usize>,
    entries: BTreeMap<String, Attribute>,
}

#[derive(Clone)]
pub struct AttributeClass {
    name: Arc<str>,
    attributes: Arc<Mutex<Attributes>>,
}

impl AttributeClass {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            attributes: Arc::default(),
        }
    }

    /// Kontext, der höchstens `capacity` Attribute aufnimmt
    pub fn with_capacity(name: &str, capacity: usize) -> Self {
        let class = Self::new(name);
        class.lock().capacity = Some(capacity);
        class
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> MutexGuard<'_, Attributes> {
        self.attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn ops(&self, attribute: &str) -> Option<Arc<dyn AttributeOps>> {
        self.lock()
            .entries
            .get(attribute)
            .map(|entry| Arc::clone(&entry.ops))
    }

    /// Liest ein Attribut, `None` wenn es nicht registriert ist
    pub fn show(&self, attribute: &str) -> Option<String> {
        self.ops(attribute).map(|ops| ops.show())
    }

    /// Schreibt ein Attribut, liefert die Anzahl akzeptierter Bytes
    pub fn store(&self, attribute: &str, input: &[u8]) -> Option<usize> {
        self.ops(attribute).map(|ops| ops.store(input))
    }

    pub fn mode(&self, attribute: &str) -> Option<u32> {
        self.lock().entries.get(attribute).map(|entry| entry.mode)
    }

    /// Namen aller registrierten Attribute (sortiert)
    pub fn names(&self) -> Vec<String> {
        self.lock().entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AttributeRegistrar for AttributeClass {
    fn register(
        &mut self,
        name: &str,
        mode: u32,
        ops: Arc<dyn AttributeOps>,
    ) -> Result<(), RegistrationError> {
        if name.is_empty() || name.contains('/') || name.contains('\0') {
            return Err(RegistrationError::InvalidName(name.into()));
        }

        let mut attributes = self.lock();
        if attributes.entries.contains_key(name) {
            return Err(RegistrationError::NameCollision(name.into()));
        }
        if attributes
            .capacity
            .is_some_and(|capacity| attributes.entries.len() >= capacity)
        {
            return Err(RegistrationError::ResourceExhausted(name.into()));
        }

        attributes
            .entries
            .insert(name.into(), Attribute { mode, ops });
        debug!("{}: attribute '{}' registered ({:o})", self.name, name, mode);
        Ok(())
    }

    fn unregister(&mut self, name: &str) {
        if self.lock().entries.remove(name).is_some() {
            debug!("{}: attribute '{}' removed", self.name, name);
        }
    }
}

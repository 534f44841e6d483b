//! LedTable - Besitzende Sammlung aller Blinker einer Geräte-Instanz
//!
//! Lebenszyklus:
//! `build` → `register` → `start_all` → [läuft] → `stop_all` → `unregister_all` → Drop
//!
//! `build` und `register` sind jeweils Alles-oder-nichts. Drop führt
//! `stop_all` und `unregister_all` nachträglich aus, falls nötig.

use std::sync::Arc;

use log::{error, info, warn};

use crate::blinker::LedBlinker;
use crate::error::{ConstructionError, NotFound, RegistrationError};
use crate::traits::{AttributeRegistrar, GpioOutput, OutputSource};
use crate::types::{CONTROL_MODE, LedDescriptor};

pub struct LedTable<O: GpioOutput> {
    entries: Vec<LedBlinker<O>>,
    registrar: Option<Box<dyn AttributeRegistrar>>,
    registered: Vec<String>,
}

impl<O: GpioOutput> LedTable<O> {
    /// Baut die Tabelle in Descriptor-Reihenfolge auf
    ///
    /// # Fehlerbehandlung
    /// Schlägt das Belegen eines Ausgangs oder das Erstellen eines Timers
    /// fehl, werden alle bereits belegten Ressourcen freigegeben.
    pub fn build<S, I>(descriptors: I) -> Result<Self, ConstructionError>
    where
        S: OutputSource<Output = O>,
        I: IntoIterator<Item = LedDescriptor<S>>,
    {
        let descriptors: Vec<_> = descriptors.into_iter().collect();
        info!("building LED table from {} descriptors", descriptors.len());
        if descriptors.is_empty() {
            return Err(ConstructionError::NoLeds);
        }

        let mut entries = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let durations = descriptor.durations();
            let LedDescriptor { label, output, .. } = descriptor;

            let output = match output.acquire() {
                Ok(output) => output,
                Err(source) => {
                    error!("{label}: cannot acquire output: {source}");
                    return Err(ConstructionError::OutputUnavailable { label, source });
                }
            };

            match LedBlinker::new(label.clone(), durations, output) {
                Ok(blinker) => entries.push(blinker),
                Err(source) => {
                    error!("{label}: cannot create blink timer: {source}");
                    return Err(ConstructionError::TimerUnavailable { label, source });
                }
            }
        }

        Ok(Self {
            entries,
            registrar: None,
            registered: Vec::new(),
        })
    }

    /// Installiert für jeden Eintrag ein Control-Attribut (Name = Label)
    ///
    /// Der Registrierungs-Kontext gehört danach der Tabelle.
    ///
    /// # Fehlerbehandlung
    /// Schlägt eine Registrierung fehl, werden die bereits installierten
    /// Attribute wieder entfernt und der Fehler zurückgegeben.
    pub fn register<R>(&mut self, registrar: R) -> Result<(), RegistrationError>
    where
        R: AttributeRegistrar + 'static,
    {
        self.unregister_all();

        let mut registrar: Box<dyn AttributeRegistrar> = Box::new(registrar);
        for blinker in &self.entries {
            let endpoint = blinker.control_endpoint();
            if let Err(e) = registrar.register(blinker.label(), CONTROL_MODE, Arc::new(endpoint)) {
                warn!(
                    "registering '{}' failed: {e}, removing {} attribute(s)",
                    blinker.label(),
                    self.registered.len()
                );
                for name in self.registered.drain(..).rev() {
                    registrar.unregister(&name);
                }
                return Err(e);
            }
            self.registered.push(blinker.label().to_owned());
        }

        info!("{} control attribute(s) registered", self.registered.len());
        self.registrar = Some(registrar);
        Ok(())
    }

    /// Entfernt alle installierten Attribute in Registrierungs-Reihenfolge
    pub fn unregister_all(&mut self) {
        if let Some(mut registrar) = self.registrar.take() {
            for name in self.registered.drain(..) {
                registrar.unregister(&name);
            }
            info!("control attributes removed");
        }
    }

    pub fn start_all(&self) {
        for blinker in &self.entries {
            blinker.start();
        }
        info!("{} LED(s) started", self.entries.len());
    }

    /// Stoppt alle Einträge der Reihe nach
    ///
    /// Nach der Rückkehr kann für keinen Eintrag mehr ein Callback laufen.
    pub fn stop_all(&self) {
        for blinker in &self.entries {
            blinker.stop();
        }
        info!("{} LED(s) stopped", self.entries.len());
    }

    /// Erster Eintrag mit diesem Label
    pub fn lookup(&self, label: &str) -> Result<&LedBlinker<O>, NotFound> {
        self.entries
            .iter()
            .find(|blinker| blinker.label() == label)
            .ok_or_else(|| NotFound(label.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedBlinker<O>> {
        self.entries.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(LedBlinker::label).collect()
    }

    pub fn is_registered(&self) -> bool {
        self.registrar.is_some()
    }
}

impl<O: GpioOutput> Drop for LedTable<O> {
    fn drop(&mut self) {
        if self.entries.iter().any(LedBlinker::is_running) {
            self.stop_all();
        }
        self.unregister_all();
    }
}

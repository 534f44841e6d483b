//! LedDevice - Hochfahren und Entfernen einer Geräte-Instanz
//!
//! Bündelt den Lebenszyklus der `LedTable` zu zwei Operationen, wie sie
//! ein Geräte-Framework aufruft: `probe` und `remove`.

use log::info;

use crate::error::DeviceError;
use crate::table::LedTable;
use crate::traits::{AttributeRegistrar, GpioOutput, OutputSource};
use crate::types::LedDescriptor;

pub struct LedDevice<O: GpioOutput> {
    table: LedTable<O>,
}

impl<O: GpioOutput> LedDevice<O> {
    /// Baut die Tabelle, registriert die Attribute und startet alle LEDs
    ///
    /// # Fehlerbehandlung
    /// Bei einem Fehler läuft danach nichts und nichts ist registriert.
    pub fn probe<S, I, R>(descriptors: I, registrar: R) -> Result<Self, DeviceError>
    where
        S: OutputSource<Output = O>,
        I: IntoIterator<Item = LedDescriptor<S>>,
        R: AttributeRegistrar + 'static,
    {
        info!("probing LED device");
        let mut table = LedTable::build(descriptors)?;
        table.register(registrar)?;
        table.start_all();
        Ok(Self { table })
    }

    pub fn table(&self) -> &LedTable<O> {
        &self.table
    }

    /// Stoppt alle LEDs, entfernt die Attribute und gibt die Ausgänge frei
    pub fn remove(mut self) {
        info!("removing LED device");
        self.table.stop_all();
        self.table.unregister_all();
    }
}

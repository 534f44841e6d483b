// Hardware Abstraction Layer (HAL) Module
//
// Implementiert die Ausgangs-Traits aus blink-core für Linux sysfs GPIO.

pub mod gpio_output;

pub use gpio_output::{SysfsOutput, SysfsPin};

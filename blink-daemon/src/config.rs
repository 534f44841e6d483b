// Projekt-Konfiguration: Konstanten, Umgebungsvariablen und LED-Beschreibungen

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, bail};
use blink_core::LedDescriptor;
use log::LevelFilter;
use serde::Deserialize;

use crate::hal::SysfsPin;

// ============================================================================
// Konstanten
// ============================================================================

/// Name des Attribut-Kontexts (eine Instanz pro Daemon)
pub const CLASS_NAME: &str = "leds-gpio-blink";

/// Standard-Pfad der LED-Beschreibungen (JSON)
pub const DEFAULT_CONFIG_PATH: &str = "leds.json";

/// Standard-Log-Level, wenn `BLINK_LOG` nicht gesetzt ist
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

// ============================================================================
// Umgebungsvariablen
// ============================================================================
//
// Können in einer .env Datei im Arbeitsverzeichnis gesetzt werden.

pub const ENV_CONFIG: &str = "BLINK_CONFIG";
pub const ENV_CLASS: &str = "BLINK_CLASS";
pub const ENV_LOG: &str = "BLINK_LOG";

/// Laufzeit-Konfiguration des Daemons
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub config_path: PathBuf,
    pub class_name: String,
    pub log_level: LevelFilter,
}

impl DaemonConfig {
    /// Liest die Konfiguration aus der Prozess-Umgebung
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Liest die Konfiguration über eine beliebige Schlüssel-Abfrage
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let log_level = match lookup(ENV_LOG) {
            Some(level) => LevelFilter::from_str(level.trim())
                .with_context(|| format!("{ENV_LOG}: invalid log level '{level}'"))?,
            None => DEFAULT_LOG_LEVEL,
        };

        Ok(Self {
            config_path: lookup(ENV_CONFIG)
                .unwrap_or_else(|| DEFAULT_CONFIG_PATH.into())
                .into(),
            class_name: lookup(ENV_CLASS).unwrap_or_else(|| CLASS_NAME.into()),
            log_level,
        })
    }

    /// Logger für stderr mit dem konfigurierten Level
    ///
    /// Installiert wird er erst mit `try_init()`.
    pub fn logger(&self) -> env_logger::Builder {
        let mut builder = env_logger::Builder::new();
        builder
            .filter_level(self.log_level)
            .format_timestamp_millis();
        builder
    }
}

// ============================================================================
// LED-Beschreibungen
// ============================================================================

/// Eine LED aus der JSON-Datei
///
/// ```json
/// { "label": "led0", "gpio": 17, "on-time": 250, "off-time": 750, "active-low": false }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LedConfig {
    pub label: String,
    pub gpio: u32,
    #[serde(default)]
    pub on_time: u32,
    #[serde(default)]
    pub off_time: u32,
    #[serde(default)]
    pub active_low: bool,
}

impl LedConfig {
    /// Descriptor für die Core-Crate
    pub fn descriptor(&self) -> LedDescriptor<SysfsPin> {
        let pin = SysfsPin::new(self.gpio).active_low(self.active_low);
        LedDescriptor::new(self.label.clone(), pin).with_times(self.on_time, self.off_time)
    }
}

/// Parst eine JSON-Liste von LED-Beschreibungen
pub fn parse_led_configs(json: &str) -> anyhow::Result<Vec<LedConfig>> {
    let leds: Vec<LedConfig> = serde_json::from_str(json).context("invalid LED description")?;
    if let Some(led) = leds.iter().find(|led| led.label.trim().is_empty()) {
        bail!("LED on gpio {} has an empty label", led.gpio);
    }
    Ok(leds)
}

pub fn load_led_configs(path: &Path) -> anyhow::Result<Vec<LedConfig>> {
    let json =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    parse_led_configs(&json).with_context(|| format!("in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_without_environment() {
        let config = DaemonConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.config_path, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(config.class_name, CLASS_NAME);
        assert_eq!(config.log_level, LevelFilter::Info);
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_CONFIG, "/etc/blink/leds.json"),
            (ENV_CLASS, "status-leds"),
            (ENV_LOG, "trace"),
        ]);
        let config = DaemonConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.config_path, PathBuf::from("/etc/blink/leds.json"));
        assert_eq!(config.class_name, "status-leds");
        assert_eq!(config.log_level, LevelFilter::Trace);
    }

    #[test]
    fn test_logger_uses_configured_level() {
        let config =
            DaemonConfig::from_lookup(|key| (key == ENV_LOG).then(|| "debug".into())).unwrap();
        assert_eq!(config.logger().build().filter(), LevelFilter::Debug);

        let config = DaemonConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.logger().build().filter(), DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_invalid_log_level() {
        let result = DaemonConfig::from_lookup(|key| (key == ENV_LOG).then(|| "loud".into()));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_led_configs_with_defaults() {
        let leds = parse_led_configs(
            r#"[
                { "label": "red", "gpio": 17, "on-time": 250, "off-time": 750 },
                { "label": "green", "gpio": 27, "active-low": true }
            ]"#,
        )
        .unwrap();

        assert_eq!(
            leds,
            vec![
                LedConfig {
                    label: "red".into(),
                    gpio: 17,
                    on_time: 250,
                    off_time: 750,
                    active_low: false,
                },
                LedConfig {
                    label: "green".into(),
                    gpio: 27,
                    on_time: 0,
                    off_time: 0,
                    active_low: true,
                },
            ]
        );
    }

    #[test]
    fn test_parse_led_configs_rejects_bad_input() {
        assert!(parse_led_configs(r#"[{ "label": "", "gpio": 1 }]"#).is_err());
        assert!(parse_led_configs(r#"[{ "label": "a" }]"#).is_err());
        assert!(parse_led_configs(r#"[{ "label": "a", "gpio": 1, "color": "red" }]"#).is_err());
        assert!(parse_led_configs(r#"[{ "label": "a", "gpio": 1, "on-time": -5 }]"#).is_err());
    }

    #[test]
    fn test_descriptor_carries_times() {
        let led = LedConfig {
            label: "red".into(),
            gpio: 17,
            on_time: 100,
            off_time: 200,
            active_low: false,
        };
        let descriptor = led.descriptor();
        assert_eq!(descriptor.label, "red");
        assert_eq!(descriptor.on_time_ms, 100);
        assert_eq!(descriptor.off_time_ms, 200);
        assert_eq!(descriptor.output.number(), 17);
        assert!(!descriptor.output.is_active_low());
    }
}

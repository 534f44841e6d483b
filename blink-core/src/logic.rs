//! Pure Business Logic Functions
//!
//! Funktionen ohne Hardware- oder Thread-Dependencies (testbar!)

use core::time::Duration;

use crate::types::{Durations, Phase};

/// Intervall für eine Phase, `None` bei Dauer 0
///
/// # Beispiele
///
/// ```
/// # use blink_core::{Durations, Phase, interval_for};
/// # use core::time::Duration;
/// let durations = Durations::new(100, 0);
/// assert_eq!(interval_for(Phase::On, durations), Some(Duration::from_millis(100)));
/// assert_eq!(interval_for(Phase::Off, durations), None);
/// ```
pub fn interval_for(phase: Phase, durations: Durations) -> Option<Duration> {
    match durations.interval(phase) {
        0 => None,
        ms => Some(Duration::from_millis(u64::from(ms))),
    }
}

/// Rendert das Paar im Attribut-Format `"<on> <off>\n"`
pub fn render_durations(durations: Durations) -> String {
    format!("{durations}\n")
}

/// Parst genau zwei durch Whitespace getrennte, nicht-negative Ganzzahlen
///
/// Führender und abschließender Whitespace ist erlaubt. Weniger oder mehr
/// als zwei Tokens, Vorzeichen und Nicht-Ziffern ergeben `None`.
///
/// # Beispiele
///
/// ```
/// # use blink_core::{Durations, parse_durations};
/// assert_eq!(parse_durations(" 250 500\n"), Some(Durations::new(250, 500)));
/// assert_eq!(parse_durations("250"), None);
/// ```
pub fn parse_durations(input: &str) -> Option<Durations> {
    let mut tokens = input.split_whitespace();
    let on_ms = parse_ms(tokens.next()?)?;
    let off_ms = parse_ms(tokens.next()?)?;
    if tokens.next().is_some() {
        return None;
    }
    Some(Durations::new(on_ms, off_ms))
}

fn parse_ms(token: &str) -> Option<u32> {
    // u32::from_str akzeptiert ein führendes '+', das wollen wir nicht
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

// Zeilenbasierte Konsole: liest Kommandos von stdin und leitet sie an die
// registrierten Control-Attribute weiter
//
//   list              → Namen aller Attribute
//   <label>           → Attribut lesen ("<on_ms> <off_ms>")
//   <label> <text...> → <text...> in das Attribut schreiben, Antwort: akzeptierte Bytes
//   quit              → beenden (ebenso EOF)
//
// Die Konsole läuft in einem eigenen Thread. Ihr Ende und Signale landen im
// selben Kanal, damit der Main-Thread in jedem Fall das Gerät entfernt.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::Sender;
use std::thread;

use blink_core::AttributeClass;
use log::{debug, info};

/// Grund, den Daemon zu beenden
#[derive(Debug)]
pub enum Shutdown {
    /// `quit`, EOF oder Lese-/Schreibfehler der Konsole
    ConsoleClosed(io::Result<()>),
    /// SIGINT/SIGTERM
    Signal,
}

/// Ein geparstes Konsolen-Kommando
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    List,
    Quit,
    Show(String),
    Store { name: String, input: String },
}

impl TryFrom<&str> for ConsoleCommand {
    type Error = ();

    fn try_from(line: &str) -> Result<Self, Self::Error> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim_start()),
            None => (line, ""),
        };

        match (name, rest) {
            ("", _) => Err(()),
            ("list", "") => Ok(Self::List),
            ("quit", "") => Ok(Self::Quit),
            (name, "") => Ok(Self::Show(name.into())),
            (name, input) => Ok(Self::Store {
                name: name.into(),
                input: input.into(),
            }),
        }
    }
}

/// Verarbeitet Kommandos, bis `quit` oder EOF erreicht ist
pub fn run_console<R: BufRead, W: Write>(
    input: R,
    mut output: W,
    class: &AttributeClass,
) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        let Ok(command) = ConsoleCommand::try_from(line.as_str()) else {
            continue;
        };
        debug!("console: {command:?}");

        match command {
            ConsoleCommand::Quit => break,
            ConsoleCommand::List => {
                for name in class.names() {
                    writeln!(output, "{name}")?;
                }
            }
            ConsoleCommand::Show(name) => match class.show(&name) {
                Some(text) => write!(output, "{text}")?,
                None => writeln!(output, "{name}: no such attribute")?,
            },
            ConsoleCommand::Store { name, input } => match class.store(&name, input.as_bytes()) {
                Some(accepted) => writeln!(output, "{accepted}")?,
                None => writeln!(output, "{name}: no such attribute")?,
            },
        }
        output.flush()?;
    }

    info!("console closed");
    Ok(())
}

/// Startet `run_console` in einem eigenen Thread
///
/// Das Ende der Konsole wird als `Shutdown::ConsoleClosed` auf `events`
/// gemeldet. Der Thread wird nicht gejoint: ein blockierendes Lesen hält
/// das Beenden nicht auf.
pub fn spawn_console<R, W>(
    input: R,
    output: W,
    class: AttributeClass,
    events: Sender<Shutdown>,
) -> io::Result<()>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
{
    thread::Builder::new()
        .name("console".into())
        .spawn(move || {
            let result = run_console(input, output, &class);
            events.send(Shutdown::ConsoleClosed(result)).ok();
        })?;
    Ok(())
}

//! BlinkTimer - abbrechbarer One-Shot-Timer mit Neustart aus dem Callback
//!
//! Jeder Timer besitzt einen eigenen Worker-Thread, der den gebundenen
//! Callback ausführt. Der Callback läuft damit nie synchron in `arm()`.
//!
//! Der Callback liefert das nächste Intervall zurück (`Some`) oder bleibt
//! untätig (`None`). Ein Neustart aus einer Auslösung, die inzwischen per
//! `arm()`/`cancel()` überholt wurde, wird verworfen (Generation-Zähler).

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use log::error;

struct TimerState {
    deadline: Option<Instant>,
    generation: u64,
    firing: bool,
    shutdown: bool,
}

struct Shared {
    state: Mutex<TimerState>,
    wakeup: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Timer mit höchstens einer ausstehenden Auslösung
pub struct BlinkTimer {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
    worker_id: ThreadId,
}

impl BlinkTimer {
    /// Erstellt den Timer samt Worker-Thread `name`, zunächst nicht scharf
    ///
    /// # Fehlerbehandlung
    /// Gibt den `io::Error` zurück, wenn der Thread nicht gestartet werden kann
    pub fn new<F>(name: impl Into<String>, callback: F) -> io::Result<Self>
    where
        F: FnMut() -> Option<Duration> + Send + 'static,
    {
        let shared = Arc::new(Shared {
            state: Mutex::new(TimerState {
                deadline: None,
                generation: 0,
                firing: false,
                shutdown: false,
            }),
            wakeup: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(name.into())
            .spawn(move || run(&worker_shared, callback))?;
        let worker_id = worker.thread().id();

        Ok(Self {
            shared,
            worker: Some(worker),
            worker_id,
        })
    }

    /// Plant genau eine Auslösung nach `duration`
    ///
    /// Eine bereits ausstehende Auslösung wird ersetzt. `Duration::ZERO`
    /// lässt den Timer untätig.
    pub fn arm(&self, duration: Duration) {
        let mut state = self.shared.lock();
        state.generation = state.generation.wrapping_add(1);
        state.deadline = if duration.is_zero() {
            None
        } else {
            Instant::now().checked_add(duration)
        };
        drop(state);
        self.shared.wakeup.notify_all();
    }

    /// Bricht den Timer ab und wartet auf eine laufende Auslösung
    ///
    /// Nach der Rückkehr feuert der Callback nicht mehr, bis erneut `arm()`
    /// aufgerufen wird. Aus dem Callback selbst aufgerufen wird nicht gewartet.
    pub fn cancel(&self) {
        let mut state = self.shared.lock();
        state.deadline = None;
        state.generation = state.generation.wrapping_add(1);
        if thread::current().id() != self.worker_id {
            while state.firing {
                state = self
                    .shared
                    .wakeup
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
        drop(state);
        self.shared.wakeup.notify_all();
    }

    pub fn is_armed(&self) -> bool {
        self.shared.lock().deadline.is_some()
    }
}

impl Drop for BlinkTimer {
    fn drop(&mut self) {
        {
            let mut state = self.shared.lock();
            state.shutdown = true;
            state.deadline = None;
        }
        self.shared.wakeup.notify_all();

        if let Some(worker) = self.worker.take() {
            if worker.thread().id() != thread::current().id() && worker.join().is_err() {
                error!("blink timer worker terminated abnormally");
            }
        }
    }
}

fn run<F>(shared: &Shared, mut callback: F)
where
    F: FnMut() -> Option<Duration>,
{
    let mut state = shared.lock();
    loop {
        if state.shutdown {
            return;
        }

        let Some(deadline) = state.deadline else {
            state = shared
                .wakeup
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
            continue;
        };

        let now = Instant::now();
        if now < deadline {
            state = shared
                .wakeup
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
            continue;
        }

        state.deadline = None;
        state.firing = true;
        let generation = state.generation;
        drop(state);

        let next = panic::catch_unwind(AssertUnwindSafe(&mut callback)).unwrap_or_else(|_| {
            error!("blink timer callback panicked, timer left idle");
            None
        });

        state = shared.lock();
        state.firing = false;
        if let Some(interval) = next {
            if state.generation == generation && !state.shutdown && !interval.is_zero() {
                // Ab der fälligen Zeit planen, damit sich Latenzen nicht aufsummieren.
                // Wer eine ganze Periode verschlafen hat, holt nicht nach.
                let now = Instant::now();
                state.deadline = match deadline.checked_add(interval) {
                    Some(due) if due > now => Some(due),
                    _ => now.checked_add(interval),
                };
            }
        }
        shared.wakeup.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::mpsc;

    #[test]
    fn test_timer_fires_once_after_duration() {
        let (tx, rx) = mpsc::channel();
        let timer = BlinkTimer::new("test-once", move || {
            tx.send(Instant::now()).ok();
            None
        })
        .unwrap();

        let armed_at = Instant::now();
        timer.arm(Duration::from_millis(30));
        // Nie synchron in arm()
        assert!(rx.try_recv().is_err());

        let fired_at = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(fired_at.duration_since(armed_at) >= Duration::from_millis(30));
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_timer_rearms_from_callback() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let timer = BlinkTimer::new("test-rearm", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            (n < 3).then(|| Duration::from_millis(5))
        })
        .unwrap();

        timer.arm(Duration::from_millis(5));
        thread::sleep(Duration::from_millis(300));
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_timer_rearm_is_anchored_to_deadline() {
        let (tx, rx) = mpsc::channel();
        let timer = BlinkTimer::new("test-anchor", move || {
            tx.send(Instant::now()).ok();
            // Langsamer Callback: darf die Periode nicht verlängern
            thread::sleep(Duration::from_millis(40));
            Some(Duration::from_millis(60))
        })
        .unwrap();

        let armed_at = Instant::now();
        timer.arm(Duration::from_millis(60));
        let fired: Vec<Duration> = (0..3)
            .map(|_| {
                rx.recv_timeout(Duration::from_secs(2))
                    .unwrap()
                    .duration_since(armed_at)
            })
            .collect();
        timer.cancel();

        for (n, at) in fired.iter().enumerate() {
            assert!(*at >= Duration::from_millis(60 * (n as u64 + 1)), "firing {n} early: {at:?}");
        }
        // Relativ zum Callback-Ende geplant wäre die dritte Auslösung erst bei >= 260 ms
        assert!(fired[2] < Duration::from_millis(240), "drifted: {:?}", fired[2]);
    }

    #[test]
    fn test_timer_late_firing_does_not_burst() {
        let (tx, rx) = mpsc::channel();
        let mut first = true;
        let timer = BlinkTimer::new("test-late", move || {
            tx.send(Instant::now()).ok();
            if std::mem::take(&mut first) {
                // Länger als eine ganze Periode blockiert
                thread::sleep(Duration::from_millis(80));
            }
            Some(Duration::from_millis(30))
        })
        .unwrap();

        timer.arm(Duration::from_millis(5));
        let first_at = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        let second_at = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        timer.cancel();

        // Nach dem Blockieren wird ab jetzt geplant, nicht sofort nachgeholt
        assert!(second_at.duration_since(first_at) >= Duration::from_millis(80 + 30));
    }

    #[test]
    fn test_timer_zero_duration_does_not_arm() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let timer = BlinkTimer::new("test-zero", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            None
        })
        .unwrap();

        timer.arm(Duration::ZERO);
        assert!(!timer.is_armed());
        thread::sleep(Duration::from_millis(50));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_timer_cancel_prevents_firing() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let timer = BlinkTimer::new("test-cancel", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(Duration::from_millis(10))
        })
        .unwrap();

        timer.arm(Duration::from_millis(50));
        timer.cancel();
        assert!(!timer.is_armed());
        thread::sleep(Duration::from_millis(120));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_timer_arm_replaces_pending_firing() {
        let (tx, rx) = mpsc::channel();
        let timer = BlinkTimer::new("test-replace", move || {
            tx.send(Instant::now()).ok();
            None
        })
        .unwrap();

        timer.arm(Duration::from_millis(20));
        let rearmed_at = Instant::now();
        timer.arm(Duration::from_millis(150));

        let fired_at = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(fired_at.duration_since(rearmed_at) >= Duration::from_millis(150));
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_timer_cancel_waits_for_running_callback() {
        let started = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let (s, f) = (Arc::clone(&started), Arc::clone(&finished));
        let timer = BlinkTimer::new("test-quiesce", move || {
            s.store(true, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(80));
            f.store(true, Ordering::SeqCst);
            Some(Duration::from_millis(1))
        })
        .unwrap();

        timer.arm(Duration::from_millis(1));
        while !started.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(1));
        }
        timer.cancel();
        assert!(finished.load(Ordering::SeqCst));
        // Der Neustart der abgebrochenen Auslösung wurde verworfen
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_timer_drop_joins_worker() {
        let finished = Arc::new(AtomicBool::new(false));
        let f = Arc::clone(&finished);
        let timer = BlinkTimer::new("test-drop", move || {
            thread::sleep(Duration::from_millis(50));
            f.store(true, Ordering::SeqCst);
            None
        })
        .unwrap();

        timer.arm(Duration::from_millis(1));
        thread::sleep(Duration::from_millis(20));
        drop(timer);
        assert!(finished.load(Ordering::SeqCst));
    }
}

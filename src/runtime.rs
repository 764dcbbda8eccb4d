use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum GameEvent {
    Key(KeyEvent),
    Resize,
    /// One countdown second elapsed. Carries the epoch of the ticker that sent it.
    Tick(u64),
}

/// Source of terminal events (keyboard, resize, ticks)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;

    /// Sender feeding this source, handed to tickers.
    fn sender(&self) -> Sender<GameEvent>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<GameEvent>,
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let key_tx = tx.clone();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) => GameEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => GameEvent::Resize,
                Ok(_) => continue,
                Err(_) => break,
            };
            if key_tx.send(evt).is_err() {
                break;
            }
        });

        Self { tx, rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<GameEvent> {
        self.tx.clone()
    }
}

/// Channel-backed event source for tests
pub struct TestEventSource {
    tx: Sender<GameEvent>,
    rx: Receiver<GameEvent>,
}

impl TestEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }
}

impl Default for TestEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<GameEvent> {
        self.tx.clone()
    }
}

/// Runner that hands the application one event at a time
pub struct Runner<E: EventSource> {
    event_source: E,
    poll_interval: Duration,
}

impl<E: EventSource> Runner<E> {
    pub fn new(event_source: E, poll_interval: Duration) -> Self {
        Self {
            event_source,
            poll_interval,
        }
    }

    pub fn source(&self) -> &E {
        &self.event_source
    }

    /// Blocks up to the poll interval; `None` when nothing arrived
    pub fn step(&self) -> Option<GameEvent> {
        match self.event_source.recv_timeout(self.poll_interval) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Periodic tick source driving the countdown.
///
/// `start` replaces any running ticker and bumps the epoch; `stop` cancels it.
/// Ticks carrying an older epoch than [`Ticker::epoch`] are stale.
pub trait Ticker {
    fn start(&mut self, interval: Duration);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
    fn epoch(&self) -> u64;
}

/// Ticker backed by a sleeping thread that posts [`GameEvent::Tick`]
pub struct ThreadTicker {
    tx: Sender<GameEvent>,
    epoch: u64,
    cancel: Option<Arc<AtomicBool>>,
}

impl ThreadTicker {
    pub fn new(tx: Sender<GameEvent>) -> Self {
        Self {
            tx,
            epoch: 0,
            cancel: None,
        }
    }
}

impl Ticker for ThreadTicker {
    fn start(&mut self, interval: Duration) {
        self.stop();
        self.epoch += 1;

        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let tx = self.tx.clone();
        let epoch = self.epoch;

        std::thread::spawn(move || {
            // sleep to a fixed schedule so lateness does not accumulate
            let mut next = Instant::now();
            loop {
                next += interval;
                std::thread::sleep(next.saturating_duration_since(Instant::now()));
                if flag.load(Ordering::SeqCst) || tx.send(GameEvent::Tick(epoch)).is_err() {
                    break;
                }
            }
        });

        self.cancel = Some(cancel);
    }

    fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::SeqCst);
        }
    }

    fn is_running(&self) -> bool {
        self.cancel.is_some()
    }

    fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl Drop for ThreadTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ticker that never fires on its own; tests call `tick()` on the session directly
#[derive(Debug, Default, Clone)]
pub struct ManualTicker {
    running: bool,
    epoch: u64,
    pub starts: usize,
    pub stops: usize,
    pub last_interval: Option<Duration>,
}

impl Ticker for ManualTicker {
    fn start(&mut self, interval: Duration) {
        self.running = true;
        self.epoch += 1;
        self.starts += 1;
        self.last_interval = Some(interval);
    }

    fn stop(&mut self) {
        if self.running {
            self.stops += 1;
        }
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn epoch(&self) -> u64 {
        self.epoch
    }
}

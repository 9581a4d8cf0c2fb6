//! Event loop plumbing: terminal input on a background thread, merged with a
//! reconciliation tick that keeps its own schedule.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Default reconciliation interval. Well under a second so a late tick is
/// absorbed before the displayed second changes.
pub const DEFAULT_TICK: Duration = Duration::from_millis(200);

#[derive(Clone, Debug)]
pub enum HiitEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Anything that can hand over terminal events with a bounded wait
pub trait HiitEventSource: Send + 'static {
    fn recv_timeout(&self, timeout: Duration) -> Result<HiitEvent, RecvTimeoutError>;
}

/// Reads crossterm events on a dedicated thread
pub struct CrosstermEventSource {
    rx: Receiver<HiitEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let ev = match event::read() {
                Ok(CtEvent::Key(key)) => HiitEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => HiitEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "Terminal input closed");
                    break;
                }
            };
            if tx.send(ev).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HiitEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<HiitEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Events fed from a channel the test owns
pub struct TestEventSource {
    rx: Receiver<HiitEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<HiitEvent>) -> Self {
        Self { rx }
    }
}

impl HiitEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<HiitEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Tick schedule anchored to absolute deadlines.
///
/// Input handled between two ticks never pushes the next one back. After a
/// stall the missed ticks collapse into a single one.
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
    next_deadline: Option<Instant>,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// `None` when a tick is due (and consumed), otherwise how long until it is.
    /// The first call arms the schedule one interval after `now`.
    pub fn poll(&mut self, now: Instant) -> Option<Duration> {
        let deadline = *self.next_deadline.get_or_insert(now + self.interval);
        if now < deadline {
            return Some(deadline - now);
        }

        let mut next = deadline + self.interval;
        if next <= now {
            next = now + self.interval;
        }
        self.next_deadline = Some(next);
        None
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(DEFAULT_TICK)
    }
}

/// Merges input with the tick schedule, one event per `step`
pub struct Runner<E: HiitEventSource> {
    event_source: E,
    ticker: FixedTicker,
}

impl<E: HiitEventSource> Runner<E> {
    pub fn new(event_source: E, ticker: FixedTicker) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Next input event, or `Tick` once the deadline has passed even if more
    /// input is waiting.
    pub fn step(&mut self) -> HiitEvent {
        loop {
            let Some(wait) = self.ticker.poll(Instant::now()) else {
                return HiitEvent::Tick;
            };
            match self.event_source.recv_timeout(wait) {
                Ok(ev) => return ev,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => std::thread::sleep(wait),
            }
        }
    }
}

//! Audible/haptic cues and the sinks that play them.

use crate::config::Config;
use crate::error::{CueError, Modality};
use crate::sequencer::Phase;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Abstract notification produced by the session controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Final seconds of a phase; fires once for each of 3, 2, 1
    Warn { seconds_left: u64 },
    /// Entry into a phase, Done included
    Transition { phase: Phase },
}

/// Which outputs the frozen config allows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CueModes {
    pub sound: bool,
    pub vibrate: bool,
}

impl From<&Config> for CueModes {
    fn from(cfg: &Config) -> Self {
        Self {
            sound: cfg.sound_enabled(),
            vibrate: cfg.vibrate_enabled(),
        }
    }
}

pub trait CueEmitter {
    /// Play a cue. Failures are the emitter's problem: it must not panic and
    /// nothing is reported back to the timing core.
    fn emit(&mut self, cue: Cue, modes: CueModes);
}

/// Discards every cue
#[derive(Debug, Default)]
pub struct NullCueEmitter;

impl CueEmitter for NullCueEmitter {
    fn emit(&mut self, _cue: Cue, _modes: CueModes) {}
}

/// Keeps cues for later inspection. Clones share one log, so a handle kept
/// outside the app sees what the boxed emitter received.
#[derive(Debug, Clone, Default)]
pub struct RecordingCueEmitter {
    emitted: Rc<RefCell<Vec<(Cue, CueModes)>>>,
}

impl RecordingCueEmitter {
    pub fn cues(&self) -> Vec<Cue> {
        self.emitted.borrow().iter().map(|(c, _)| *c).collect()
    }

    pub fn emitted(&self) -> Vec<(Cue, CueModes)> {
        self.emitted.borrow().clone()
    }
}

impl CueEmitter for RecordingCueEmitter {
    fn emit(&mut self, cue: Cue, modes: CueModes) {
        self.emitted.borrow_mut().push((cue, modes));
    }
}

const BEL: u8 = 0x07;

/// Rings the terminal bell. Terminals cannot vibrate, so that modality is
/// reported unavailable once and then ignored.
pub struct TerminalCueEmitter<W: Write> {
    out: W,
    vibration_reported: bool,
}

impl<W: Write> TerminalCueEmitter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            vibration_reported: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn bells(cue: Cue) -> usize {
        match cue {
            Cue::Warn { .. } => 1,
            Cue::Transition { phase: Phase::Done } => 3,
            Cue::Transition { .. } => 2,
        }
    }

    fn ring(&mut self, cue: Cue) -> Result<(), CueError> {
        let bells = vec![BEL; Self::bells(cue)];
        self.out.write_all(&bells)?;
        self.out.flush()?;
        Ok(())
    }

    fn vibrate(&mut self, _cue: Cue) -> Result<(), CueError> {
        Err(CueError::Unavailable(Modality::Vibration))
    }
}

impl<W: Write> CueEmitter for TerminalCueEmitter<W> {
    fn emit(&mut self, cue: Cue, modes: CueModes) {
        tracing::debug!(?cue, ?modes, "Cue");

        if modes.sound {
            if let Err(e) = self.ring(cue) {
                tracing::warn!(error = %e, "Sound cue dropped");
            }
        }

        if modes.vibrate {
            match self.vibrate(cue) {
                Ok(()) => {}
                Err(CueError::Unavailable(m)) if self.vibration_reported => {
                    tracing::trace!(modality = %m, "Cue skipped");
                }
                Err(e) => {
                    tracing::info!(error = %e, "Vibration cues disabled");
                    self.vibration_reported = true;
                }
            }
        }
    }
}

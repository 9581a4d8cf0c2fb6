//! Session controller: the only owner of mutable workout state.
//!
//! Remaining time is always derived from an absolute `phase_end_at` and the
//! injected [`Clock`]; ticks merely ask the controller to reconcile, so late or
//! missing ticks never skew the countdown.

use crate::clock::{seconds_until, Clock, Millis, SystemClock};
use crate::config::{Config, ConfigSource};
use crate::cue::{Cue, CueModes};
use crate::error::ConfigValidationError;
use crate::projection::Projection;
use crate::sequencer::{self, Phase, Step};

/// Seconds before a phase ends during which `warn` cues fire
pub const WARN_WINDOW_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum RunState {
    Stopped,
    Running,
    Paused,
}

/// Identifies one activation of the reconciliation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick from a cancelled loop or outside a running session; nothing changed
    Stale,
    /// State reconciled, redraw
    Render,
    /// Entered Done during this tick; the loop is gone
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub phase: Phase,
    pub current_round: u32,
    pub phase_end_at: Millis,
    pub phase_duration_seconds: u32,
    pub run_state: RunState,
    pub paused_remaining_seconds: Option<u64>,
    pub last_warned_second: Option<u64>,
}

impl SessionState {
    pub fn step(&self) -> Step {
        Step {
            phase: self.phase,
            round: self.current_round,
        }
    }

    pub fn remaining_ms(&self, now: Millis) -> Millis {
        match self.run_state {
            RunState::Running => self.phase_end_at.saturating_sub(now).max(0),
            RunState::Paused => self.paused_remaining_seconds.unwrap_or(0) as Millis * 1000,
            RunState::Stopped => 0,
        }
    }

    pub fn remaining_seconds(&self, now: Millis) -> u64 {
        match self.run_state {
            RunState::Running => seconds_until(self.phase_end_at, now),
            RunState::Paused => self.paused_remaining_seconds.unwrap_or(0),
            RunState::Stopped => 0,
        }
    }
}

pub struct SessionController<C: Clock = SystemClock> {
    clock: C,
    config: Option<Config>,
    state: Option<SessionState>,
    active_loop: Option<LoopToken>,
    loops_started: u64,
    cues: Vec<Cue>,
}

impl Default for SessionController<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> SessionController<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            config: None,
            state: None,
            active_loop: None,
            loops_started: 0,
            cues: Vec::new(),
        }
    }

    /// Frozen snapshot of the running workout, if any
    pub fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    pub fn run_state(&self) -> RunState {
        self.state
            .as_ref()
            .map_or(RunState::Stopped, |s| s.run_state)
    }

    pub fn phase(&self) -> Phase {
        self.state.as_ref().map_or(Phase::Idle, |s| s.phase)
    }

    /// True while Running or Paused; the config cannot change then
    pub fn is_active(&self) -> bool {
        self.run_state() != RunState::Stopped
    }

    pub fn loop_token(&self) -> Option<LoopToken> {
        self.active_loop
    }

    pub fn cue_modes(&self) -> CueModes {
        self.config.as_ref().map(CueModes::from).unwrap_or_default()
    }

    /// Drain queued cues in the order they were produced
    pub fn take_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    pub fn projection(&self) -> Projection {
        Projection::build(
            self.state.as_ref(),
            self.config.as_ref(),
            self.clock.now_ms(),
        )
    }

    /// Validate `source`, freeze it and enter the first phase.
    ///
    /// Nothing is touched when validation fails. Starting over a finished
    /// session replaces it; starting while Running or Paused does nothing.
    pub fn start<S: ConfigSource + ?Sized>(&mut self, source: &S) -> Result<(), ConfigValidationError> {
        if self.is_active() {
            tracing::debug!(run_state = %self.run_state(), "start ignored");
            return Ok(());
        }

        let config = source.snapshot().map_err(|e| {
            tracing::info!(fields = ?e.fields(), "Rejected workout settings");
            e
        })?;

        let now = self.clock.now_ms();
        tracing::info!(
            rounds = config.total_rounds(),
            total_secs = sequencer::total_duration_secs(&config),
            "Workout started"
        );

        let mut state = SessionState {
            phase: Phase::Idle,
            current_round: 0,
            phase_end_at: now,
            phase_duration_seconds: 0,
            run_state: RunState::Running,
            paused_remaining_seconds: None,
            last_warned_second: None,
        };
        let first = sequencer::advance(state.step(), &config);
        enter_phase(&mut state, first, now, &config, &mut self.cues);

        self.config = Some(config);
        self.state = Some(state);
        self.activate_loop();
        Ok(())
    }

    /// Freeze the countdown. Phases that already elapsed on the wall clock
    /// are entered first, so the snapshot belongs to the phase in progress.
    pub fn pause(&mut self) {
        let now = self.clock.now_ms();
        let (Some(state), Some(config)) = (self.state.as_mut(), self.config.as_ref()) else {
            return;
        };
        if state.run_state != RunState::Running {
            return;
        }

        self.active_loop = None;
        if catch_up(state, config, now, &mut self.cues) {
            return;
        }
        let remaining = seconds_until(state.phase_end_at, now);
        state.paused_remaining_seconds = Some(remaining);
        state.run_state = RunState::Paused;
        tracing::info!(phase = %state.phase, remaining, "Paused");
    }

    pub fn resume(&mut self) {
        let now = self.clock.now_ms();
        let Some(state) = self.state.as_mut().filter(|s| s.run_state == RunState::Paused) else {
            return;
        };

        let remaining = state.paused_remaining_seconds.take().unwrap_or(0);
        state.phase_end_at = now + remaining as Millis * 1000;
        state.run_state = RunState::Running;
        tracing::info!(phase = %state.phase, remaining, "Resumed");
        self.activate_loop();
    }

    pub fn toggle_pause(&mut self) {
        match self.run_state() {
            RunState::Running => self.pause(),
            RunState::Paused => self.resume(),
            RunState::Stopped => {}
        }
    }

    /// Drop the session and the frozen config
    pub fn reset(&mut self) {
        self.active_loop = None;
        self.config = None;
        if let Some(state) = self.state.take() {
            tracing::info!(phase = %state.phase, round = state.current_round, "Session reset");
        }
    }

    /// Reconcile against the clock: catch up on elapsed phases, then warn if
    /// the phase in progress is in its final seconds.
    pub fn tick(&mut self, token: LoopToken) -> TickOutcome {
        if self.active_loop != Some(token) {
            tracing::trace!(?token, "stale tick");
            return TickOutcome::Stale;
        }
        let (Some(state), Some(config)) = (self.state.as_mut(), self.config.as_ref()) else {
            return TickOutcome::Stale;
        };
        if state.run_state != RunState::Running {
            return TickOutcome::Stale;
        }

        let now = self.clock.now_ms();
        if catch_up(state, config, now, &mut self.cues) {
            self.active_loop = None;
            return TickOutcome::Finished;
        }

        let remaining = seconds_until(state.phase_end_at, now);
        if (1..=WARN_WINDOW_SECS).contains(&remaining)
            && state.last_warned_second != Some(remaining)
        {
            state.last_warned_second = Some(remaining);
            self.cues.push(Cue::Warn {
                seconds_left: remaining,
            });
        }

        TickOutcome::Render
    }

    /// Tick the currently active loop, if there is one
    pub fn on_tick(&mut self) -> TickOutcome {
        match self.active_loop {
            Some(token) => self.tick(token),
            None => TickOutcome::Stale,
        }
    }

    fn activate_loop(&mut self) -> LoopToken {
        self.loops_started += 1;
        let token = LoopToken(self.loops_started);
        self.active_loop = Some(token);
        token
    }
}

/// Enter every phase whose end has passed by `now`, chaining each one from
/// the previous boundary. Returns true once Done has been entered.
fn catch_up(state: &mut SessionState, config: &Config, now: Millis, cues: &mut Vec<Cue>) -> bool {
    while seconds_until(state.phase_end_at, now) == 0 {
        let next = sequencer::advance(state.step(), config);
        let boundary = state.phase_end_at;
        enter_phase(state, next, boundary, config, cues);
        if next.phase.is_terminal() {
            return true;
        }
    }
    false
}

fn enter_phase(
    state: &mut SessionState,
    step: Step,
    starts_at: Millis,
    config: &Config,
    cues: &mut Vec<Cue>,
) {
    let duration = sequencer::duration_secs(step.phase, config);
    state.phase = step.phase;
    state.current_round = step.round;
    state.phase_duration_seconds = duration;
    state.phase_end_at = starts_at + Millis::from(duration) * 1000;
    state.last_warned_second = None;
    cues.push(Cue::Transition { phase: step.phase });

    if step.phase.is_terminal() {
        state.run_state = RunState::Stopped;
        tracing::info!(rounds = step.round, "Workout complete");
    } else {
        tracing::debug!(phase = %step.phase, round = step.round, duration, "Entered phase");
    }
}

//! Phase ordering of a workout.
//!
//! Everything here is a pure function of `(phase, round, config)`. Timing lives
//! in the session controller; this module only answers "what comes next".

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Phase {
    #[strum(serialize = "Ready")]
    Idle,
    #[strum(serialize = "Warm-up")]
    Warmup,
    #[strum(serialize = "Work")]
    Work,
    #[strum(serialize = "Rest")]
    Rest1,
    #[strum(serialize = "Long rest")]
    Rest2,
    #[strum(serialize = "Cool-down")]
    Cooldown,
    #[strum(serialize = "Done")]
    Done,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        self == Phase::Done
    }
}

/// Result of one sequencing decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub phase: Phase,
    pub increments_round: bool,
}

impl Transition {
    fn to(phase: Phase) -> Self {
        Self {
            phase,
            // rounds are counted on the way into Work, never on the way out
            increments_round: phase == Phase::Work,
        }
    }
}

/// A position in the workout: phase plus the round it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub phase: Phase,
    pub round: u32,
}

impl Step {
    pub const IDLE: Step = Step {
        phase: Phase::Idle,
        round: 0,
    };
}

pub fn next_phase(phase: Phase, round: u32, config: &Config) -> Transition {
    match phase {
        Phase::Idle => {
            if config.warmup_seconds() > 0 {
                Transition::to(Phase::Warmup)
            } else {
                Transition::to(Phase::Work)
            }
        }
        Phase::Warmup | Phase::Rest1 | Phase::Rest2 => Transition::to(Phase::Work),
        Phase::Work if round >= config.total_rounds() => {
            if config.cooldown_seconds() > 0 {
                Transition::to(Phase::Cooldown)
            } else {
                Transition::to(Phase::Done)
            }
        }
        Phase::Work => Transition::to(rest_after(round, config)),
        Phase::Cooldown | Phase::Done => Transition::to(Phase::Done),
    }
}

// Long rest wins over the regular one when both apply
fn rest_after(round: u32, config: &Config) -> Phase {
    let every = config.rest2_every_n_rounds();
    if config.rest2_seconds() > 0 && every > 0 && round % every == 0 {
        Phase::Rest2
    } else if config.rest1_seconds() > 0 {
        Phase::Rest1
    } else {
        Phase::Work
    }
}

pub fn advance(step: Step, config: &Config) -> Step {
    let t = next_phase(step.phase, step.round, config);
    Step {
        phase: t.phase,
        round: if t.increments_round {
            step.round + 1
        } else {
            step.round
        },
    }
}

/// Configured length of a phase; Idle and Done take no time
pub fn duration_secs(phase: Phase, config: &Config) -> u32 {
    match phase {
        Phase::Idle | Phase::Done => 0,
        Phase::Warmup => config.warmup_seconds(),
        Phase::Work => config.work_seconds(),
        Phase::Rest1 => config.rest1_seconds(),
        Phase::Rest2 => config.rest2_seconds(),
        Phase::Cooldown => config.cooldown_seconds(),
    }
}

/// One phase entry of a planned run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub step: Step,
    pub duration_secs: u32,
}

/// Every phase entry from `from` (exclusive) through Done (inclusive)
pub struct Timeline<'a> {
    config: &'a Config,
    current: Option<Step>,
}

impl Iterator for Timeline<'_> {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        let step = self.current?;
        if step.phase.is_terminal() {
            self.current = None;
            return None;
        }
        let next = advance(step, self.config);
        self.current = Some(next);
        Some(Entry {
            step: next,
            duration_secs: duration_secs(next.phase, self.config),
        })
    }
}

pub fn timeline_from(step: Step, config: &Config) -> Timeline<'_> {
    Timeline {
        config,
        current: Some(step),
    }
}

/// The whole run as the sequencer will play it
pub fn timeline(config: &Config) -> Timeline<'_> {
    timeline_from(Step::IDLE, config)
}

pub fn total_duration_secs(config: &Config) -> u64 {
    timeline(config).map(|e| u64::from(e.duration_secs)).sum()
}

/// Seconds of every phase still to come after `step`
pub fn remaining_after(step: Step, config: &Config) -> u64 {
    timeline_from(step, config)
        .map(|e| u64::from(e.duration_secs))
        .sum()
}

use crate::clock::Millis;
use crate::config::Config;
use crate::sequencer::{self, Phase};
use crate::session::{RunState, SessionState};

/// Read-only view of a session, rebuilt on every call
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub phase: Phase,
    pub phase_label: String,
    pub current_round: u32,
    pub total_rounds: u32,
    pub remaining_seconds: u64,
    /// `remaining_seconds` as mm:ss
    pub remaining: String,
    /// Elapsed share of the current phase, 0.0..=1.0
    pub progress_fraction: f64,
    pub next_phase_description: String,
    /// Current phase plus everything after it, as mm:ss
    pub workout_remaining: String,
    pub run_state: RunState,
}

impl Projection {
    pub fn build(state: Option<&SessionState>, config: Option<&Config>, now: Millis) -> Self {
        match (state, config) {
            (Some(state), Some(config)) => Self::from_session(state, config, now),
            _ => Self::idle(),
        }
    }

    fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            phase_label: Phase::Idle.to_string(),
            current_round: 0,
            total_rounds: 0,
            remaining_seconds: 0,
            remaining: format_clock(0),
            progress_fraction: 0.0,
            next_phase_description: "Press Enter to start".to_string(),
            workout_remaining: format_clock(0),
            run_state: RunState::Stopped,
        }
    }

    fn from_session(state: &SessionState, config: &Config, now: Millis) -> Self {
        let remaining_seconds = state.remaining_seconds(now);
        let duration_ms = Millis::from(state.phase_duration_seconds) * 1000;
        let progress_fraction = if state.phase.is_terminal() {
            1.0
        } else if duration_ms == 0 {
            0.0
        } else {
            let left = state.remaining_ms(now).min(duration_ms);
            ((duration_ms - left) as f64 / duration_ms as f64).clamp(0.0, 1.0)
        };
        let workout_left = remaining_seconds + sequencer::remaining_after(state.step(), config);

        Self {
            phase: state.phase,
            phase_label: state.phase.to_string(),
            current_round: state.current_round,
            total_rounds: config.total_rounds(),
            remaining_seconds,
            remaining: format_clock(remaining_seconds),
            progress_fraction,
            next_phase_description: describe_next(state, config),
            workout_remaining: format_clock(workout_left),
            run_state: state.run_state,
        }
    }
}

fn describe_next(state: &SessionState, config: &Config) -> String {
    if state.phase.is_terminal() {
        return "Workout complete".to_string();
    }
    let next = sequencer::advance(state.step(), config);
    match next.phase {
        Phase::Done => "Next: Done".to_string(),
        Phase::Work => format!(
            "Next: Work · round {}/{}",
            next.round,
            config.total_rounds()
        ),
        phase => format!(
            "Next: {} {}",
            phase,
            format_clock(sequencer::duration_secs(phase, config).into())
        ),
    }
}

/// mm:ss; minutes keep growing past 99
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigDraft;

    fn cfg() -> Config {
        Config::new(ConfigDraft {
            warmup_seconds: 10,
            total_rounds: 4,
            work_seconds: 20,
            rest1_seconds: 10,
            rest2_seconds: 30,
            rest2_every_n_rounds: 2,
            cooldown_seconds: 15,
            ..ConfigDraft::default()
        })
        .unwrap()
    }

    fn state(phase: Phase, round: u32, duration: u32, end: Millis) -> SessionState {
        SessionState {
            phase,
            current_round: round,
            phase_end_at: end,
            phase_duration_seconds: duration,
            run_state: RunState::Running,
            paused_remaining_seconds: None,
            last_warned_second: None,
        }
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(6_000), "100:00");
    }

    #[test]
    fn idle_projection() {
        let p = Projection::build(None, None, 0);
        assert_eq!(p.phase_label, "Ready");
        assert_eq!(p.run_state, RunState::Stopped);
        assert_eq!(p.remaining, "00:00");
    }

    #[test]
    fn halfway_through_work() {
        let config = cfg();
        let s = state(Phase::Work, 2, 20, 10_000);
        let p = Projection::build(Some(&s), Some(&config), 0);

        assert_eq!(p.phase_label, "Work");
        assert_eq!(p.current_round, 2);
        assert_eq!(p.total_rounds, 4);
        assert_eq!(p.remaining, "00:10");
        assert!((p.progress_fraction - 0.5).abs() < 1e-9);
        assert_eq!(p.next_phase_description, "Next: Long rest 00:30");
        // 10 left + rest2 30 + work 20 + rest1 10 + work 20 + cooldown 15
        assert_eq!(p.workout_remaining, format_clock(105));
    }

    #[test]
    fn rest_announces_next_round() {
        let config = cfg();
        let s = state(Phase::Rest1, 1, 10, 4_000);
        let p = Projection::build(Some(&s), Some(&config), 0);
        assert_eq!(p.next_phase_description, "Next: Work · round 2/4");
    }

    #[test]
    fn paused_progress_uses_snapshot() {
        let config = cfg();
        let mut s = state(Phase::Warmup, 0, 10, 0);
        s.run_state = RunState::Paused;
        s.paused_remaining_seconds = Some(4);
        let p = Projection::build(Some(&s), Some(&config), 999_999);
        assert_eq!(p.remaining_seconds, 4);
        assert!((p.progress_fraction - 0.6).abs() < 1e-9);
        assert_eq!(p.run_state, RunState::Paused);
    }

    #[test]
    fn overdue_phase_is_clamped() {
        let config = cfg();
        let s = state(Phase::Cooldown, 4, 15, 1_000);
        let p = Projection::build(Some(&s), Some(&config), 50_000);
        assert_eq!(p.remaining_seconds, 0);
        assert_eq!(p.progress_fraction, 1.0);
        assert_eq!(p.next_phase_description, "Next: Done");
    }

    #[test]
    fn done_is_complete() {
        let config = cfg();
        let mut s = state(Phase::Done, 4, 0, 0);
        s.run_state = RunState::Stopped;
        let p = Projection::build(Some(&s), Some(&config), 0);
        assert_eq!(p.progress_fraction, 1.0);
        assert_eq!(p.next_phase_description, "Workout complete");
        assert_eq!(p.workout_remaining, "00:00");
    }
}

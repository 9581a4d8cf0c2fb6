use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigStore, RawConfig};
use crate::cue::CueEmitter;
use crate::error::ConfigValidationError;
use crate::form::SettingsForm;
use crate::projection::Projection;
use crate::session::{RunState, SessionController, TickOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// No session: the settings form is shown and editable
    Settings,
    /// Running, paused or finished session
    Timer,
}

/// Terminal application: settings form, session controller, cue output and
/// settings persistence wired together.
pub struct App<C: Clock = SystemClock> {
    pub form: SettingsForm,
    controller: SessionController<C>,
    emitter: Box<dyn CueEmitter>,
    store: Box<dyn ConfigStore>,
    should_quit: bool,
}

impl<C: Clock> App<C> {
    pub fn new(
        raw: RawConfig,
        clock: C,
        emitter: Box<dyn CueEmitter>,
        store: Box<dyn ConfigStore>,
    ) -> Self {
        Self {
            form: SettingsForm::new(raw),
            controller: SessionController::new(clock),
            emitter,
            store,
            should_quit: false,
        }
    }

    pub fn state(&self) -> AppState {
        if self.controller.state().is_some() {
            AppState::Timer
        } else {
            AppState::Settings
        }
    }

    pub fn controller(&self) -> &SessionController<C> {
        &self.controller
    }

    pub fn projection(&self) -> Projection {
        self.controller.projection()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Start a run from the current form contents
    pub fn start(&mut self) -> Result<(), ConfigValidationError> {
        let config = self.form.validate()?;
        self.controller.start(&config)?;
        self.flush_cues();
        Ok(())
    }

    /// Pausing may first enter phases that elapsed without a tick
    pub fn toggle_pause(&mut self) {
        self.controller.toggle_pause();
        self.flush_cues();
    }

    pub fn reset(&mut self) {
        self.controller.reset();
    }

    /// One reconciliation step of the running session
    pub fn on_tick(&mut self) -> TickOutcome {
        let outcome = self.controller.on_tick();
        self.flush_cues();
        outcome
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
            self.should_quit = true;
            return;
        }

        match self.state() {
            AppState::Settings => self.on_settings_key(key),
            AppState::Timer => self.on_timer_key(key),
        }
        self.persist();
    }

    fn on_settings_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.form.select_prev(),
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => self.form.select_next(),
            KeyCode::Char(c) if c.is_ascii_digit() => self.form.push_digit(c),
            KeyCode::Backspace => self.form.backspace(),
            KeyCode::Char(' ') => self.form.toggle(),
            KeyCode::Enter | KeyCode::Char('s') => {
                // rejected settings are shown on the form
                let _ = self.start();
            }
            _ => {}
        }
    }

    fn on_timer_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(' ') | KeyCode::Char('p') => self.toggle_pause(),
            KeyCode::Char('r') => self.reset(),
            _ => {}
        }
    }

    fn flush_cues(&mut self) {
        let modes = self.controller.cue_modes();
        for cue in self.controller.take_cues() {
            self.emitter.emit(cue, modes);
        }
    }

    /// Save the form if it changed and no run holds the config frozen
    fn persist(&mut self) {
        if self.controller.run_state() != RunState::Stopped {
            return;
        }
        if self.form.take_dirty() {
            if let Err(e) = self.store.save(self.form.raw()) {
                tracing::warn!(error = %e, "Could not save settings");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::MemoryConfigStore;
    use crate::cue::{Cue, NullCueEmitter, RecordingCueEmitter};
    use crate::error::Field;
    use crate::sequencer::Phase;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(raw: RawConfig) -> (App<ManualClock>, ManualClock, MemoryConfigStore) {
        let clock = ManualClock::new(0);
        let store = MemoryConfigStore::new();
        let app = App::new(
            raw,
            clock.clone(),
            Box::new(NullCueEmitter),
            Box::new(store.clone()),
        );
        (app, clock, store)
    }

    #[test]
    fn enter_starts_and_r_resets() {
        let (mut app, _clock, _store) = app(RawConfig::default());
        assert_eq!(app.state(), AppState::Settings);

        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.state(), AppState::Timer);
        assert_eq!(app.controller().run_state(), RunState::Running);

        app.on_key(key(KeyCode::Char('r')));
        assert_eq!(app.state(), AppState::Settings);
    }

    #[test]
    fn invalid_form_stays_on_settings_with_errors() {
        let (mut app, _clock, _store) = app(RawConfig {
            total_rounds: "0".into(),
            ..RawConfig::default()
        });
        app.on_key(key(KeyCode::Char('s')));
        assert_eq!(app.state(), AppState::Settings);
        assert_eq!(app.form.errors().len(), 1);
        assert_eq!(app.form.errors()[0].field(), Field::TotalRounds);
    }

    #[test]
    fn space_and_p_toggle_pause() {
        let (mut app, _clock, _store) = app(RawConfig::default());
        app.on_key(key(KeyCode::Enter));
        app.on_key(key(KeyCode::Char(' ')));
        assert_eq!(app.controller().run_state(), RunState::Paused);
        app.on_key(key(KeyCode::Char('p')));
        assert_eq!(app.controller().run_state(), RunState::Running);
    }

    #[test]
    fn edits_are_saved_only_while_stopped() {
        let (mut app, _clock, store) = app(RawConfig::default());
        app.on_key(key(KeyCode::Down));
        app.on_key(key(KeyCode::Backspace));
        app.on_key(key(KeyCode::Char('5')));
        assert_eq!(store.saved().map(|r| r.total_rounds), Some("5".to_string()));

        app.on_key(key(KeyCode::Enter));
        // frozen while running: digits no longer reach the form
        app.on_key(key(KeyCode::Char('9')));
        assert_eq!(app.form.raw().total_rounds, "5");
        assert_eq!(app.controller().config().map(|c| c.total_rounds()), Some(5));
    }

    #[test]
    fn quit_keys() {
        for code in [KeyCode::Esc, KeyCode::Char('q')] {
            let (mut app, _clock, _store) = app(RawConfig::default());
            app.on_key(key(code));
            assert!(app.should_quit());
        }
        let (mut app, _clock, _store) = app(RawConfig::default());
        app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit());
    }

    #[test]
    fn ticks_drive_the_session_to_done() {
        let clock = ManualClock::new(0);
        let cues = RecordingCueEmitter::default();
        let mut app = App::new(
            RawConfig {
                warmup_seconds: "0".into(),
                total_rounds: "1".into(),
                work_seconds: "3".into(),
                ..RawConfig::default()
            },
            clock.clone(),
            Box::new(cues.clone()),
            Box::new(MemoryConfigStore::new()),
        );

        app.start().unwrap();
        clock.advance_ms(3_000);
        assert_eq!(app.on_tick(), TickOutcome::Finished);
        assert_eq!(app.projection().phase, Phase::Done);
        assert_eq!(app.state(), AppState::Timer);
        assert_eq!(
            cues.cues(),
            vec![
                Cue::Transition { phase: Phase::Work },
                Cue::Transition { phase: Phase::Done }
            ]
        );
        assert_eq!(app.on_tick(), TickOutcome::Stale);
    }

    #[test]
    fn pausing_after_a_stall_plays_the_missed_cues() {
        let clock = ManualClock::new(0);
        let cues = RecordingCueEmitter::default();
        let mut app = App::new(
            RawConfig {
                warmup_seconds: "0".into(),
                total_rounds: "2".into(),
                work_seconds: "5".into(),
                rest1_seconds: "3".into(),
                ..RawConfig::default()
            },
            clock.clone(),
            Box::new(cues.clone()),
            Box::new(MemoryConfigStore::new()),
        );

        app.on_key(key(KeyCode::Enter));
        clock.advance_ms(6_000);
        app.on_key(key(KeyCode::Char(' ')));

        let p = app.projection();
        assert_eq!((p.phase, p.run_state), (Phase::Rest1, RunState::Paused));
        assert_eq!(p.remaining, "00:02");
        assert_eq!(
            cues.cues(),
            vec![
                Cue::Transition { phase: Phase::Work },
                Cue::Transition {
                    phase: Phase::Rest1
                }
            ]
        );
    }
}

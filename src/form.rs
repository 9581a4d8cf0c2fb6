use crate::config::{Config, RawConfig};
use crate::error::{ConfigValidationError, Field, FieldError};

/// Longest value a numeric row accepts; enough for every valid setting
const MAX_DIGITS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormRow {
    Number(Field),
    Sound,
    Vibrate,
}

impl FormRow {
    pub const ALL: [FormRow; 9] = [
        FormRow::Number(Field::WarmupSeconds),
        FormRow::Number(Field::TotalRounds),
        FormRow::Number(Field::WorkSeconds),
        FormRow::Number(Field::Rest1Seconds),
        FormRow::Number(Field::Rest2Seconds),
        FormRow::Number(Field::Rest2EveryNRounds),
        FormRow::Number(Field::CooldownSeconds),
        FormRow::Sound,
        FormRow::Vibrate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormRow::Number(Field::WarmupSeconds) => "Warm-up (s)",
            FormRow::Number(Field::TotalRounds) => "Rounds",
            FormRow::Number(Field::WorkSeconds) => "Work (s)",
            FormRow::Number(Field::Rest1Seconds) => "Rest (s)",
            FormRow::Number(Field::Rest2Seconds) => "Long rest (s)",
            FormRow::Number(Field::Rest2EveryNRounds) => "Long rest every N rounds",
            FormRow::Number(Field::CooldownSeconds) => "Cool-down (s)",
            FormRow::Sound => "Sound",
            FormRow::Vibrate => "Vibrate",
        }
    }
}

/// Keyboard-editable settings. Holds raw text so a half-typed value is kept
/// as-is until the next start attempt validates it.
#[derive(Debug, Clone)]
pub struct SettingsForm {
    raw: RawConfig,
    selected: usize,
    errors: Vec<FieldError>,
    dirty: bool,
}

impl SettingsForm {
    pub fn new(raw: RawConfig) -> Self {
        Self {
            raw,
            selected: 0,
            errors: Vec::new(),
            dirty: false,
        }
    }

    pub fn raw(&self) -> &RawConfig {
        &self.raw
    }

    pub fn selected(&self) -> FormRow {
        FormRow::ALL[self.selected]
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % FormRow::ALL.len();
    }

    pub fn select_prev(&mut self) {
        self.selected = (self.selected + FormRow::ALL.len() - 1) % FormRow::ALL.len();
    }

    pub fn push_digit(&mut self, c: char) {
        let FormRow::Number(field) = self.selected() else {
            return;
        };
        if !c.is_ascii_digit() {
            return;
        }
        let value = self.raw.value_mut(field);
        if value.trim() == "0" {
            value.clear();
        }
        if value.len() < MAX_DIGITS {
            value.push(c);
            self.touch(field);
        }
    }

    pub fn backspace(&mut self) {
        if let FormRow::Number(field) = self.selected() {
            if self.raw.value_mut(field).pop().is_some() {
                self.touch(field);
            }
        }
    }

    /// Flip the selected checkbox; numeric rows ignore it
    pub fn toggle(&mut self) {
        match self.selected() {
            FormRow::Sound => self.raw.sound_enabled = !self.raw.sound_enabled,
            FormRow::Vibrate => self.raw.vibrate_enabled = !self.raw.vibrate_enabled,
            FormRow::Number(_) => return,
        }
        self.dirty = true;
    }

    pub fn display_value(&self, row: FormRow) -> String {
        let on_off = |b: bool| String::from(if b { "on" } else { "off" });
        match row {
            FormRow::Number(field) => self.raw.value(field).to_string(),
            FormRow::Sound => on_off(self.raw.sound_enabled),
            FormRow::Vibrate => on_off(self.raw.vibrate_enabled),
        }
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn error_for(&self, row: FormRow) -> Option<&FieldError> {
        match row {
            FormRow::Number(field) => self.errors.iter().find(|e| e.field() == field),
            _ => None,
        }
    }

    /// Parse the form, remembering the outcome for display
    pub fn validate(&mut self) -> Result<Config, ConfigValidationError> {
        let result = self.raw.parse();
        match &result {
            Ok(_) => self.errors.clear(),
            Err(e) => self.errors = e.errors.clone(),
        }
        result
    }

    /// Whether anything changed since the last call
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn touch(&mut self, field: Field) {
        self.dirty = true;
        // stale message for a field the user is fixing
        self.errors.retain(|e| e.field() != field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(form: &mut SettingsForm, row: FormRow) {
        while form.selected() != row {
            form.select_next();
        }
    }

    #[test]
    fn selection_wraps() {
        let mut form = SettingsForm::new(RawConfig::default());
        form.select_prev();
        assert_eq!(form.selected(), FormRow::Vibrate);
        form.select_next();
        assert_eq!(form.selected(), FormRow::Number(Field::WarmupSeconds));
    }

    #[test]
    fn typing_replaces_lone_zero_and_marks_dirty() {
        let mut form = SettingsForm::new(RawConfig::default());
        select(&mut form, FormRow::Number(Field::CooldownSeconds));
        assert!(!form.take_dirty());

        form.push_digit('4');
        form.push_digit('5');
        assert_eq!(form.raw().cooldown_seconds, "45");
        assert!(form.take_dirty());
        assert!(!form.take_dirty());
    }

    #[test]
    fn non_digits_and_overlong_values_are_ignored() {
        let mut form = SettingsForm::new(RawConfig::default());
        select(&mut form, FormRow::Number(Field::WorkSeconds));
        form.push_digit('x');
        for _ in 0..10 {
            form.push_digit('9');
        }
        assert_eq!(form.raw().work_seconds.len(), MAX_DIGITS);
        assert!(form.raw().work_seconds.starts_with("20"));
    }

    #[test]
    fn backspace_can_empty_a_field() {
        let mut form = SettingsForm::new(RawConfig::default());
        select(&mut form, FormRow::Number(Field::TotalRounds));
        form.backspace();
        form.backspace();
        form.backspace();
        assert_eq!(form.raw().total_rounds, "");
    }

    #[test]
    fn toggle_only_affects_checkboxes() {
        let mut form = SettingsForm::new(RawConfig::default());
        form.toggle();
        assert!(!form.take_dirty());

        select(&mut form, FormRow::Sound);
        form.toggle();
        assert!(!form.raw().sound_enabled);
        assert_eq!(form.display_value(FormRow::Sound), "off");
        assert!(form.take_dirty());
    }

    #[test]
    fn errors_attach_to_rows_and_clear_on_edit() {
        let mut form = SettingsForm::new(RawConfig {
            total_rounds: "0".into(),
            ..RawConfig::default()
        });
        assert!(form.validate().is_err());
        let rounds = FormRow::Number(Field::TotalRounds);
        assert!(form.error_for(rounds).is_some());
        assert!(form.error_for(FormRow::Sound).is_none());

        select(&mut form, rounds);
        form.push_digit('3');
        assert!(form.error_for(rounds).is_none());
        assert!(form.validate().is_ok());
        assert!(form.errors().is_empty());
    }
}

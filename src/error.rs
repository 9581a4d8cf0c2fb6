//! Error types for configuration, persistence and cue output

use std::path::PathBuf;
use thiserror::Error;

/// Numeric workout settings that can fail validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Field {
    #[strum(serialize = "warmup")]
    WarmupSeconds,
    #[strum(serialize = "rounds")]
    TotalRounds,
    #[strum(serialize = "work")]
    WorkSeconds,
    #[strum(serialize = "rest1")]
    Rest1Seconds,
    #[strum(serialize = "rest2")]
    Rest2Seconds,
    #[strum(serialize = "rest2Every")]
    Rest2EveryNRounds,
    #[strum(serialize = "cooldown")]
    CooldownSeconds,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::WarmupSeconds,
        Field::TotalRounds,
        Field::WorkSeconds,
        Field::Rest1Seconds,
        Field::Rest2Seconds,
        Field::Rest2EveryNRounds,
        Field::CooldownSeconds,
    ];
}

/// A single out-of-range or unparseable field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{field} must be a whole number (got {value:?})")]
    NotANumber { field: Field, value: String },

    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: Field,
        value: i64,
        min: i64,
        max: i64,
    },
}

impl FieldError {
    pub fn field(&self) -> Field {
        match self {
            FieldError::NotANumber { field, .. } | FieldError::OutOfRange { field, .. } => *field,
        }
    }
}

/// Raised by `start()` when the workout settings are not usable.
///
/// Holds every failing field, not just the first, so the form can mark all
/// of them at once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid workout configuration: {}", join_errors(.errors))]
pub struct ConfigValidationError {
    pub errors: Vec<FieldError>,
}

impl ConfigValidationError {
    pub fn fields(&self) -> Vec<Field> {
        self.errors.iter().map(FieldError::field).collect()
    }

    pub fn error_for(&self, field: Field) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field() == field)
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Cue output with no terminal equivalent
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Modality {
    #[strum(serialize = "vibration")]
    Vibration,
}

/// Cue output failures. Never fatal to a running session.
#[derive(Debug, Error)]
pub enum CueError {
    #[error("{0} output is unavailable in this environment")]
    Unavailable(Modality),

    #[error("failed to write cue")]
    Io(#[from] std::io::Error),
}

/// Errors while loading or saving the stored settings form
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read settings file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings JSON in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize settings")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write settings file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_match_form_keys() {
        assert_eq!(Field::TotalRounds.to_string(), "rounds");
        assert_eq!(Field::Rest2EveryNRounds.to_string(), "rest2Every");
    }

    #[test]
    fn validation_error_names_every_field() {
        let err = ConfigValidationError {
            errors: vec![
                FieldError::OutOfRange {
                    field: Field::TotalRounds,
                    value: 0,
                    min: 1,
                    max: 999,
                },
                FieldError::NotANumber {
                    field: Field::WorkSeconds,
                    value: "abc".into(),
                },
            ],
        };

        let msg = err.to_string();
        assert!(msg.contains("rounds must be between 1 and 999 (got 0)"));
        assert!(msg.contains("work must be a whole number"));
        assert_eq!(err.fields(), vec![Field::TotalRounds, Field::WorkSeconds]);
        assert!(err.error_for(Field::CooldownSeconds).is_none());
    }

    #[test]
    fn unavailable_cue_names_the_modality() {
        let err = CueError::Unavailable(Modality::Vibration);
        assert_eq!(
            err.to_string(),
            "vibration output is unavailable in this environment"
        );
    }
}

use crate::app_dirs::AppDirs;
use crate::error::{ConfigValidationError, Field, FieldError, StoreError};
use serde::{Deserialize, Deserializer, Serialize};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Fixed namespace of the persisted settings record
pub const CONFIG_NAMESPACE: &str = "hiit_config_v1";

pub const MAX_SECONDS: i64 = 24 * 60 * 60;
pub const MAX_COUNT: i64 = 999;

/// Settings exactly as the form holds them: numbers are still text.
///
/// This is also the persisted record, so a half-typed value survives a restart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct RawConfig {
    #[serde(deserialize_with = "string_or_number")]
    pub warmup_seconds: String,
    #[serde(deserialize_with = "string_or_number")]
    pub total_rounds: String,
    #[serde(deserialize_with = "string_or_number")]
    pub work_seconds: String,
    #[serde(deserialize_with = "string_or_number")]
    pub rest1_seconds: String,
    #[serde(deserialize_with = "string_or_number")]
    pub rest2_seconds: String,
    #[serde(deserialize_with = "string_or_number")]
    pub rest2_every_n_rounds: String,
    #[serde(deserialize_with = "string_or_number")]
    pub cooldown_seconds: String,
    pub sound_enabled: bool,
    pub vibrate_enabled: bool,
}

impl Default for RawConfig {
    fn default() -> Self {
        RawConfig::from(&ConfigDraft::default())
    }
}

impl RawConfig {
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::WarmupSeconds => &self.warmup_seconds,
            Field::TotalRounds => &self.total_rounds,
            Field::WorkSeconds => &self.work_seconds,
            Field::Rest1Seconds => &self.rest1_seconds,
            Field::Rest2Seconds => &self.rest2_seconds,
            Field::Rest2EveryNRounds => &self.rest2_every_n_rounds,
            Field::CooldownSeconds => &self.cooldown_seconds,
        }
    }

    pub fn value_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::WarmupSeconds => &mut self.warmup_seconds,
            Field::TotalRounds => &mut self.total_rounds,
            Field::WorkSeconds => &mut self.work_seconds,
            Field::Rest1Seconds => &mut self.rest1_seconds,
            Field::Rest2Seconds => &mut self.rest2_seconds,
            Field::Rest2EveryNRounds => &mut self.rest2_every_n_rounds,
            Field::CooldownSeconds => &mut self.cooldown_seconds,
        }
    }

    /// Parse every numeric field and validate the result as a unit.
    pub fn parse(&self) -> Result<Config, ConfigValidationError> {
        let mut errors = Vec::new();
        let mut number = |field: Field| -> i64 {
            let text = self.value(field).trim();
            // blank input counts as zero, like an emptied number box
            if text.is_empty() {
                return 0;
            }
            match text.parse::<i64>() {
                Ok(n) => n,
                Err(_) => {
                    errors.push(FieldError::NotANumber {
                        field,
                        value: text.to_string(),
                    });
                    0
                }
            }
        };

        let draft = ConfigDraft {
            warmup_seconds: number(Field::WarmupSeconds),
            total_rounds: number(Field::TotalRounds),
            work_seconds: number(Field::WorkSeconds),
            rest1_seconds: number(Field::Rest1Seconds),
            rest2_seconds: number(Field::Rest2Seconds),
            rest2_every_n_rounds: number(Field::Rest2EveryNRounds),
            cooldown_seconds: number(Field::CooldownSeconds),
            sound_enabled: self.sound_enabled,
            vibrate_enabled: self.vibrate_enabled,
        };

        // A field that failed to parse is reported once, not again as a range error
        let unparsed: Vec<Field> = errors.iter().map(FieldError::field).collect();
        let range_errors = draft
            .range_errors()
            .into_iter()
            .filter(|e| !unparsed.contains(&e.field()));
        errors.extend(range_errors);

        if errors.is_empty() {
            Ok(Config::from_checked(&draft))
        } else {
            errors.sort_by_key(|e| Field::ALL.iter().position(|f| *f == e.field()));
            Err(ConfigValidationError { errors })
        }
    }
}

impl From<&ConfigDraft> for RawConfig {
    fn from(d: &ConfigDraft) -> Self {
        Self {
            warmup_seconds: d.warmup_seconds.to_string(),
            total_rounds: d.total_rounds.to_string(),
            work_seconds: d.work_seconds.to_string(),
            rest1_seconds: d.rest1_seconds.to_string(),
            rest2_seconds: d.rest2_seconds.to_string(),
            rest2_every_n_rounds: d.rest2_every_n_rounds.to_string(),
            cooldown_seconds: d.cooldown_seconds.to_string(),
            sound_enabled: d.sound_enabled,
            vibrate_enabled: d.vibrate_enabled,
        }
    }
}

impl From<&Config> for RawConfig {
    fn from(c: &Config) -> Self {
        RawConfig::from(&ConfigDraft::from(c))
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Value {
        Text(String),
        Int(i64),
    }

    Ok(match Value::deserialize(deserializer)? {
        Value::Text(s) => s,
        Value::Int(n) => n.to_string(),
    })
}

/// Parsed but unchecked numbers, e.g. from the command line or a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigDraft {
    pub warmup_seconds: i64,
    pub total_rounds: i64,
    pub work_seconds: i64,
    pub rest1_seconds: i64,
    pub rest2_seconds: i64,
    pub rest2_every_n_rounds: i64,
    pub cooldown_seconds: i64,
    pub sound_enabled: bool,
    pub vibrate_enabled: bool,
}

impl Default for ConfigDraft {
    fn default() -> Self {
        Self {
            warmup_seconds: 10,
            total_rounds: 8,
            work_seconds: 20,
            rest1_seconds: 10,
            rest2_seconds: 0,
            rest2_every_n_rounds: 0,
            cooldown_seconds: 0,
            sound_enabled: true,
            vibrate_enabled: true,
        }
    }
}

impl ConfigDraft {
    fn range_errors(&self) -> Vec<FieldError> {
        let checks = [
            (Field::WarmupSeconds, self.warmup_seconds, 0, MAX_SECONDS),
            (Field::TotalRounds, self.total_rounds, 1, MAX_COUNT),
            (Field::WorkSeconds, self.work_seconds, 1, MAX_SECONDS),
            (Field::Rest1Seconds, self.rest1_seconds, 0, MAX_SECONDS),
            (Field::Rest2Seconds, self.rest2_seconds, 0, MAX_SECONDS),
            (Field::Rest2EveryNRounds, self.rest2_every_n_rounds, 0, MAX_COUNT),
            (Field::CooldownSeconds, self.cooldown_seconds, 0, MAX_SECONDS),
        ];

        checks
            .into_iter()
            .filter(|&(_, value, min, max)| value < min || value > max)
            .map(|(field, value, min, max)| FieldError::OutOfRange {
                field,
                value,
                min,
                max,
            })
            .collect()
    }
}

impl From<&Config> for ConfigDraft {
    fn from(c: &Config) -> Self {
        Self {
            warmup_seconds: c.warmup_seconds.into(),
            total_rounds: c.total_rounds.into(),
            work_seconds: c.work_seconds.into(),
            rest1_seconds: c.rest1_seconds.into(),
            rest2_seconds: c.rest2_seconds.into(),
            rest2_every_n_rounds: c.rest2_every_n_rounds.into(),
            cooldown_seconds: c.cooldown_seconds.into(),
            sound_enabled: c.sound_enabled,
            vibrate_enabled: c.vibrate_enabled,
        }
    }
}

/// Validated workout parameters. Only obtainable through validation, so
/// everything downstream can rely on `total_rounds >= 1` and `work_seconds >= 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    warmup_seconds: u32,
    total_rounds: u32,
    work_seconds: u32,
    rest1_seconds: u32,
    rest2_seconds: u32,
    rest2_every_n_rounds: u32,
    cooldown_seconds: u32,
    sound_enabled: bool,
    vibrate_enabled: bool,
}

impl Config {
    pub fn new(draft: ConfigDraft) -> Result<Self, ConfigValidationError> {
        let errors = draft.range_errors();
        if errors.is_empty() {
            Ok(Self::from_checked(&draft))
        } else {
            Err(ConfigValidationError { errors })
        }
    }

    // callers have already run range_errors() on the draft
    fn from_checked(d: &ConfigDraft) -> Self {
        let secs = |v: i64| v.clamp(0, MAX_SECONDS) as u32;
        let count = |v: i64| v.clamp(0, MAX_COUNT) as u32;
        Self {
            warmup_seconds: secs(d.warmup_seconds),
            total_rounds: count(d.total_rounds),
            work_seconds: secs(d.work_seconds),
            rest1_seconds: secs(d.rest1_seconds),
            rest2_seconds: secs(d.rest2_seconds),
            rest2_every_n_rounds: count(d.rest2_every_n_rounds),
            cooldown_seconds: secs(d.cooldown_seconds),
            sound_enabled: d.sound_enabled,
            vibrate_enabled: d.vibrate_enabled,
        }
    }

    pub fn warmup_seconds(&self) -> u32 {
        self.warmup_seconds
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    pub fn work_seconds(&self) -> u32 {
        self.work_seconds
    }

    pub fn rest1_seconds(&self) -> u32 {
        self.rest1_seconds
    }

    pub fn rest2_seconds(&self) -> u32 {
        self.rest2_seconds
    }

    pub fn rest2_every_n_rounds(&self) -> u32 {
        self.rest2_every_n_rounds
    }

    pub fn cooldown_seconds(&self) -> u32 {
        self.cooldown_seconds
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn vibrate_enabled(&self) -> bool {
        self.vibrate_enabled
    }
}

/// Anything `start()` can take a frozen snapshot from
pub trait ConfigSource {
    fn snapshot(&self) -> Result<Config, ConfigValidationError>;
}

impl ConfigSource for RawConfig {
    fn snapshot(&self) -> Result<Config, ConfigValidationError> {
        self.parse()
    }
}

impl ConfigSource for ConfigDraft {
    fn snapshot(&self) -> Result<Config, ConfigValidationError> {
        Config::new(*self)
    }
}

impl ConfigSource for Config {
    fn snapshot(&self) -> Result<Config, ConfigValidationError> {
        Ok(self.clone())
    }
}

pub trait ConfigStore {
    fn load(&self) -> RawConfig;
    fn save(&self, cfg: &RawConfig) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_dir()
            .map(|dir| dir.join(format!("{CONFIG_NAMESPACE}.json")))
            .unwrap_or_else(|| PathBuf::from(format!("{CONFIG_NAMESPACE}.json")));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when nothing has been saved yet.
    pub fn try_load(&self) -> Result<Option<RawConfig>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_slice::<RawConfig>(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> RawConfig {
        match self.try_load() {
            Ok(Some(cfg)) => {
                tracing::debug!(path = %self.path.display(), "Loaded stored settings");
                cfg
            }
            Ok(None) => RawConfig::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring stored settings, using defaults");
                RawConfig::default()
            }
        }
    }

    fn save(&self, cfg: &RawConfig) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(StoreError::Serialize)?;
        fs::write(&self.path, data).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// In-memory store for headless runs. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    slot: Rc<RefCell<Option<RawConfig>>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Option<RawConfig> {
        self.slot.borrow().clone()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> RawConfig {
        self.saved().unwrap_or_default()
    }

    fn save(&self, cfg: &RawConfig) -> Result<(), StoreError> {
        *self.slot.borrow_mut() = Some(cfg.clone());
        Ok(())
    }
}

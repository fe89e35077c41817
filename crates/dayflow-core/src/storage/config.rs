//! TOML-based application configuration.
//!
//! Stores the scheduling policy constants:
//! - Day window and minimum useful slot
//! - Chain buffers and routine promotion threshold
//! - Pillar slot scanning granularity
//! - Backfill limits and placement windows
//! - Suggestion routing thresholds
//! - AI round-trip timeout
//!
//! Configuration is stored at `~/.config/dayflow/config.toml`.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::suggestion::ResolverPolicy;

const MINUTES_PER_DAY: i64 = 24 * 60;
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Parse an `HH:MM` wall-clock string.
pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

fn hhmm_or(value: &str, fallback: (u32, u32)) -> NaiveTime {
    parse_hhmm(value)
        .or_else(|| NaiveTime::from_hms_opt(fallback.0, fallback.1, 0))
        .unwrap_or_default()
}

/// Day window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayConfig {
    /// First wall-clock time considered for placement (HH:MM)
    #[serde(default = "default_day_start")]
    pub day_start: String,
    /// "Reasonable day end" for searches (HH:MM)
    #[serde(default = "default_day_end")]
    pub day_end: String,
    #[serde(default = "default_30")]
    pub min_slot_minutes: i64,
    /// Local wall clock offset east of UTC
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl DayConfig {
    pub fn day_start(&self) -> NaiveTime {
        hhmm_or(&self.day_start, (6, 0))
    }

    pub fn day_end(&self) -> NaiveTime {
        hhmm_or(&self.day_end, (22, 0))
    }
}

/// Chain placement configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_5")]
    pub buffer_minutes: i64,
    #[serde(default = "default_5")]
    pub min_adjacent_gap_minutes: i64,
    #[serde(default = "default_routine_threshold")]
    pub routine_threshold: u32,
}

/// Pillar slot search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PillarConfig {
    #[serde(default = "default_15")]
    pub round_to_minutes: i64,
    #[serde(default = "default_30")]
    pub scan_step_minutes: i64,
}

/// Backfill reconstruction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackfillConfig {
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
    #[serde(default = "default_30")]
    pub min_interval_minutes: i64,
    #[serde(default = "default_lunch_start")]
    pub lunch_start: String,
    #[serde(default = "default_lunch_end")]
    pub lunch_end: String,
    /// Weekday intervals starting before this are filled from their start
    #[serde(default = "default_early_cutoff")]
    pub early_cutoff: String,
}

impl BackfillConfig {
    pub fn lunch_start(&self) -> NaiveTime {
        hhmm_or(&self.lunch_start, (12, 0))
    }

    pub fn lunch_end(&self) -> NaiveTime {
        hhmm_or(&self.lunch_end, (13, 30))
    }

    pub fn early_cutoff(&self) -> NaiveTime {
        hhmm_or(&self.early_cutoff, (9, 0))
    }
}

/// AI collaborator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/dayflow/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub day: DayConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub pillar: PillarConfig,
    #[serde(default)]
    pub backfill: BackfillConfig,
    #[serde(default)]
    pub resolver: ResolverPolicy,
    #[serde(default)]
    pub ai: AiConfig,
}

// Default functions
fn default_day_start() -> String {
    "06:00".into()
}
fn default_day_end() -> String {
    "22:00".into()
}
fn default_lunch_start() -> String {
    "12:00".into()
}
fn default_lunch_end() -> String {
    "13:30".into()
}
fn default_early_cutoff() -> String {
    "09:00".into()
}
fn default_5() -> i64 {
    5
}
fn default_15() -> i64 {
    15
}
fn default_30() -> i64 {
    30
}
fn default_routine_threshold() -> u32 {
    3
}
fn default_max_suggestions() -> usize {
    4
}
fn default_ai_timeout() -> u64 {
    30
}

impl Default for DayConfig {
    fn default() -> Self {
        Self {
            day_start: default_day_start(),
            day_end: default_day_end(),
            min_slot_minutes: default_30(),
            utc_offset_minutes: 0,
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            buffer_minutes: default_5(),
            min_adjacent_gap_minutes: default_5(),
            routine_threshold: default_routine_threshold(),
        }
    }
}

impl Default for PillarConfig {
    fn default() -> Self {
        Self {
            round_to_minutes: default_15(),
            scan_step_minutes: default_30(),
        }
    }
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            max_suggestions: default_max_suggestions(),
            min_interval_minutes: default_30(),
            lunch_start: default_lunch_start(),
            lunch_end: default_lunch_end(),
            early_cutoff: default_early_cutoff(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_ai_timeout(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the configuration file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if missing.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed or fails
    /// validation, or if the default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("falling back to default configuration: {e}");
                Self::default()
            }
        }
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting configuration fails validation. On error the
    /// configuration is left unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };

        for (key, value) in [
            ("day.day_start", &self.day.day_start),
            ("day.day_end", &self.day.day_end),
            ("backfill.lunch_start", &self.backfill.lunch_start),
            ("backfill.lunch_end", &self.backfill.lunch_end),
            ("backfill.early_cutoff", &self.backfill.early_cutoff),
        ] {
            if parse_hhmm(value).is_none() {
                return Err(invalid(key, "expected HH:MM"));
            }
        }
        if self.day.day_end() <= self.day.day_start() {
            return Err(invalid("day.day_end", "must be after day.day_start"));
        }
        if self.day.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(invalid("day.utc_offset_minutes", "must be within 14 hours of UTC"));
        }
        for (key, value, min) in [
            ("day.min_slot_minutes", self.day.min_slot_minutes, 1),
            ("chain.buffer_minutes", self.chain.buffer_minutes, 0),
            ("chain.min_adjacent_gap_minutes", self.chain.min_adjacent_gap_minutes, 0),
            ("pillar.round_to_minutes", self.pillar.round_to_minutes, 1),
            ("pillar.scan_step_minutes", self.pillar.scan_step_minutes, 1),
            ("backfill.min_interval_minutes", self.backfill.min_interval_minutes, 1),
        ] {
            if !(min..=MINUTES_PER_DAY).contains(&value) {
                return Err(invalid(key, &format!("must be between {min} and {MINUTES_PER_DAY} minutes")));
            }
        }
        self.resolver
            .validate()
            .map_err(|message| invalid("resolver", &message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.day.day_end, "22:00");
        assert_eq!(parsed.chain.buffer_minutes, 5);
        assert_eq!(parsed.resolver.create_event.direct, 0.7);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[day]\nday_end = \"20:30\"\n").unwrap();
        assert_eq!(parsed.day.day_end(), NaiveTime::from_hms_opt(20, 30, 0).unwrap());
        assert_eq!(parsed.day.day_start(), NaiveTime::from_hms_opt(6, 0, 0).unwrap());
        assert_eq!(parsed.backfill.max_suggestions, 4);
        assert_eq!(parsed.ai.timeout_secs, 30);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("day.day_start").as_deref(), Some("06:00"));
        assert_eq!(cfg.get("chain.routine_threshold").as_deref(), Some("3"));
        assert_eq!(cfg.get("resolver.create_pillar.direct").as_deref(), Some("0.85"));
        assert!(cfg.get("day.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("chain.buffer_minutes", "10").unwrap();
        cfg.set("resolver.create_event.direct", "0.65").unwrap();
        cfg.set("day.day_end", "21:00").unwrap();
        assert_eq!(cfg.chain.buffer_minutes, 10);
        assert_eq!(cfg.resolver.create_event.direct, 0.65);
        assert_eq!(cfg.day.day_end(), NaiveTime::from_hms_opt(21, 0, 0).unwrap());
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("day.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_rejects_invalid_values_and_keeps_state() {
        let mut cfg = Config::default();
        assert!(cfg.set("chain.buffer_minutes", "soon").is_err());
        assert!(cfg.set("day.day_end", "25:99").is_err());
        assert!(cfg.set("day.day_end", "05:00").is_err());
        assert!(cfg.set("resolver.create_event.middle", "0.9").is_err());
        assert!(cfg.set("chain.buffer_minutes", "9223372036854775807").is_err());
        assert!(cfg.set("pillar.scan_step_minutes", "0").is_err());
        assert!(cfg.set("day.utc_offset_minutes", "2000").is_err());
        assert_eq!(cfg.chain.buffer_minutes, 5);
        assert_eq!(cfg.day.day_end, "22:00");
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.day.min_slot_minutes, 30);

        let mut changed = cfg.clone();
        changed.set("backfill.max_suggestions", "3").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().backfill.max_suggestions, 3);
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "day = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}

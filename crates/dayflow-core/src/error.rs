//! Core error types for dayflow-core.
//!
//! This module defines the error hierarchy using thiserror. Placement
//! failures are plain values returned to the immediate caller; nothing in
//! this crate resolves an overlap by shifting blocks around.

use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for dayflow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Placement failures (overlap, insufficient gap)
    #[error(transparent)]
    Placement(#[from] PlacementError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// AI collaborator errors
    #[error("AI service error: {0}")]
    Ai(#[from] AiError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Lookup of an entity by identifier failed
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

impl CoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Reasons a proposed placement was refused.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlacementError {
    /// The proposed interval intersects an existing block.
    #[error("No room found: {start} - {end} overlaps '{conflicting_title}'")]
    OverlapConflict {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        conflicting_id: String,
        conflicting_title: String,
    },

    /// Adjacent insertion needs more space than the neighbouring gap offers.
    #[error(
        "Insufficient gap: {} minutes available, need {} more minutes",
        .available.num_minutes(),
        shortfall_minutes(.available, .required)
    )]
    InsufficientGap {
        available: Duration,
        required: Duration,
    },

    /// A chain without steps cannot be placed.
    #[error("Chain '{0}' has no steps")]
    EmptyChain(String),

    /// The placement would leave the anchored calendar day.
    #[error("Placement {start} - {end} falls outside the day")]
    OutsideDay {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// No free interval of the day can hold the requested duration.
    #[error("No room found for {required_minutes} minutes on this day")]
    NoRoom { required_minutes: i64 },

    /// The referenced block is not on the timeline.
    #[error("Block not found: {0}")]
    UnknownBlock(String),

    /// The block itself is malformed (non-positive duration, duplicate id).
    #[error("Block '{id}' rejected: {reason}")]
    InvalidBlock { id: String, reason: String },
}

fn shortfall_minutes(available: &Duration, required: &Duration) -> i64 {
    (*required - *available).num_minutes()
}

impl PlacementError {
    /// Minutes still missing for an insufficient-gap failure.
    pub fn missing_minutes(&self) -> Option<i64> {
        match self {
            Self::InsufficientGap {
                available,
                required,
            } => Some(shortfall_minutes(available, required)),
            _ => None,
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Could not resolve the data directory
    #[error("Could not resolve data directory: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Durations must be strictly positive
    #[error("Invalid duration for '{field}': {seconds}s (must be > 0)")]
    NonPositiveDuration { field: String, seconds: i64 },

    /// Pillar minimum exceeds maximum
    #[error("Invalid duration range: minimum ({min_minutes}m) exceeds maximum ({max_minutes}m)")]
    InvalidDurationRange { min_minutes: i64, max_minutes: i64 },

    /// Wall-clock value out of range
    #[error("Invalid time of day: {hour:02}:{minute:02}")]
    InvalidTimeOfDay { hour: u32, minute: u32 },

    /// A single block, step or suggestion cannot outlast a day
    #[error("Duration for '{field}' exceeds one day: {seconds}s")]
    DurationTooLong { field: String, seconds: i64 },

    /// Confidence outside [0, 1]
    #[error("Confidence must be within [0, 1], got {0}")]
    ConfidenceOutOfRange(f64),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors surfaced by the AI collaborator boundary.
#[derive(Error, Debug)]
pub enum AiError {
    /// The round-trip exceeded the configured timeout
    #[error("AI request timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The service answered with something unusable
    #[error("Malformed AI response: {0}")]
    MalformedResponse(String),

    /// The service itself failed
    #[error("AI service unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_gap_reports_missing_minutes() {
        let err = PlacementError::InsufficientGap {
            available: Duration::minutes(20),
            required: Duration::minutes(50),
        };
        assert_eq!(err.missing_minutes(), Some(30));
        assert_eq!(
            err.to_string(),
            "Insufficient gap: 20 minutes available, need 30 more minutes"
        );
    }

    #[test]
    fn overlap_message_mentions_conflict() {
        let start = Utc::now();
        let err = PlacementError::OverlapConflict {
            start,
            end: start + Duration::minutes(30),
            conflicting_id: "b1".into(),
            conflicting_title: "Standup".into(),
        };
        assert!(err.to_string().starts_with("No room found"));
        assert!(err.to_string().contains("Standup"));
        assert_eq!(err.missing_minutes(), None);
    }

    #[test]
    fn placement_error_converts_into_core_error() {
        let err: CoreError = PlacementError::EmptyChain("Morning".into()).into();
        assert!(matches!(err, CoreError::Placement(_)));
        assert_eq!(err.to_string(), "Chain 'Morning' has no steps");
    }
}

//! Time block types and utilities.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Qualitative energy tag of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Energy {
    Sunrise,
    #[default]
    Daylight,
    Moonlight,
}

impl Energy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sunrise => "sunrise",
            Self::Daylight => "daylight",
            Self::Moonlight => "moonlight",
        }
    }

    /// Default energy for a local hour of day.
    pub fn for_hour(hour: u32) -> Self {
        match hour {
            5..=10 => Self::Sunrise,
            11..=17 => Self::Daylight,
            _ => Self::Moonlight,
        }
    }
}

/// Longest duration a single block may have.
pub const MAX_BLOCK_SECONDS: i64 = 24 * 60 * 60;

/// Provenance/confidence of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GlassState {
    /// Confirmed by the user
    #[default]
    Solid,
    /// Being dragged or edited
    Liquid,
    /// Tentative, low confidence
    Mist,
    /// Generated by the assistant
    Crystal,
}

impl GlassState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Liquid => "liquid",
            Self::Mist => "mist",
            Self::Crystal => "crystal",
        }
    }

    /// Whether the block still awaits a human confirming it.
    pub fn is_tentative(&self) -> bool {
        matches!(self, Self::Mist | Self::Crystal)
    }
}

/// A single scheduled activity.
///
/// The end time is derived from `start_time + duration_seconds` and never
/// stored. Goal, pillar and chain links are plain identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBlock {
    pub id: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub duration_seconds: i64,
    #[serde(default)]
    pub energy: Energy,
    #[serde(default)]
    pub glyph: String,
    #[serde(default)]
    pub state: GlassState,
    #[serde(default)]
    pub related_goal_id: Option<String>,
    #[serde(default)]
    pub related_pillar_id: Option<String>,
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TimeBlock {
    /// Create a new block with a fresh identifier.
    ///
    /// Energy starts as daylight; [`DayTimeline::new_block`] derives it from
    /// the local hour instead.
    ///
    /// [`DayTimeline::new_block`]: super::DayTimeline::new_block
    ///
    /// # Errors
    /// Returns an error if `duration` is not strictly positive or is longer
    /// than a day.
    pub fn try_new(
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        duration: Duration,
    ) -> Result<Self, ValidationError> {
        let seconds = duration.num_seconds();
        if seconds <= 0 {
            return Err(ValidationError::NonPositiveDuration {
                field: "duration".into(),
                seconds,
            });
        }
        if seconds > MAX_BLOCK_SECONDS {
            return Err(ValidationError::DurationTooLong {
                field: "duration".into(),
                seconds,
            });
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            start_time,
            duration_seconds: seconds,
            energy: Energy::default(),
            glyph: String::new(),
            state: GlassState::Solid,
            related_goal_id: None,
            related_pillar_id: None,
            chain_id: None,
            notes: None,
        })
    }

    pub fn duration(&self) -> Duration {
        Duration::seconds(self.duration_seconds)
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + self.duration()
    }

    /// Get duration in minutes
    pub fn duration_minutes(&self) -> i64 {
        self.duration_seconds / 60
    }

    /// Check if this block overlaps with another
    pub fn overlaps(&self, other: &Self) -> bool {
        self.overlaps_range(other.start_time, other.end_time())
    }

    /// Half-open interval intersection with `[start, end)`.
    pub fn overlaps_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && self.end_time() > start
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_energy(mut self, energy: Energy) -> Self {
        self.energy = energy;
        self
    }

    pub fn with_glyph(mut self, glyph: impl Into<String>) -> Self {
        self.glyph = glyph.into();
        self
    }

    pub fn with_state(mut self, state: GlassState) -> Self {
        self.state = state;
        self
    }

    pub fn with_goal(mut self, goal_id: impl Into<String>) -> Self {
        self.related_goal_id = Some(goal_id.into());
        self
    }

    pub fn with_pillar(mut self, pillar_id: impl Into<String>) -> Self {
        self.related_pillar_id = Some(pillar_id.into());
        self
    }

    pub fn with_chain(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = Some(chain_id.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

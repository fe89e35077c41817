//! Pillars: recurring commitments with a cadence.
//!
//! A pillar is satisfied by any block that links back to it through
//! `related_pillar_id`. Whether it is due is always computed, never stored.

mod tracker;

pub use tracker::{DuePillar, PillarTracker, Slot};

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::timeline::{DayTimeline, MAX_BLOCK_SECONDS};

/// How often a pillar should be honoured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "times", rename_all = "snake_case")]
pub enum Cadence {
    Daily,
    /// N times per week
    Weekly(u32),
    /// N times per month
    Monthly(u32),
    AsNeeded,
}

impl Cadence {
    /// Expected days between two satisfactions.
    pub fn expected_interval_days(&self) -> f64 {
        match self {
            Self::Daily => 1.0,
            Self::Weekly(n) => 7.0 / (*n).max(1) as f64,
            Self::Monthly(n) => 30.0 / (*n).max(1) as f64,
            Self::AsNeeded => 7.0,
        }
    }

    /// Pure due rule: strictly more than the expected interval has passed.
    pub fn is_due_after(&self, elapsed_days: f64) -> bool {
        elapsed_days > self.expected_interval_days()
    }

    pub fn label(&self) -> String {
        match self {
            Self::Daily => "daily".into(),
            Self::Weekly(1) => "weekly".into(),
            Self::Weekly(n) => format!("{n}x per week"),
            Self::Monthly(1) => "monthly".into(),
            Self::Monthly(n) => format!("{n}x per month"),
            Self::AsNeeded => "as needed".into(),
        }
    }
}

/// A daily-recurring wall-clock window. `end` before `start` wraps past
/// midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start_hour: u32,
    pub start_minute: u32,
    pub end_hour: u32,
    pub end_minute: u32,
}

impl TimeWindow {
    /// # Errors
    /// Returns an error for out-of-range hours or minutes.
    pub fn new(
        start_hour: u32,
        start_minute: u32,
        end_hour: u32,
        end_minute: u32,
    ) -> Result<Self, ValidationError> {
        let window = Self {
            start_hour,
            start_minute,
            end_hour,
            end_minute,
        };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (hour, minute) in [
            (self.start_hour, self.start_minute),
            (self.end_hour, self.end_minute),
        ] {
            if NaiveTime::from_hms_opt(hour, minute, 0).is_none() {
                return Err(ValidationError::InvalidTimeOfDay { hour, minute });
            }
        }
        Ok(())
    }

    pub fn start(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.start_hour, self.start_minute, 0).unwrap_or_default()
    }

    pub fn end(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.end_hour, self.end_minute, 0).unwrap_or_default()
    }

    pub fn wraps_midnight(&self) -> bool {
        self.end() <= self.start()
    }

    /// Concrete intervals this window covers on `timeline`'s day.
    ///
    /// A wrapping window yields the early-morning tail and the late-evening
    /// head; identical start and end means the whole day.
    pub fn intervals_on(&self, timeline: &DayTimeline) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let start = timeline.local_datetime(self.start());
        let end = timeline.local_datetime(self.end());
        if self.wraps_midnight() {
            vec![
                (timeline.start_of_day(), end),
                (start, timeline.next_midnight()),
            ]
        } else {
            vec![(start, end)]
        }
    }

    /// Whether `[start, end)` intersects this window on `timeline`'s day.
    pub fn intersects(
        &self,
        timeline: &DayTimeline,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> bool {
        self.intervals_on(timeline)
            .into_iter()
            .any(|(s, e)| s < end && e > start)
    }
}

/// A recurring commitment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pillar {
    pub id: String,
    pub name: String,
    pub cadence: Cadence,
    pub min_duration_minutes: i64,
    pub max_duration_minutes: i64,
    #[serde(default)]
    pub preferred_windows: Vec<TimeWindow>,
    #[serde(default)]
    pub quiet_hours: Vec<TimeWindow>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub habits: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
}

impl Pillar {
    /// # Errors
    /// Returns an error if the duration range is empty or inverted.
    pub fn new(
        name: impl Into<String>,
        cadence: Cadence,
        min_duration_minutes: i64,
        max_duration_minutes: i64,
    ) -> Result<Self, ValidationError> {
        let pillar = Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            cadence,
            min_duration_minutes,
            max_duration_minutes,
            preferred_windows: Vec::new(),
            quiet_hours: Vec::new(),
            values: Vec::new(),
            habits: Vec::new(),
            constraints: Vec::new(),
        };
        pillar.validate()?;
        Ok(pillar)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_preferred_window(mut self, window: TimeWindow) -> Self {
        self.preferred_windows.push(window);
        self
    }

    pub fn with_quiet_hours(mut self, window: TimeWindow) -> Self {
        self.quiet_hours.push(window);
        self
    }

    pub fn min_duration(&self) -> Duration {
        Duration::minutes(self.min_duration_minutes)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::minutes(self.max_duration_minutes)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_duration_minutes <= 0 {
            return Err(ValidationError::NonPositiveDuration {
                field: "min_duration_minutes".into(),
                seconds: self.min_duration_minutes.saturating_mul(60),
            });
        }
        if self.min_duration_minutes > self.max_duration_minutes {
            return Err(ValidationError::InvalidDurationRange {
                min_minutes: self.min_duration_minutes,
                max_minutes: self.max_duration_minutes,
            });
        }
        if self.max_duration_minutes > MAX_BLOCK_SECONDS / 60 {
            return Err(ValidationError::DurationTooLong {
                field: "max_duration_minutes".into(),
                seconds: self.max_duration_minutes.saturating_mul(60),
            });
        }
        if let Cadence::Weekly(0) | Cadence::Monthly(0) = self.cadence {
            return Err(ValidationError::InvalidValue {
                field: "cadence".into(),
                message: "frequency must be at least 1".into(),
            });
        }
        for window in self.preferred_windows.iter().chain(&self.quiet_hours) {
            window.validate()?;
        }
        Ok(())
    }

    /// Whether `[start, end)` touches any quiet-hour window.
    pub fn in_quiet_hours(
        &self,
        timeline: &DayTimeline,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> bool {
        self.quiet_hours
            .iter()
            .any(|w| w.intersects(timeline, start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn expected_intervals() {
        assert_eq!(Cadence::Daily.expected_interval_days(), 1.0);
        assert!((Cadence::Weekly(3).expected_interval_days() - 7.0 / 3.0).abs() < 1e-9);
        assert_eq!(Cadence::Monthly(2).expected_interval_days(), 15.0);
        assert_eq!(Cadence::AsNeeded.expected_interval_days(), 7.0);
    }

    #[test]
    fn due_rule_is_strict() {
        assert!(!Cadence::Daily.is_due_after(1.0));
        assert!(Cadence::Daily.is_due_after(1.01));
        assert!(Cadence::Weekly(3).is_due_after(4.0));
        assert!(!Cadence::Weekly(1).is_due_after(6.5));
        assert!(Cadence::AsNeeded.is_due_after(8.0));
    }

    #[test]
    fn pillar_validation() {
        assert!(Pillar::new("Exercise", Cadence::Weekly(3), 30, 60).is_ok());
        assert!(matches!(
            Pillar::new("Exercise", Cadence::Weekly(3), 60, 30),
            Err(ValidationError::InvalidDurationRange { .. })
        ));
        assert!(Pillar::new("Read", Cadence::Monthly(0), 10, 20).is_err());
        assert!(matches!(
            Pillar::new("Read", Cadence::Daily, 10, i64::MAX),
            Err(ValidationError::DurationTooLong { .. })
        ));
        assert!(Pillar::new("Read", Cadence::Daily, i64::MIN, 20).is_err());
        assert!(TimeWindow::new(24, 0, 1, 0).is_err());
    }

    #[test]
    fn wrapping_quiet_hours_cover_both_ends() {
        let t = DayTimeline::new(NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
        let quiet = TimeWindow::new(22, 0, 7, 0).unwrap();
        assert!(quiet.wraps_midnight());
        assert!(quiet.intersects(&t, t.at(6, 30).unwrap(), t.at(7, 30).unwrap()));
        assert!(quiet.intersects(&t, t.at(21, 45).unwrap(), t.at(22, 15).unwrap()));
        assert!(!quiet.intersects(&t, t.at(7, 0).unwrap(), t.at(21, 0).unwrap()));
    }

    #[test]
    fn cadence_serializes_with_tag() {
        let json = serde_json::to_string(&Cadence::Weekly(3)).unwrap();
        assert_eq!(json, r#"{"kind":"weekly","times":3}"#);
        let daily: Cadence = serde_json::from_str(r#"{"kind":"daily"}"#).unwrap();
        assert_eq!(daily, Cadence::Daily);
        assert_eq!(Cadence::Weekly(3).label(), "3x per week");
    }
}

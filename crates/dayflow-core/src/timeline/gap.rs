//! Free-time detection around and between blocks.
//!
//! Finds available time slots between existing blocks of a day, and
//! measures the distance from a block to its neighbours.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::block::TimeBlock;
use super::store::DayTimeline;
use crate::error::PlacementError;
use crate::storage::DayConfig;

/// Size category of a time gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapSize {
    Small,  // under 30 minutes
    Medium, // 30-59 minutes
    Large,  // 60+ minutes
}

impl GapSize {
    /// Categorize a gap by its duration in minutes
    pub fn from_minutes(minutes: i64) -> Self {
        if minutes < 30 {
            Self::Small
        } else if minutes < 60 {
            Self::Medium
        } else {
            Self::Large
        }
    }
}

/// A free interval `[start_time, end_time)` on a timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeGap {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub size: GapSize,
}

impl TimeGap {
    /// Create a new time gap; `None` for empty or inverted ranges
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Option<Self> {
        if end_time <= start_time {
            return None;
        }
        Some(Self {
            start_time,
            end_time,
            size: GapSize::from_minutes((end_time - start_time).num_minutes()),
        })
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Get duration in minutes
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Check if this gap can hold something of the given length
    pub fn can_fit(&self, duration: Duration) -> bool {
        self.duration() >= duration
    }

    /// Whether the gap intersects `[start, end)`
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && self.end_time > start
    }
}

/// Finds free time on a day timeline.
#[derive(Debug, Clone)]
pub struct GapFinder {
    day_start: NaiveTime,
    day_end: NaiveTime,
    min_slot: Duration,
}

impl GapFinder {
    /// Finder with default settings: 06:00-22:00, 30 minute minimum slot
    pub fn new() -> Self {
        Self::from_config(&DayConfig::default())
    }

    pub fn from_config(config: &DayConfig) -> Self {
        Self {
            day_start: config.day_start(),
            day_end: config.day_end(),
            min_slot: Duration::minutes(config.min_slot_minutes),
        }
    }

    /// Set the minimum slot length
    pub fn with_min_slot(mut self, min_slot: Duration) -> Self {
        self.min_slot = min_slot;
        self
    }

    /// Set the wall-clock search window
    pub fn with_day_bounds(mut self, day_start: NaiveTime, day_end: NaiveTime) -> Self {
        self.day_start = day_start;
        self.day_end = day_end;
        self
    }

    pub fn min_slot(&self) -> Duration {
        self.min_slot
    }

    /// Configured search start on a concrete day
    pub fn search_start(&self, timeline: &DayTimeline) -> DateTime<Utc> {
        timeline.local_datetime(self.day_start)
    }

    /// Configured search end on a concrete day
    pub fn search_end(&self, timeline: &DayTimeline) -> DateTime<Utc> {
        timeline.local_datetime(self.day_end)
    }

    /// Free time between the closest earlier block and `target`.
    ///
    /// Falls back to local midnight when nothing precedes the target. A
    /// target that overlaps another block has no gap to measure.
    pub fn gap_before(
        &self,
        target: &TimeBlock,
        timeline: &DayTimeline,
    ) -> Result<Duration, PlacementError> {
        timeline.check_free(target.start_time, target.end_time(), Some(&target.id))?;

        let previous_end = timeline
            .iter()
            .filter(|b| b.id != target.id && b.end_time() <= target.start_time)
            .map(|b| b.end_time())
            .max()
            .unwrap_or_else(|| timeline.start_of_day());

        Ok((target.start_time - previous_end).max(Duration::zero()))
    }

    /// Free time between `target` and the closest later block.
    ///
    /// Bounded by 23:59:59 local time when nothing follows the target.
    pub fn gap_after(
        &self,
        target: &TimeBlock,
        timeline: &DayTimeline,
    ) -> Result<Duration, PlacementError> {
        timeline.check_free(target.start_time, target.end_time(), Some(&target.id))?;

        let next_start = timeline
            .iter()
            .filter(|b| b.id != target.id && b.start_time >= target.end_time())
            .map(|b| b.start_time)
            .min()
            .unwrap_or_else(|| timeline.end_of_day());

        Ok((next_start - target.end_time()).max(Duration::zero()))
    }

    /// Free intervals of at least `min_slot` between `day_start` and `day_end`
    ///
    /// # Returns
    /// Vector of time gaps sorted by start time
    pub fn free_intervals(
        &self,
        timeline: &DayTimeline,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
        min_slot: Duration,
    ) -> Vec<TimeGap> {
        let mut gaps = Vec::new();
        if day_end <= day_start {
            return gaps;
        }

        let mut sorted: Vec<&TimeBlock> = timeline.iter().collect();
        sorted.sort_by_key(|b| b.start_time);

        let mut last_end = day_start;

        for block in sorted {
            let end = block.end_time();

            // Skip blocks that end before our current position
            if end <= last_end {
                continue;
            }

            // Skip blocks that start after the search window
            if block.start_time >= day_end {
                break;
            }

            if block.start_time > last_end {
                if let Some(gap) = TimeGap::new(last_end, block.start_time.min(day_end)) {
                    if gap.can_fit(min_slot) {
                        gaps.push(gap);
                    }
                }
            }

            last_end = end.min(day_end);
        }

        if last_end < day_end {
            if let Some(gap) = TimeGap::new(last_end, day_end) {
                if gap.can_fit(min_slot) {
                    gaps.push(gap);
                }
            }
        }

        gaps
    }

    /// Free intervals within the configured day window and minimum slot
    pub fn day_intervals(&self, timeline: &DayTimeline) -> Vec<TimeGap> {
        self.free_intervals(
            timeline,
            self.search_start(timeline),
            self.search_end(timeline),
            self.min_slot,
        )
    }

    /// Earliest start, at or after `not_before`, where `duration` fits
    /// inside the configured day window.
    pub fn first_fit(
        &self,
        timeline: &DayTimeline,
        duration: Duration,
        not_before: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let start = self.search_start(timeline).max(not_before);
        self.free_intervals(timeline, start, self.search_end(timeline), duration)
            .first()
            .map(|gap| gap.start_time)
    }
}

impl Default for GapFinder {
    fn default() -> Self {
        Self::new()
    }
}

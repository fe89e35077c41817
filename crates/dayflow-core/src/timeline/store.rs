//! Day timeline store.
//!
//! A `DayTimeline` is the set of blocks anchored to one calendar date. It is
//! the only place blocks are inserted or edited, and every mutation is
//! checked against the day bounds and the non-overlap invariant before
//! anything changes.

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc, Weekday,
};
use serde::{Deserialize, Serialize};

use super::block::{Energy, TimeBlock};
use crate::error::{PlacementError, ValidationError};

/// A mutation request against a timeline.
#[derive(Debug, Clone)]
pub enum TimelineCommand {
    /// Insert a new block
    Add(TimeBlock),
    /// Drag a block to a new start time
    Move { id: String, start_time: DateTime<Utc> },
    /// Change a block's duration, keeping its start
    Resize { id: String, duration: Duration },
    /// Replace a block's contents (matched by id)
    Update(TimeBlock),
    /// Delete a block
    Remove { id: String },
}

/// Blocks of one calendar day, kept sorted by start time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TimelineRecord")]
pub struct DayTimeline {
    date: NaiveDate,
    utc_offset_minutes: i32,
    blocks: Vec<TimeBlock>,
}

#[derive(Deserialize)]
struct TimelineRecord {
    date: NaiveDate,
    #[serde(default)]
    utc_offset_minutes: i32,
    #[serde(default)]
    blocks: Vec<TimeBlock>,
}

impl TryFrom<TimelineRecord> for DayTimeline {
    type Error = PlacementError;

    fn try_from(record: TimelineRecord) -> Result<Self, Self::Error> {
        let mut timeline = DayTimeline::with_offset(record.date, record.utc_offset_minutes);
        timeline.insert_all(record.blocks)?;
        Ok(timeline)
    }
}

impl DayTimeline {
    /// Empty timeline for a UTC-anchored day.
    pub fn new(date: NaiveDate) -> Self {
        Self::with_offset(date, 0)
    }

    /// Empty timeline whose wall clock is `utc_offset_minutes` east of UTC.
    pub fn with_offset(date: NaiveDate, utc_offset_minutes: i32) -> Self {
        Self {
            date,
            utc_offset_minutes,
            blocks: Vec::new(),
        }
    }

    /// Build a timeline from existing blocks, rejecting overlapping input.
    pub fn from_blocks(
        date: NaiveDate,
        utc_offset_minutes: i32,
        blocks: Vec<TimeBlock>,
    ) -> Result<Self, PlacementError> {
        let mut timeline = Self::with_offset(date, utc_offset_minutes);
        timeline.insert_all(blocks)?;
        Ok(timeline)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    pub fn utc_offset_minutes(&self) -> i32 {
        self.utc_offset_minutes
    }

    pub fn blocks(&self) -> &[TimeBlock] {
        &self.blocks
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeBlock> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TimeBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    // ── Wall clock ──────────────────────────────────────────────────────

    /// Absolute instant of a local wall-clock time on this day.
    pub fn local_datetime(&self, time: NaiveTime) -> DateTime<Utc> {
        let naive = self.date.and_time(time) - Duration::minutes(self.utc_offset_minutes as i64);
        Utc.from_utc_datetime(&naive)
    }

    /// Absolute instant of `hour:minute` local time, if valid.
    pub fn at(&self, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(|t| self.local_datetime(t))
    }

    /// Local midnight at the start of the day.
    pub fn start_of_day(&self) -> DateTime<Utc> {
        self.local_datetime(NaiveTime::default())
    }

    /// Local midnight at the start of the following day.
    pub fn next_midnight(&self) -> DateTime<Utc> {
        self.start_of_day() + Duration::days(1)
    }

    /// 23:59:59 local time.
    pub fn end_of_day(&self) -> DateTime<Utc> {
        self.next_midnight() - Duration::seconds(1)
    }

    /// Local wall-clock time of an instant.
    pub fn local_time_of(&self, instant: DateTime<Utc>) -> NaiveTime {
        (instant.naive_utc() + Duration::minutes(self.utc_offset_minutes as i64)).time()
    }

    /// Local calendar date of an instant.
    pub fn local_date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        (instant.naive_utc() + Duration::minutes(self.utc_offset_minutes as i64)).date()
    }

    /// Energy tag for a local hour of this day.
    pub fn energy_at(&self, instant: DateTime<Utc>) -> Energy {
        Energy::for_hour(self.local_time_of(instant).hour())
    }

    /// New block for this day, tagged with the energy of its local start hour.
    /// Nothing is inserted.
    pub fn new_block(
        &self,
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        duration: Duration,
    ) -> Result<TimeBlock, ValidationError> {
        Ok(TimeBlock::try_new(title, start_time, duration)?.with_energy(self.energy_at(start_time)))
    }

    /// Whether `[start, end)` lies within this calendar day.
    pub fn contains_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start >= self.start_of_day() && end <= self.next_midnight()
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// First block intersecting `[start, end)`, ignoring `ignore_id`.
    pub fn conflict_with(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        ignore_id: Option<&str>,
    ) -> Option<&TimeBlock> {
        self.blocks
            .iter()
            .filter(|b| Some(b.id.as_str()) != ignore_id)
            .find(|b| b.overlaps_range(start, end))
    }

    /// Fail with `OverlapConflict` if `[start, end)` is occupied.
    pub fn check_free(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        ignore_id: Option<&str>,
    ) -> Result<(), PlacementError> {
        match self.conflict_with(start, end, ignore_id) {
            Some(block) => Err(PlacementError::OverlapConflict {
                start,
                end,
                conflicting_id: block.id.clone(),
                conflicting_title: block.title.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Whether a block of `duration` could start at `start`.
    pub fn is_slot_available(&self, start: DateTime<Utc>, duration: Duration) -> bool {
        duration > Duration::zero() && self.conflict_with(start, start + duration, None).is_none()
    }

    /// Whether no two blocks intersect.
    pub fn is_overlap_free(&self) -> bool {
        self.blocks
            .windows(2)
            .all(|pair| pair[0].end_time() <= pair[1].start_time)
    }

    // ── Mutation ────────────────────────────────────────────────────────

    /// Apply a single command atomically.
    ///
    /// Returns the previous version of the affected block for `Move`,
    /// `Resize`, `Update` and `Remove`; `None` for `Add`.
    pub fn apply(&mut self, command: TimelineCommand) -> Result<Option<TimeBlock>, PlacementError> {
        match command {
            TimelineCommand::Add(block) => {
                self.insert_all(vec![block])?;
                Ok(None)
            }
            TimelineCommand::Move { id, start_time } => {
                let mut updated = self.require(&id)?.clone();
                updated.start_time = start_time;
                self.replace(updated).map(Some)
            }
            TimelineCommand::Resize { id, duration } => {
                let mut updated = self.require(&id)?.clone();
                updated.duration_seconds = duration.num_seconds();
                self.replace(updated).map(Some)
            }
            TimelineCommand::Update(block) => self.replace(block).map(Some),
            TimelineCommand::Remove { id } => {
                let index = self.index_of(&id)?;
                Ok(Some(self.blocks.remove(index)))
            }
        }
    }

    /// Insert a batch of blocks, all or nothing.
    ///
    /// Each block must lie within the day and is checked against the
    /// existing timeline and against the blocks earlier in the batch.
    pub fn insert_all(&mut self, blocks: Vec<TimeBlock>) -> Result<(), PlacementError> {
        for (i, block) in blocks.iter().enumerate() {
            self.validate_block(block)?;
            let duplicate = self.get(&block.id).is_some()
                || blocks[..i].iter().any(|b| b.id == block.id);
            if duplicate {
                return Err(PlacementError::InvalidBlock {
                    id: block.id.clone(),
                    reason: "duplicate block id".into(),
                });
            }
            self.check_free(block.start_time, block.end_time(), None)?;
            if let Some(earlier) = blocks[..i].iter().find(|b| b.overlaps(block)) {
                return Err(PlacementError::OverlapConflict {
                    start: block.start_time,
                    end: block.end_time(),
                    conflicting_id: earlier.id.clone(),
                    conflicting_title: earlier.title.clone(),
                });
            }
        }

        self.blocks.extend(blocks);
        self.sort();
        Ok(())
    }

    fn replace(&mut self, block: TimeBlock) -> Result<TimeBlock, PlacementError> {
        self.validate_block(&block)?;
        let index = self.index_of(&block.id)?;
        self.check_free(block.start_time, block.end_time(), Some(&block.id))?;
        let previous = std::mem::replace(&mut self.blocks[index], block);
        self.sort();
        Ok(previous)
    }

    fn validate_block(&self, block: &TimeBlock) -> Result<(), PlacementError> {
        if block.duration_seconds <= 0 {
            return Err(PlacementError::InvalidBlock {
                id: block.id.clone(),
                reason: format!("duration must be positive, got {}s", block.duration_seconds),
            });
        }
        // Checked before `end_time` so an absurd duration cannot overflow.
        if block.start_time < self.start_of_day()
            || block.start_time >= self.next_midnight()
            || block.duration_seconds > (self.next_midnight() - block.start_time).num_seconds()
        {
            return Err(PlacementError::OutsideDay {
                start: block.start_time,
                end: Duration::try_seconds(block.duration_seconds)
                    .and_then(|d| block.start_time.checked_add_signed(d))
                    .unwrap_or(block.start_time),
            });
        }
        Ok(())
    }

    fn require(&self, id: &str) -> Result<&TimeBlock, PlacementError> {
        self.get(id)
            .ok_or_else(|| PlacementError::UnknownBlock(id.to_string()))
    }

    fn index_of(&self, id: &str) -> Result<usize, PlacementError> {
        self.blocks
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| PlacementError::UnknownBlock(id.to_string()))
    }

    fn sort(&mut self) {
        self.blocks.sort_by_key(|b| b.start_time);
    }
}

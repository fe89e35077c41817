//! Pillar due-tracking and slot search.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::Pillar;
use crate::storage::{DayConfig, PillarConfig};
use crate::timeline::{DayTimeline, GlassState, TimeBlock};

/// A concrete placement candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl Slot {
    pub fn new(start_time: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            start_time,
            duration_minutes: duration.num_minutes(),
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(self.duration_minutes)
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + self.duration()
    }
}

/// A pillar that is currently due
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuePillar {
    pub pillar_id: String,
    pub name: String,
    pub last_satisfied: Option<DateTime<Utc>>,
    /// `None` when the pillar was never satisfied
    pub elapsed_days: Option<f64>,
    /// Elapsed over expected interval; `None` when never satisfied
    pub overdue_ratio: Option<f64>,
}

/// Computes due status and placement slots for pillars.
#[derive(Debug, Clone)]
pub struct PillarTracker {
    day_start: NaiveTime,
    day_end: NaiveTime,
    round_to: Duration,
    scan_step: Duration,
}

impl PillarTracker {
    pub fn new() -> Self {
        Self::from_config(&DayConfig::default(), &PillarConfig::default())
    }

    pub fn from_config(day: &DayConfig, pillar: &PillarConfig) -> Self {
        Self {
            day_start: day.day_start(),
            day_end: day.day_end(),
            round_to: Duration::minutes(pillar.round_to_minutes),
            scan_step: Duration::minutes(pillar.scan_step_minutes),
        }
    }

    /// End of the most recent block linked to `pillar` that finished by
    /// `as_of`.
    pub fn last_satisfied<'a, I>(
        &self,
        pillar: &Pillar,
        history: I,
        as_of: DateTime<Utc>,
    ) -> Option<DateTime<Utc>>
    where
        I: IntoIterator<Item = &'a TimeBlock>,
    {
        history
            .into_iter()
            .filter(|b| b.related_pillar_id.as_deref() == Some(pillar.id.as_str()))
            .map(|b| b.end_time())
            .filter(|end| *end <= as_of)
            .max()
    }

    /// Whether `pillar` is due at `as_of`. A pillar never satisfied is due.
    pub fn is_due<'a, I>(&self, pillar: &Pillar, as_of: DateTime<Utc>, history: I) -> bool
    where
        I: IntoIterator<Item = &'a TimeBlock>,
    {
        match self.last_satisfied(pillar, history, as_of) {
            Some(last) => pillar.cadence.is_due_after(elapsed_days(last, as_of)),
            None => true,
        }
    }

    /// Every due pillar, most overdue first (never-satisfied ones lead).
    pub fn due_pillars<'a, I>(
        &self,
        pillars: &[Pillar],
        as_of: DateTime<Utc>,
        history: I,
    ) -> Vec<DuePillar>
    where
        I: IntoIterator<Item = &'a TimeBlock> + Clone,
    {
        let mut due: Vec<DuePillar> = pillars
            .iter()
            .filter_map(|pillar| {
                let last = self.last_satisfied(pillar, history.clone(), as_of);
                let elapsed = last.map(|l| elapsed_days(l, as_of));
                let is_due = elapsed.map_or(true, |e| pillar.cadence.is_due_after(e));
                is_due.then(|| DuePillar {
                    pillar_id: pillar.id.clone(),
                    name: pillar.name.clone(),
                    last_satisfied: last,
                    elapsed_days: elapsed,
                    overdue_ratio: elapsed.map(|e| e / pillar.cadence.expected_interval_days()),
                })
            })
            .collect();

        due.sort_by(|a, b| match (a.overdue_ratio, b.overdue_ratio) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        });
        due
    }

    /// Best slot for `pillar` on `timeline`'s day.
    ///
    /// Preferred windows are tried in declared order; otherwise the day is
    /// scanned from `now` (rounded up) or from the day start when planning
    /// ahead. Returns `None` when nothing fits.
    pub fn best_slot(
        &self,
        pillar: &Pillar,
        timeline: &DayTimeline,
        now: DateTime<Utc>,
    ) -> Option<Slot> {
        let duration = pillar.min_duration();

        for window in &pillar.preferred_windows {
            let start = timeline.local_datetime(window.start());
            if self.is_candidate_free(pillar, timeline, start, duration) {
                tracing::debug!(pillar = %pillar.name, start = %start, "preferred window free");
                return Some(Slot::new(start, duration));
            }
        }

        let day_end = timeline.local_datetime(self.day_end);
        let mut cursor = self.scan_start(timeline, now)?;
        while cursor + duration <= day_end {
            if self.is_candidate_free(pillar, timeline, cursor, duration) {
                tracing::debug!(pillar = %pillar.name, start = %cursor, "fallback slot found");
                return Some(Slot::new(cursor, duration));
            }
            cursor += self.scan_step;
        }

        tracing::debug!(pillar = %pillar.name, "no slot found");
        None
    }

    /// Turn the best slot into a tentative block linked to the pillar.
    pub fn propose(
        &self,
        pillar: &Pillar,
        timeline: &DayTimeline,
        now: DateTime<Utc>,
    ) -> Option<TimeBlock> {
        let slot = self.best_slot(pillar, timeline, now)?;
        timeline
            .new_block(&pillar.name, slot.start_time, slot.duration())
            .ok()
            .map(|block| {
                block
                    .with_glyph("◆")
                    .with_state(GlassState::Mist)
                    .with_pillar(&pillar.id)
            })
    }

    fn is_candidate_free(
        &self,
        pillar: &Pillar,
        timeline: &DayTimeline,
        start: DateTime<Utc>,
        duration: Duration,
    ) -> bool {
        let end = start + duration;
        timeline.contains_range(start, end)
            && timeline.is_slot_available(start, duration)
            && !pillar.in_quiet_hours(timeline, start, end)
    }

    fn scan_start(&self, timeline: &DayTimeline, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let day_start = timeline.local_datetime(self.day_start);
        match timeline.local_date_of(now).cmp(&timeline.date()) {
            Ordering::Less => Some(day_start),
            Ordering::Greater => None,
            Ordering::Equal => Some(self.round_up(timeline, now).max(day_start)),
        }
    }

    fn round_up(&self, timeline: &DayTimeline, now: DateTime<Utc>) -> DateTime<Utc> {
        let midnight = timeline.start_of_day();
        let step = self.round_to.num_seconds().max(1);
        let since = (now - midnight).num_seconds();
        let rounded = (since + step - 1).div_euclid(step) * step;
        midnight + Duration::seconds(rounded)
    }
}

impl Default for PillarTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn elapsed_days(last: DateTime<Utc>, as_of: DateTime<Utc>) -> f64 {
    (as_of - last).num_seconds() as f64 / 86_400.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pillar::{Cadence, TimeWindow};
    use crate::timeline::{Energy, TimelineCommand};
    use chrono::NaiveDate;

    fn day() -> DayTimeline {
        DayTimeline::new(NaiveDate::from_ymd_opt(2026, 3, 4).unwrap())
    }

    fn exercise() -> Pillar {
        Pillar::new("Exercise", Cadence::Weekly(3), 45, 90)
            .unwrap()
            .with_id("exercise")
    }

    fn satisfied_at(pillar: &Pillar, end: DateTime<Utc>) -> TimeBlock {
        TimeBlock::try_new(&pillar.name, end - Duration::minutes(45), Duration::minutes(45))
            .unwrap()
            .with_pillar(&pillar.id)
    }

    fn add(t: &mut DayTimeline, h: u32, m: u32, minutes: i64) {
        let block = TimeBlock::try_new("busy", t.at(h, m).unwrap(), Duration::minutes(minutes)).unwrap();
        t.apply(TimelineCommand::Add(block)).unwrap();
    }

    #[test]
    fn weekly_three_is_due_after_four_days() {
        let pillar = exercise();
        let now = day().at(12, 0).unwrap();
        let history = vec![satisfied_at(&pillar, now - Duration::days(4))];
        let tracker = PillarTracker::new();
        assert!(tracker.is_due(&pillar, now, &history));
        // Same inputs, same answer
        assert!(tracker.is_due(&pillar, now, &history));

        let recent = vec![satisfied_at(&pillar, now - Duration::days(2))];
        assert!(!tracker.is_due(&pillar, now, &recent));
    }

    #[test]
    fn never_satisfied_is_due_and_ranked_first() {
        let pillar = exercise();
        let mut reading = Pillar::new("Reading", Cadence::Daily, 20, 40).unwrap();
        reading.id = "reading".into();
        let now = day().at(12, 0).unwrap();
        let history = vec![satisfied_at(&reading, now - Duration::days(3))];

        let due = PillarTracker::new().due_pillars(&[reading, pillar], now, &history);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].pillar_id, "exercise");
        assert!(due[0].elapsed_days.is_none());
        assert!((due[1].overdue_ratio.unwrap() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn future_blocks_do_not_satisfy() {
        let pillar = exercise();
        let now = day().at(12, 0).unwrap();
        let history = vec![satisfied_at(&pillar, now + Duration::hours(3))];
        assert!(PillarTracker::new().last_satisfied(&pillar, &history, now).is_none());
    }

    #[test]
    fn preferred_windows_in_declared_order() {
        let mut t = day();
        add(&mut t, 7, 0, 60);
        let pillar = exercise()
            .with_preferred_window(TimeWindow::new(7, 0, 8, 0).unwrap())
            .with_preferred_window(TimeWindow::new(18, 0, 19, 0).unwrap());
        let now = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap().and_hms_opt(20, 0, 0).unwrap().and_utc();

        let slot = PillarTracker::new().best_slot(&pillar, &t, now).unwrap();
        assert_eq!(slot.start_time, t.at(18, 0).unwrap());
        assert_eq!(slot.duration_minutes, 45);
    }

    #[test]
    fn fallback_scan_starts_from_rounded_now() {
        let mut t = day();
        add(&mut t, 10, 30, 60);
        let pillar = exercise();
        let now = t.at(10, 7).unwrap();

        // rounded to 10:15; every candidate up to 11:15 collides
        let slot = PillarTracker::new().best_slot(&pillar, &t, now).unwrap();
        assert_eq!(slot.start_time, t.at(11, 45).unwrap());
    }

    #[test]
    fn quiet_hours_are_skipped() {
        let t = day();
        let pillar = exercise()
            .with_preferred_window(TimeWindow::new(21, 30, 22, 30).unwrap())
            .with_quiet_hours(TimeWindow::new(21, 0, 7, 0).unwrap())
            .with_quiet_hours(TimeWindow::new(12, 0, 14, 0).unwrap());
        let now = t.at(11, 20).unwrap();

        let slot = PillarTracker::new().best_slot(&pillar, &t, now).unwrap();
        // 11:30 would run into the 12:00 quiet window
        assert_eq!(slot.start_time, t.at(14, 0).unwrap());
    }

    #[test]
    fn no_slot_when_day_is_full() {
        let mut t = day();
        add(&mut t, 6, 0, 16 * 60);
        let pillar = exercise();
        let now = t.at(6, 0).unwrap();
        assert!(PillarTracker::new().best_slot(&pillar, &t, now).is_none());

        let two_days_later = t.at(6, 0).unwrap() + Duration::days(2);
        assert!(PillarTracker::new().best_slot(&pillar, &day(), two_days_later).is_none());
    }

    #[test]
    fn propose_links_block_to_pillar() {
        let t = day();
        let pillar = exercise();
        let block = PillarTracker::new()
            .propose(&pillar, &t, t.at(8, 0).unwrap())
            .unwrap();
        assert_eq!(block.related_pillar_id.as_deref(), Some("exercise"));
        assert_eq!(block.state, GlassState::Mist);
        assert_eq!(block.start_time, t.at(8, 0).unwrap());
    }

    #[test]
    fn proposed_block_energy_uses_local_hour() {
        // 14:00 at UTC-5 is 19:00 UTC
        let west = DayTimeline::with_offset(NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(), -300);
        let pillar = exercise().with_preferred_window(TimeWindow::new(14, 0, 15, 0).unwrap());
        let block = PillarTracker::new()
            .propose(&pillar, &west, west.at(8, 0).unwrap())
            .unwrap();
        assert_eq!(block.start_time, west.at(14, 0).unwrap());
        assert_eq!(block.energy, Energy::Daylight);

        // 08:00 at UTC+10 is 22:00 UTC the day before

        let east = DayTimeline::with_offset(NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(), 600);
        let block = PillarTracker::new()
            .propose(&exercise(), &east, east.at(8, 0).unwrap())
            .unwrap();
        assert_eq!(block.start_time, east.at(8, 0).unwrap());
        assert_eq!(block.energy, Energy::Sunrise);
    }
}

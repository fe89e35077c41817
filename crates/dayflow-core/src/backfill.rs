//! Backfill: reconstruct a plausible day from sparse signals.
//!
//! Free intervals of the day are filled from a ranked activity library. The
//! first activity of an interval is positioned by the lunch/early/centre
//! rules; the rest of the interval is then filled back to back with
//! activities whose energy suits the local hour. Every produced block is
//! tagged crystal so the UI can show it as AI-origin until the user
//! confirms it.

use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc, Weekday};
use serde::Serialize;

use crate::storage::{BackfillConfig, DayConfig};
use crate::timeline::{DayTimeline, Energy, GapFinder, GlassState, TimeBlock, TimeGap};

/// One entry of an activity library
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActivityTemplate {
    pub title: &'static str,
    pub duration_minutes: i64,
    pub energy: Energy,
    pub glyph: &'static str,
    pub confidence: f64,
}

impl ActivityTemplate {
    const fn new(
        title: &'static str,
        duration_minutes: i64,
        energy: Energy,
        glyph: &'static str,
        confidence: f64,
    ) -> Self {
        Self {
            title,
            duration_minutes,
            energy,
            glyph,
            confidence,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(self.duration_minutes)
    }
}

const WEEKDAY_LIBRARY: [ActivityTemplate; 7] = [
    ActivityTemplate::new("Morning routine", 45, Energy::Sunrise, "☀", 0.95),
    ActivityTemplate::new("Lunch", 60, Energy::Daylight, "🍽", 0.90),
    ActivityTemplate::new("Focused work", 120, Energy::Daylight, "💻", 0.85),
    ActivityTemplate::new("Meetings", 60, Energy::Daylight, "👥", 0.75),
    ActivityTemplate::new("Email & admin", 30, Energy::Daylight, "✉", 0.70),
    ActivityTemplate::new("Exercise", 45, Energy::Moonlight, "🏃", 0.65),
    ActivityTemplate::new("Dinner", 60, Energy::Moonlight, "🍲", 0.60),
];

const WEEKEND_LIBRARY: [ActivityTemplate; 7] = [
    ActivityTemplate::new("Slow breakfast", 60, Energy::Sunrise, "🥐", 0.90),
    ActivityTemplate::new("Lunch", 60, Energy::Daylight, "🍽", 0.85),
    ActivityTemplate::new("Errands", 90, Energy::Daylight, "🛒", 0.80),
    ActivityTemplate::new("Outdoor time", 120, Energy::Daylight, "🌳", 0.75),
    ActivityTemplate::new("Hobby", 90, Energy::Daylight, "🎨", 0.70),
    ActivityTemplate::new("Social time", 120, Energy::Moonlight, "🥂", 0.65),
    ActivityTemplate::new("Reading", 45, Energy::Moonlight, "📖", 0.60),
];

/// Ranked activities for a weekday, most likely first.
pub fn weekday_library() -> &'static [ActivityTemplate] {
    &WEEKDAY_LIBRARY
}

/// Ranked activities for a weekend day, most likely first.
pub fn weekend_library() -> &'static [ActivityTemplate] {
    &WEEKEND_LIBRARY
}

fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

/// Synthesizes crystal blocks for the open parts of a day.
#[derive(Debug, Clone)]
pub struct BackfillReconstructor {
    gap_finder: GapFinder,
    min_interval: Duration,
    max_suggestions: usize,
    lunch_start: NaiveTime,
    lunch_end: NaiveTime,
    early_cutoff: NaiveTime,
}

impl BackfillReconstructor {
    pub fn new() -> Self {
        Self::from_config(&BackfillConfig::default(), &DayConfig::default())
    }

    pub fn from_config(backfill: &BackfillConfig, day: &DayConfig) -> Self {
        Self {
            gap_finder: GapFinder::from_config(day),
            min_interval: Duration::minutes(backfill.min_interval_minutes),
            max_suggestions: backfill.max_suggestions,
            lunch_start: backfill.lunch_start(),
            lunch_end: backfill.lunch_end(),
            early_cutoff: backfill.early_cutoff(),
        }
    }

    /// Library used for `timeline`'s day of the week.
    pub fn library_for(&self, timeline: &DayTimeline) -> &'static [ActivityTemplate] {
        if is_weekend(timeline.weekday()) {
            weekend_library()
        } else {
            weekday_library()
        }
    }

    /// Propose blocks for the free intervals of `timeline`.
    ///
    /// The timeline is not modified. The result never overlaps existing
    /// blocks or itself and holds at most `max_suggestions` blocks.
    pub fn reconstruct(&self, timeline: &DayTimeline) -> Vec<TimeBlock> {
        let library = self.library_for(timeline);
        let weekend = is_weekend(timeline.weekday());
        let intervals = self.gap_finder.free_intervals(
            timeline,
            self.gap_finder.search_start(timeline),
            self.gap_finder.search_end(timeline),
            self.min_interval,
        );

        let mut placed = vec![false; library.len()];
        let mut blocks = Vec::new();

        for interval in &intervals {
            let mut remaining = Some(interval.clone());
            let mut first = true;

            while let Some(gap) = remaining.take() {
                if blocks.len() >= self.max_suggestions || placed.iter().all(|&p| p) {
                    break;
                }
                let fits = |i: usize| !placed[i] && gap.can_fit(library[i].duration());
                let pick = if first {
                    (0..library.len()).find(|&i| fits(i))
                } else {
                    let energy = timeline.energy_at(gap.start_time);
                    (0..library.len()).find(|&i| fits(i) && library[i].energy == energy)
                };

                let Some(index) = pick else {
                    if !first {
                        // nothing suits this hour, try from the next one
                        let next = next_local_hour(timeline, gap.start_time);
                        remaining = TimeGap::new(next, gap.end_time)
                            .filter(|rest| rest.can_fit(self.min_interval));
                    }
                    continue;
                };

                let activity = &library[index];
                let start = if first {
                    self.position(timeline, &gap, activity.duration(), weekend)
                } else {
                    gap.start_time
                };
                first = false;
                match TimeBlock::try_new(activity.title, start, activity.duration()) {
                    Ok(block) => {
                        placed[index] = true;
                        remaining = TimeGap::new(block.end_time(), gap.end_time)
                            .filter(|rest| rest.can_fit(self.min_interval));
                        blocks.push(
                            block
                                .with_energy(activity.energy)
                                .with_glyph(activity.glyph)
                                .with_state(GlassState::Crystal)
                                .with_notes(format!(
                                    "Reconstructed (confidence {:.2})",
                                    activity.confidence
                                )),
                        );
                    }
                    Err(e) => tracing::warn!(activity = activity.title, "skipping activity: {e}"),
                }
            }
        }

        tracing::debug!(
            date = %timeline.date(),
            intervals = intervals.len(),
            proposed = blocks.len(),
            "backfill reconstructed"
        );
        blocks
    }

    fn position(
        &self,
        timeline: &DayTimeline,
        interval: &TimeGap,
        duration: Duration,
        weekend: bool,
    ) -> DateTime<Utc> {
        let early = !weekend && timeline.local_time_of(interval.start_time) < self.early_cutoff;
        let lunch = interval.overlaps(
            timeline.local_datetime(self.lunch_start),
            timeline.local_datetime(self.lunch_end),
        );
        if early || lunch {
            return interval.start_time;
        }

        let slack = interval.duration() - duration;
        let centred = interval.start_time + Duration::seconds(slack.num_seconds() / 2);
        floor_to_minute(centred).max(interval.start_time)
    }
}

impl Default for BackfillReconstructor {
    fn default() -> Self {
        Self::new()
    }
}

/// Start of the local hour after `instant`.
fn next_local_hour(timeline: &DayTimeline, instant: DateTime<Utc>) -> DateTime<Utc> {
    let minute = i64::from(timeline.local_time_of(instant).minute());
    floor_to_minute(instant) + Duration::minutes(60 - minute)
}

fn floor_to_minute(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant - Duration::seconds(instant.timestamp().rem_euclid(60))
        - Duration::nanoseconds(i64::from(instant.timestamp_subsec_nanos()))
}

/// Day-of-week label used in logs and CLI output.
pub fn day_kind(timeline: &DayTimeline) -> &'static str {
    if is_weekend(timeline.weekday()) {
        "weekend"
    } else {
        "weekday"
    }
}

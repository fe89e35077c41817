//! The day planner: single owner of timelines, library and pending
//! suggestions.
//!
//! Every mutation goes through `&mut DayPlanner`, so there is exactly one
//! writer per day. The AI round-trip is the only async step and rejoins
//! this path before anything is resolved.

use std::collections::BTreeMap;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ai::{round_trip, AiContext, AiResponse, AiService};
use crate::backfill::BackfillReconstructor;
use crate::chain::{Adjacency, Chain, ChainPlacer};
use crate::error::{CoreError, PlacementError, Result};
use crate::library::Library;
use crate::pillar::{DuePillar, Pillar, PillarTracker, Slot};
use crate::storage::Config;
use crate::suggestion::{
    parse_day_ref, AppliedMutation, Decision, ResolveRequest, StagedSuggestion, SuggestionResolver,
};
use crate::timeline::{DayTimeline, GapFinder, TimeBlock, TimeGap, TimelineCommand};

/// Serializable state of a planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerSnapshot {
    pub current: NaiveDate,
    #[serde(default)]
    pub days: Vec<DayTimeline>,
    #[serde(default)]
    pub library: Library,
    #[serde(default)]
    pub pending: Vec<StagedSuggestion>,
}

impl PlannerSnapshot {
    /// Fresh snapshot with a single empty day.
    pub fn empty(current: NaiveDate) -> Self {
        Self {
            current,
            days: Vec::new(),
            library: Library::default(),
            pending: Vec::new(),
        }
    }
}

/// Owns the current day, the history of other days and the library.
#[derive(Debug)]
pub struct DayPlanner {
    config: Config,
    current: NaiveDate,
    days: BTreeMap<NaiveDate, DayTimeline>,
    library: Library,
    resolver: SuggestionResolver,
    placer: ChainPlacer,
    gap_finder: GapFinder,
    tracker: PillarTracker,
    backfill: BackfillReconstructor,
}

fn day_entry<'a>(
    days: &'a mut BTreeMap<NaiveDate, DayTimeline>,
    date: NaiveDate,
    utc_offset_minutes: i32,
) -> &'a mut DayTimeline {
    days.entry(date)
        .or_insert_with(|| DayTimeline::with_offset(date, utc_offset_minutes))
}

impl DayPlanner {
    pub fn new(config: Config, current: NaiveDate) -> Self {
        let mut days = BTreeMap::new();
        day_entry(&mut days, current, config.day.utc_offset_minutes);
        Self {
            resolver: SuggestionResolver::from_config(&config),
            placer: ChainPlacer::from_config(&config.chain),
            gap_finder: GapFinder::from_config(&config.day),
            tracker: PillarTracker::from_config(&config.day, &config.pillar),
            backfill: BackfillReconstructor::from_config(&config.backfill, &config.day),
            config,
            current,
            days,
            library: Library::default(),
        }
    }

    pub fn from_snapshot(config: Config, snapshot: PlannerSnapshot) -> Self {
        let mut planner = Self::new(config, snapshot.current);
        for day in snapshot.days {
            planner.insert_day(day);
        }
        planner.library = snapshot.library;
        planner.resolver.restore_pending(snapshot.pending);
        planner
    }

    pub fn snapshot(&self) -> PlannerSnapshot {
        PlannerSnapshot {
            current: self.current,
            days: self.days.values().cloned().collect(),
            library: self.library.clone(),
            pending: self.resolver.pending().to_vec(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut Library {
        &mut self.library
    }

    // ── Days ────────────────────────────────────────────────────────────

    pub fn current_date(&self) -> NaiveDate {
        self.current
    }

    pub fn today(&self) -> &DayTimeline {
        // `current` always has an entry; see `new` and `switch_day`.
        &self.days[&self.current]
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayTimeline> {
        self.days.get(&date)
    }

    /// Make `date` the current day, keeping every other day as history.
    pub fn switch_day(&mut self, date: NaiveDate) {
        day_entry(&mut self.days, date, self.config.day.utc_offset_minutes);
        tracing::debug!(from = %self.current, to = %date, "switching day");
        self.current = date;
    }

    /// Add or replace a whole day.
    pub fn insert_day(&mut self, timeline: DayTimeline) {
        self.days.insert(timeline.date(), timeline);
    }

    fn current_mut(&mut self) -> &mut DayTimeline {
        day_entry(&mut self.days, self.current, self.config.day.utc_offset_minutes)
    }

    // ── Blocks and gaps ─────────────────────────────────────────────────

    /// Run a timeline command against the current day.
    pub fn execute(&mut self, command: TimelineCommand) -> Result<Option<TimeBlock>> {
        let previous = self.current_mut().apply(command)?;
        tracing::info!(date = %self.current, blocks = self.today().len(), "timeline updated");
        Ok(previous)
    }

    pub fn free_intervals(&self) -> Vec<TimeGap> {
        self.gap_finder.day_intervals(self.today())
    }

    fn block(&self, id: &str) -> Result<&TimeBlock> {
        self.today()
            .get(id)
            .ok_or_else(|| PlacementError::UnknownBlock(id.to_string()).into())
    }

    pub fn gap_before(&self, id: &str) -> Result<Duration> {
        Ok(self.gap_finder.gap_before(self.block(id)?, self.today())?)
    }

    pub fn gap_after(&self, id: &str) -> Result<Duration> {
        Ok(self.gap_finder.gap_after(self.block(id)?, self.today())?)
    }

    // ── Chains ──────────────────────────────────────────────────────────

    /// Store a chain in the library and return its id.
    pub fn add_chain(&mut self, chain: Chain) -> String {
        let id = chain.id.clone();
        self.library.upsert_chain(chain);
        id
    }

    /// Place a library chain on the current day at `start`.
    pub fn place_chain(&mut self, chain_id: &str, start: DateTime<Utc>) -> Result<Vec<TimeBlock>> {
        let timeline = day_entry(&mut self.days, self.current, self.config.day.utc_offset_minutes);
        let chain = self.library.chain_mut(chain_id)?;
        Ok(self.placer.place(chain, start, timeline)?)
    }

    /// Place a library chain directly before or after an existing block.
    pub fn insert_chain(&mut self, chain_id: &str, adjacency: &Adjacency) -> Result<Vec<TimeBlock>> {
        let timeline = day_entry(&mut self.days, self.current, self.config.day.utc_offset_minutes);
        let chain = self.library.chain_mut(chain_id)?;
        Ok(self.placer.insert(chain, adjacency, timeline)?)
    }

    // ── Pillars ─────────────────────────────────────────────────────────

    pub fn add_pillar(&mut self, pillar: Pillar) -> Result<String> {
        let id = pillar.id.clone();
        self.library.add_pillar(pillar)?;
        Ok(id)
    }

    /// Due pillars at `as_of`, judged against every known day.
    pub fn due_pillars(&self, as_of: DateTime<Utc>) -> Vec<DuePillar> {
        let history = self.days.values().flat_map(|day| day.blocks());
        self.tracker
            .due_pillars(&self.library.pillars, as_of, history)
    }

    fn pillar(&self, pillar_id: &str) -> Result<&Pillar> {
        self.library
            .pillar(pillar_id)
            .ok_or_else(|| CoreError::not_found("pillar", pillar_id))
    }

    /// Best slot for a pillar on the current day.
    pub fn pillar_slot(&self, pillar_id: &str, now: DateTime<Utc>) -> Result<Option<Slot>> {
        Ok(self.tracker.best_slot(self.pillar(pillar_id)?, self.today(), now))
    }

    /// Place a tentative block for a pillar on the current day.
    ///
    /// Returns `None` when no slot is free.
    pub fn schedule_pillar(&mut self, pillar_id: &str, now: DateTime<Utc>) -> Result<Option<TimeBlock>> {
        let Some(block) = self.tracker.propose(self.pillar(pillar_id)?, self.today(), now) else {
            tracing::debug!(pillar = pillar_id, "no slot for pillar");
            return Ok(None);
        };
        self.current_mut().apply(TimelineCommand::Add(block.clone()))?;
        tracing::info!(pillar = pillar_id, start = %block.start_time, "scheduled pillar");
        Ok(Some(block))
    }

    // ── Backfill ────────────────────────────────────────────────────────

    /// Reconstructed blocks for `date`, without committing them.
    pub fn preview_backfill(&self, date: NaiveDate) -> Vec<TimeBlock> {
        match self.days.get(&date) {
            Some(day) => self.backfill.reconstruct(day),
            None => self
                .backfill
                .reconstruct(&DayTimeline::with_offset(date, self.config.day.utc_offset_minutes)),
        }
    }

    /// Reconstruct `date` and add the result to its timeline.
    pub fn commit_backfill(&mut self, date: NaiveDate) -> Result<Vec<TimeBlock>> {
        let blocks = self.preview_backfill(date);
        day_entry(&mut self.days, date, self.config.day.utc_offset_minutes)
            .insert_all(blocks.clone())?;
        tracing::info!(date = %date, blocks = blocks.len(), "backfill committed");
        Ok(blocks)
    }

    // ── Suggestions ─────────────────────────────────────────────────────

    /// Resolve a request against the current day.
    pub fn resolve(&mut self, request: ResolveRequest, now: DateTime<Utc>) -> Decision {
        self.resolve_on(self.current, request, now)
    }

    fn resolve_on(&mut self, date: NaiveDate, request: ResolveRequest, now: DateTime<Utc>) -> Decision {
        let timeline = day_entry(&mut self.days, date, self.config.day.utc_offset_minutes);
        self.resolver.resolve(request, now, timeline, &mut self.library)
    }

    /// Route an AI response. A day mentioned in the request ("tomorrow")
    /// selects the timeline, relative to the current day.
    ///
    /// Returns `None` for responses that carry no action.
    pub fn handle_response(
        &mut self,
        response: &AiResponse,
        request_text: &str,
        now: DateTime<Utc>,
    ) -> Option<Decision> {
        let request = response.to_request(request_text)?;
        let date = parse_day_ref(request_text)
            .map(|day| self.current + Duration::days(day.offset_days()))
            .unwrap_or(self.current);
        Some(self.resolve_on(date, request, now))
    }

    pub fn pending(&self) -> &[StagedSuggestion] {
        self.resolver.pending()
    }

    /// Apply a staged suggestion to the day it was staged for.
    pub fn accept(&mut self, id: &str, now: DateTime<Utc>) -> Result<AppliedMutation> {
        let date = self
            .resolver
            .staged(id)
            .map(|staged| staged.date)
            .ok_or_else(|| CoreError::not_found("staged suggestion", id))?;
        let timeline = day_entry(&mut self.days, date, self.config.day.utc_offset_minutes);
        self.resolver.accept(id, now, timeline, &mut self.library)
    }

    pub fn reject(&mut self, id: &str) -> Result<StagedSuggestion> {
        self.resolver.reject(id)
    }

    /// Ask the AI service and resolve its answer.
    ///
    /// The service sees a copy of the current day; the answer is resolved
    /// only after the round-trip completes.
    pub async fn ask<S: AiService + ?Sized>(
        &mut self,
        service: &S,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Decision>> {
        let due = self
            .due_pillars(now)
            .into_iter()
            .map(|p| p.name)
            .collect();
        let context = AiContext::for_day(self.today(), now).with_due_pillars(due);
        let timeout = StdDuration::from_secs(self.config.ai.timeout_secs);

        let response = round_trip(service, text, &context, timeout).await?;
        Ok(self.handle_response(&response, text, now))
    }
}

//! Confidence-threshold routing of AI responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::intent::IntentSignals;
use super::parser::{parse_cadence, parse_duration, parse_time_of_day};
use super::{
    ActionType, AppliedMutation, ClarificationPrompt, Decision, MiddleBand, ResolverPolicy,
    StageReason, StagedSuggestion, Suggestion,
};
use crate::chain::{Chain, ChainPlacer, FlowPattern};
use crate::error::{CoreError, PlacementError, Result, ValidationError};
use crate::library::{Goal, Library};
use crate::pillar::{Cadence, Pillar};
use crate::storage::Config;
use crate::timeline::{DayTimeline, GapFinder, GlassState, TimeBlock, TimelineCommand};

/// One AI response, as handed to the resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub action: ActionType,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    /// Overall confidence of the response
    pub confidence: f64,
    /// The user's original request text
    #[serde(default)]
    pub request_text: String,
    /// Name for the created chain/goal/pillar, when the AI gave one
    #[serde(default)]
    pub title: Option<String>,
}

impl ResolveRequest {
    pub fn new(action: ActionType, confidence: f64, request_text: impl Into<String>) -> Self {
        Self {
            action,
            suggestions: Vec::new(),
            confidence,
            request_text: request_text.into(),
            title: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Give suggestions without a duration the one stated in the request
    /// text, e.g. "lunch for 45 minutes".
    fn fill_durations(&mut self) {
        let Some(stated) = parse_duration(&self.request_text) else {
            return;
        };
        for suggestion in self.suggestions.iter_mut().filter(|s| s.duration_seconds == 0) {
            suggestion.duration_seconds = stated.num_seconds();
        }
    }

    fn name(&self) -> Option<&str> {
        self.title
            .as_deref()
            .or_else(|| self.suggestions.first().map(|s| s.title.as_str()))
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Routes AI responses to apply, stage or clarify, and owns the pending
/// list of staged suggestions.
#[derive(Debug, Clone)]
pub struct SuggestionResolver {
    policy: ResolverPolicy,
    placer: ChainPlacer,
    gap_finder: GapFinder,
    pending: Vec<StagedSuggestion>,
}

impl SuggestionResolver {
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            policy: config.resolver.clone(),
            placer: ChainPlacer::from_config(&config.chain),
            gap_finder: GapFinder::from_config(&config.day),
            pending: Vec::new(),
        }
    }

    pub fn policy(&self) -> &ResolverPolicy {
        &self.policy
    }

    /// Suggestions awaiting approval. Order carries no meaning.
    pub fn pending(&self) -> &[StagedSuggestion] {
        &self.pending
    }

    /// Restore a previously staged suggestion, e.g. from a snapshot.
    pub fn restore_pending(&mut self, staged: Vec<StagedSuggestion>) {
        self.pending.extend(staged);
    }

    /// Score used for routing `request`.
    ///
    /// Scheduling actions may be lifted by the intent heuristic; goal and
    /// pillar creation use the raw confidence.
    pub fn score(&self, request: &ResolveRequest) -> f64 {
        if request.action.is_scheduling() {
            IntentSignals::from_request(&request.request_text, &request.suggestions)
                .effective(request.confidence, &self.policy.weights)
        } else {
            request.confidence.clamp(0.0, 1.0)
        }
    }

    /// Decide what to do with one AI response and carry it out.
    ///
    /// A direct application refused by the timeline is downgraded to a
    /// staged suggestion. One that fails validation asks for clarification
    /// instead. Nothing here returns an error.
    pub fn resolve(
        &mut self,
        mut request: ResolveRequest,
        now: DateTime<Utc>,
        timeline: &mut DayTimeline,
        library: &mut Library,
    ) -> Decision {
        request.fill_durations();
        let score = self.score(&request);
        let thresholds = *self.policy.thresholds(request.action);

        if request.name().is_none() || self.needs_suggestions(&request) {
            tracing::debug!(action = request.action.as_str(), "nothing concrete to act on");
            return Decision::AskClarification {
                prompt: clarification(&request, score, false),
            };
        }

        if score >= thresholds.direct {
            return match self.apply(&request, GlassState::Crystal, now, timeline, library) {
                Ok(mutation) => {
                    tracing::info!(
                        action = request.action.as_str(),
                        score,
                        blocks = mutation.blocks().len(),
                        "applied suggestion directly"
                    );
                    Decision::ApplyDirectly { mutation }
                }
                Err(CoreError::Placement(e)) => {
                    tracing::warn!(
                        action = request.action.as_str(),
                        score,
                        "direct application failed, staging instead: {e}"
                    );
                    let reason = StageReason::NoRoom(e.to_string());
                    let staged = self.stage(request, score, reason, timeline, now);
                    Decision::StageForApproval { staged }
                }
                Err(e) => {
                    tracing::warn!(
                        action = request.action.as_str(),
                        score,
                        "suggestion cannot be applied: {e}"
                    );
                    Decision::AskClarification {
                        prompt: rejection(&request, score, &e),
                    }
                }
            };
        }

        if score >= thresholds.middle {
            return match thresholds.middle_band {
                MiddleBand::Stage => {
                    tracing::debug!(action = request.action.as_str(), score, "staging suggestion");
                    let staged =
                        self.stage(request, score, StageReason::MediumConfidence, timeline, now);
                    Decision::StageForApproval { staged }
                }
                MiddleBand::ClarifyWithPartial => Decision::AskClarification {
                    prompt: clarification(&request, score, true),
                },
            };
        }

        tracing::debug!(action = request.action.as_str(), score, "confidence too low");
        Decision::AskClarification {
            prompt: clarification(&request, score, false),
        }
    }

    /// Look up a pending suggestion.
    pub fn staged(&self, id: &str) -> Option<&StagedSuggestion> {
        self.pending.iter().find(|s| s.id == id)
    }

    /// Apply a staged suggestion to `timeline`, which must be the day it
    /// was staged for. On failure it stays pending.
    pub fn accept(
        &mut self,
        id: &str,
        now: DateTime<Utc>,
        timeline: &mut DayTimeline,
        library: &mut Library,
    ) -> Result<AppliedMutation> {
        let index = self.index_of(id)?;
        let staged = &self.pending[index];
        if staged.date != timeline.date() {
            return Err(ValidationError::InvalidValue {
                field: "date".into(),
                message: format!(
                    "suggestion {id} was staged for {}, not {}",
                    staged.date,
                    timeline.date()
                ),
            }
            .into());
        }
        let direct = self.policy.thresholds(staged.request.action).direct;
        let state = if staged.score >= direct {
            GlassState::Crystal
        } else {
            GlassState::Mist
        };

        let mutation = self.apply(&staged.request, state, now, timeline, library)?;
        let staged = self.pending.swap_remove(index);
        tracing::info!(
            id = %staged.id,
            action = staged.request.action.as_str(),
            "accepted staged suggestion"
        );
        Ok(mutation)
    }

    /// Discard a staged suggestion.
    pub fn reject(&mut self, id: &str) -> Result<StagedSuggestion> {
        let index = self.index_of(id)?;
        let staged = self.pending.swap_remove(index);
        tracing::warn!(
            id = %staged.id,
            action = staged.request.action.as_str(),
            title = staged.request.name().unwrap_or_default(),
            "rejected staged suggestion"
        );
        Ok(staged)
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.pending
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| CoreError::not_found("staged suggestion", id))
    }

    fn needs_suggestions(&self, request: &ResolveRequest) -> bool {
        request.action != ActionType::CreateGoal && request.suggestions.is_empty()
    }

    fn stage(
        &mut self,
        request: ResolveRequest,
        score: f64,
        reason: StageReason,
        timeline: &DayTimeline,
        now: DateTime<Utc>,
    ) -> StagedSuggestion {
        let staged = StagedSuggestion {
            id: uuid::Uuid::new_v4().to_string(),
            request,
            score,
            reason,
            date: timeline.date(),
            staged_at: now,
        };
        self.pending.push(staged.clone());
        staged
    }

    fn apply(
        &self,
        request: &ResolveRequest,
        state: GlassState,
        now: DateTime<Utc>,
        timeline: &mut DayTimeline,
        library: &mut Library,
    ) -> Result<AppliedMutation> {
        for suggestion in &request.suggestions {
            suggestion.validate()?;
        }
        match request.action {
            ActionType::CreateEvent => {
                let blocks = self.apply_events(request, state, now, timeline)?;
                Ok(AppliedMutation::Blocks { blocks })
            }
            ActionType::CreateChain => self.apply_chain(request, state, now, timeline, library),
            ActionType::CreateGoal => {
                let goal = build_goal(request, now)?;
                library.add_goal(goal.clone());
                Ok(AppliedMutation::Goal { goal })
            }
            ActionType::CreatePillar => {
                let pillar = build_pillar(request)?;
                library.add_pillar(pillar.clone())?;
                Ok(AppliedMutation::Pillar { pillar })
            }
        }
    }

    /// One block per suggestion. An explicit start wins; otherwise each
    /// block takes the first free slot after the previous one.
    fn apply_events(
        &self,
        request: &ResolveRequest,
        state: GlassState,
        now: DateTime<Utc>,
        timeline: &mut DayTimeline,
    ) -> Result<Vec<TimeBlock>> {
        let requested_time =
            parse_time_of_day(&request.request_text).map(|t| timeline.local_datetime(t));
        let mut scratch = timeline.clone();
        let mut not_before = now;
        let mut blocks = Vec::with_capacity(request.suggestions.len());

        for (i, suggestion) in request.suggestions.iter().enumerate() {
            let duration = suggestion.duration();
            let explicit = suggestion
                .start_time
                .or(if i == 0 { requested_time } else { None });
            let start = match explicit {
                Some(start) => start,
                None => self
                    .gap_finder
                    .first_fit(&scratch, duration, not_before)
                    .ok_or(PlacementError::NoRoom {
                        required_minutes: duration.num_minutes(),
                    })?,
            };

            let mut block = TimeBlock::try_new(&suggestion.title, start, duration)?
                .with_energy(suggestion.energy)
                .with_glyph(&suggestion.glyph)
                .with_state(state);
            if !suggestion.explanation.is_empty() {
                block = block.with_notes(&suggestion.explanation);
            }
            scratch.apply(TimelineCommand::Add(block.clone()))?;
            not_before = block.end_time();
            blocks.push(block);
        }

        timeline.insert_all(blocks.clone())?;
        Ok(blocks)
    }

    fn apply_chain(
        &self,
        request: &ResolveRequest,
        state: GlassState,
        now: DateTime<Utc>,
        timeline: &mut DayTimeline,
        library: &mut Library,
    ) -> Result<AppliedMutation> {
        let name = request.name().unwrap_or("Suggested chain");
        let mut chain = Chain::new(name, FlowPattern::default());
        for suggestion in &request.suggestions {
            chain.push_step(suggestion.to_chain_step()?);
        }

        let placer = self.placer.clone().with_state(state);
        let span = chain.span(placer.buffer());
        let explicit = request
            .suggestions
            .first()
            .and_then(|s| s.start_time)
            .or_else(|| parse_time_of_day(&request.request_text).map(|t| timeline.local_datetime(t)));
        let start = match explicit {
            Some(start) => start,
            None => self.gap_finder.first_fit(timeline, span, now).ok_or(
                PlacementError::NoRoom {
                    required_minutes: span.num_minutes(),
                },
            )?,
        };

        let blocks = placer.place(&mut chain, start, timeline)?;
        library.upsert_chain(chain.clone());
        Ok(AppliedMutation::Chain { chain, blocks })
    }
}

impl Default for SuggestionResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn build_goal(request: &ResolveRequest, now: DateTime<Utc>) -> Result<Goal> {
    let title = request.name().ok_or_else(|| ValidationError::InvalidValue {
        field: "title".into(),
        message: "a goal needs a title".into(),
    })?;
    let description = request
        .suggestions
        .first()
        .map(|s| s.explanation.clone())
        .unwrap_or_default();
    Ok(Goal::new(title, now).with_description(description))
}

/// Pillar from the first suggestion; its duration is the minimum and the
/// cadence is read from the request text (weekly when absent).
fn build_pillar(request: &ResolveRequest) -> Result<Pillar> {
    let first = request.suggestions.first().ok_or_else(|| ValidationError::InvalidValue {
        field: "suggestions".into(),
        message: "a pillar needs at least one suggestion".into(),
    })?;
    let name = request.name().unwrap_or(first.title.as_str());
    let cadence = parse_cadence(&request.request_text).unwrap_or(Cadence::Weekly(1));
    let min = first.duration().num_minutes().max(1);
    let mut pillar = Pillar::new(name, cadence, min, min * 2)?;
    pillar.values = request
        .suggestions
        .iter()
        .filter(|s| !s.explanation.is_empty())
        .map(|s| s.explanation.clone())
        .collect();
    Ok(pillar)
}

/// Prompt for a confident response whose content is unusable.
fn rejection(request: &ResolveRequest, score: f64, error: &CoreError) -> ClarificationPrompt {
    ClarificationPrompt {
        action: request.action,
        message: format!(
            "I couldn't create this {}: {error}. Could you correct it?",
            request.action.noun()
        ),
        score,
        partial: Vec::new(),
    }
}

fn clarification(request: &ResolveRequest, score: f64, keep_partial: bool) -> ClarificationPrompt {
    let noun = request.action.noun();
    let message = match (keep_partial, request.name()) {
        (true, Some(name)) => format!(
            "I need more detail before creating the {noun} '{name}'. Could you tell me more?"
        ),
        _ => format!("I need more detail before creating this {noun}. What did you have in mind?"),
    };
    ClarificationPrompt {
        action: request.action,
        message,
        score,
        partial: if keep_partial {
            request.suggestions.clone()
        } else {
            Vec::new()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn day() -> DayTimeline {
        DayTimeline::new(NaiveDate::from_ymd_opt(2026, 3, 4).unwrap())
    }

    fn morning(t: &DayTimeline) -> DateTime<Utc> {
        t.at(8, 0).unwrap()
    }

    fn event(confidence: f64, text: &str) -> ResolveRequest {
        ResolveRequest::new(ActionType::CreateEvent, confidence, text)
            .with_suggestion(Suggestion::new("Dentist", Duration::minutes(60), confidence))
    }

    #[test]
    fn high_confidence_event_with_time_applies_directly() {
        let mut t = day();
        let mut library = Library::new();
        let mut resolver = SuggestionResolver::new();
        let now = morning(&t);

        let decision = resolver.resolve(event(0.75, "Dentist at 3pm"), now, &mut t, &mut library);
        let Decision::ApplyDirectly { mutation } = decision else {
            panic!("expected direct application");
        };
        let block = &mutation.blocks()[0];
        assert_eq!(block.start_time, t.at(15, 0).unwrap());
        assert_eq!(block.state, GlassState::Crystal);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn event_without_time_takes_first_free_slot() {
        let mut t = day();
        t.apply(TimelineCommand::Add(
            TimeBlock::try_new("busy", t.at(8, 0).unwrap(), Duration::hours(2)).unwrap(),
        ))
        .unwrap();
        let mut resolver = SuggestionResolver::new();
        let now = t.at(7, 30).unwrap();

        let decision = resolver.resolve(event(0.95, "dentist"), now, &mut t, &mut Library::new());
        let Decision::ApplyDirectly { mutation } = decision else {
            panic!("expected direct application");
        };
        assert_eq!(mutation.blocks()[0].start_time, t.at(10, 0).unwrap());
    }

    #[test]
    fn medium_event_is_staged_then_accepted_as_mist() {
        let mut t = day();
        let mut library = Library::new();
        let mut resolver = SuggestionResolver::new();
        let now = morning(&t);

        let decision = resolver.resolve(event(0.55, "dentist sometime"), now, &mut t, &mut library);
        let Decision::StageForApproval { staged } = decision else {
            panic!("expected staging");
        };
        assert_eq!(staged.reason, StageReason::MediumConfidence);
        assert!(t.is_empty());
        assert_eq!(resolver.pending().len(), 1);

        let mutation = resolver.accept(&staged.id, now, &mut t, &mut library).unwrap();
        assert_eq!(mutation.blocks()[0].state, GlassState::Mist);
        assert!(resolver.pending().is_empty());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn intent_signals_promote_medium_event() {
        let mut t = day();
        let mut resolver = SuggestionResolver::new();
        let request = event(0.6, "Please schedule the dentist at 3pm");
        assert!(resolver.score(&request) >= 0.7);
        let decision = resolver.resolve(request, morning(&t), &mut t, &mut Library::new());
        assert_eq!(decision.label(), "apply_directly");
    }

    #[test]
    fn direct_failure_downgrades_to_stage() {
        let mut t = day();
        t.apply(TimelineCommand::Add(
            TimeBlock::try_new("busy", t.at(15, 0).unwrap(), Duration::hours(1)).unwrap(),
        ))
        .unwrap();
        let mut resolver = SuggestionResolver::new();

        let decision = resolver.resolve(event(0.9, "Dentist at 3pm"), morning(&t), &mut t, &mut Library::new());
        let Decision::StageForApproval { staged } = decision else {
            panic!("expected downgrade to staging");
        };
        assert!(matches!(staged.reason, StageReason::NoRoom(ref msg) if msg.starts_with("No room found")));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn missing_duration_is_taken_from_request_text() {
        let mut t = day();
        let request = ResolveRequest::new(ActionType::CreateEvent, 0.95, "lunch at noon for 45 minutes")
            .with_suggestion(Suggestion::new("Lunch", Duration::zero(), 0.95));
        let decision = SuggestionResolver::new().resolve(request, morning(&t), &mut t, &mut Library::new());
        let Decision::ApplyDirectly { mutation } = decision else {
            panic!("expected direct application");
        };
        assert_eq!(mutation.blocks()[0].start_time, t.at(12, 0).unwrap());
        assert_eq!(mutation.blocks()[0].duration(), Duration::minutes(45));
    }

    #[test]
    fn invalid_suggestion_at_high_confidence_asks_instead_of_staging() {
        let mut t = day();
        let mut resolver = SuggestionResolver::new();
        let request = ResolveRequest::new(ActionType::CreateEvent, 0.95, "lunch")
            .with_suggestion(Suggestion::new("Lunch", Duration::zero(), 0.95));

        let decision = resolver.resolve(request, morning(&t), &mut t, &mut Library::new());
        let Decision::AskClarification { prompt } = decision else {
            panic!("expected a clarification");
        };
        assert!(prompt.partial.is_empty());
        assert!(resolver.pending().is_empty());
        assert!(t.is_empty());
    }

    #[test]
    fn events_outside_the_day_are_never_applied() {
        let mut t = day();
        let mut resolver = SuggestionResolver::new();
        let tomorrow = t.at(10, 0).unwrap() + Duration::days(1);
        let request = ResolveRequest::new(ActionType::CreateEvent, 0.95, "dentist and a late movie")
            .with_suggestion(Suggestion::new("Dentist", Duration::minutes(60), 0.95).with_start(tomorrow))
            .with_suggestion(
                Suggestion::new("Movie", Duration::minutes(120), 0.95).with_start(t.at(23, 0).unwrap()),
            );

        let decision = resolver.resolve(request, morning(&t), &mut t, &mut Library::new());
        assert_ne!(decision.label(), "apply_directly");
        assert!(t.is_empty());
        assert!(t.blocks().iter().all(|b| t.contains_range(b.start_time, b.end_time())));
    }

    #[test]
    fn failed_accept_keeps_suggestion_pending() {
        let mut t = day();
        let mut library = Library::new();
        let mut resolver = SuggestionResolver::new();
        let now = morning(&t);

        let decision = resolver.resolve(event(0.6, "dentist at 3pm maybe"), now, &mut t, &mut library);
        let Decision::StageForApproval { staged } = decision else {
            panic!("expected staging");
        };
        t.apply(TimelineCommand::Add(
            TimeBlock::try_new("busy", t.at(15, 0).unwrap(), Duration::hours(1)).unwrap(),
        ))
        .unwrap();

        assert!(resolver.accept(&staged.id, now, &mut t, &mut library).is_err());
        assert_eq!(resolver.pending().len(), 1);
        assert!(resolver.reject(&staged.id).is_ok());
        assert!(resolver.pending().is_empty());
        assert!(matches!(
            resolver.reject(&staged.id),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn medium_pillar_asks_for_detail_and_creates_nothing() {
        let mut t = day();
        let mut library = Library::new();
        let mut resolver = SuggestionResolver::new();
        let request = ResolveRequest::new(ActionType::CreatePillar, 0.65, "exercise 3 times a week")
            .with_suggestion(Suggestion::new("Exercise", Duration::minutes(45), 0.65));

        let decision = resolver.resolve(request, morning(&t), &mut t, &mut library);
        let Decision::AskClarification { prompt } = decision else {
            panic!("expected clarification");
        };
        assert!(prompt.message.contains("need more detail"));
        assert_eq!(prompt.partial.len(), 1);
        assert!(library.pillars.is_empty());
        assert!(resolver.pending().is_empty());
    }

    #[test]
    fn confident_pillar_is_created_with_parsed_cadence() {
        let mut t = day();
        let mut library = Library::new();
        let request = ResolveRequest::new(ActionType::CreatePillar, 0.9, "exercise 3 times a week")
            .with_suggestion(Suggestion::new("Exercise", Duration::minutes(45), 0.9));

        let decision = SuggestionResolver::new().resolve(request, morning(&t), &mut t, &mut library);
        assert_eq!(decision.label(), "apply_directly");
        assert_eq!(library.pillars[0].cadence, Cadence::Weekly(3));
        assert_eq!(library.pillars[0].min_duration_minutes, 45);
        assert!(t.is_empty());
    }

    #[test]
    fn goal_uses_raw_confidence() {
        let mut t = day();
        let mut library = Library::new();
        let request = ResolveRequest::new(ActionType::CreateGoal, 0.75, "schedule a marathon at 9am, urgent")
            .with_title("Run a marathon");
        let decision = SuggestionResolver::new().resolve(request, morning(&t), &mut t, &mut library);
        // intent words do not lift goal creation past 0.8
        let Decision::AskClarification { prompt } = decision else {
            panic!("expected clarification");
        };
        assert!(prompt.message.contains("Run a marathon"));
        assert!(library.goals.is_empty());
    }

    #[test]
    fn chain_applies_through_placer() {
        let mut t = day();
        let mut library = Library::new();
        let request = ResolveRequest::new(ActionType::CreateChain, 0.8, "morning at 7am")
            .with_title("Morning")
            .with_suggestion(Suggestion::new("Stretch", Duration::minutes(15), 0.8))
            .with_suggestion(Suggestion::new("Journal", Duration::minutes(20), 0.8));

        let decision = SuggestionResolver::new().resolve(request, morning(&t), &mut t, &mut library);
        let Decision::ApplyDirectly { mutation } = decision else {
            panic!("expected direct application");
        };
        let blocks = mutation.blocks();
        assert_eq!(blocks[0].start_time, t.at(7, 0).unwrap());
        assert_eq!(blocks[1].start_time, t.at(7, 20).unwrap());
        assert_eq!(library.chains[0].completion_count, 1);
        assert_eq!(blocks[0].chain_id.as_deref(), Some(library.chains[0].id.as_str()));
    }

    #[test]
    fn low_confidence_chain_asks_without_partial() {
        let mut t = day();
        let request = ResolveRequest::new(ActionType::CreateChain, 0.3, "something")
            .with_suggestion(Suggestion::new("Step", Duration::minutes(15), 0.3));
        let decision = SuggestionResolver::new().resolve(request, morning(&t), &mut t, &mut Library::new());
        let Decision::AskClarification { prompt } = decision else {
            panic!("expected clarification");
        };
        assert!(prompt.partial.is_empty());
    }
}

//! AI suggestions and the policy that routes them.
//!
//! A suggestion is never applied implicitly. The [`SuggestionResolver`]
//! decides per response whether to apply it, stage it for approval or ask
//! for more detail, based on confidence thresholds per action type.

mod intent;
mod parser;
mod resolver;

pub use intent::{IntentSignals, IntentWeights};
pub use parser::{
    has_scheduling_intent, has_urgency, parse_cadence, parse_day_ref, parse_duration,
    parse_time_of_day, DayRef,
};
pub use resolver::{ResolveRequest, SuggestionResolver};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::{Chain, ChainStep};
use crate::error::ValidationError;
use crate::library::Goal;
use crate::pillar::Pillar;
use crate::timeline::{Energy, TimeBlock, MAX_BLOCK_SECONDS};

/// An ephemeral candidate produced by the AI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    /// Zero when the AI gave no duration; the request text may supply one
    #[serde(default)]
    pub duration_seconds: i64,
    #[serde(default)]
    pub energy: Energy,
    #[serde(default)]
    pub glyph: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub confidence: f64,
    /// Concrete start proposed by the AI, if any
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
}

impl Suggestion {
    pub fn new(title: impl Into<String>, duration: Duration, confidence: f64) -> Self {
        Self {
            title: title.into(),
            duration_seconds: duration.num_seconds(),
            energy: Energy::default(),
            glyph: String::new(),
            explanation: String::new(),
            confidence,
            start_time: None,
        }
    }

    pub fn with_start(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn duration(&self) -> Duration {
        Duration::try_seconds(self.duration_seconds).unwrap_or_else(Duration::zero)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.duration_seconds <= 0 {
            return Err(ValidationError::NonPositiveDuration {
                field: format!("suggestion '{}'", self.title),
                seconds: self.duration_seconds,
            });
        }
        if self.duration_seconds > MAX_BLOCK_SECONDS {
            return Err(ValidationError::DurationTooLong {
                field: format!("suggestion '{}'", self.title),
                seconds: self.duration_seconds,
            });
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ValidationError::ConfidenceOutOfRange(self.confidence));
        }
        Ok(())
    }

    pub fn to_chain_step(&self) -> Result<ChainStep, ValidationError> {
        ChainStep::new(&self.title, self.duration(), self.energy, &self.glyph)
    }
}

/// What the AI wants to create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionType {
    CreateEvent,
    CreateGoal,
    CreatePillar,
    CreateChain,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateEvent => "create-event",
            Self::CreateGoal => "create-goal",
            Self::CreatePillar => "create-pillar",
            Self::CreateChain => "create-chain",
        }
    }

    /// Noun used in user-facing prompts.
    pub fn noun(&self) -> &'static str {
        match self {
            Self::CreateEvent => "event",
            Self::CreateGoal => "goal",
            Self::CreatePillar => "pillar",
            Self::CreateChain => "chain",
        }
    }

    /// Whether the scheduling-intent heuristic applies.
    pub fn is_scheduling(&self) -> bool {
        matches!(self, Self::CreateEvent | Self::CreateChain)
    }
}

impl std::str::FromStr for ActionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create-event" | "event" => Ok(Self::CreateEvent),
            "create-goal" | "goal" => Ok(Self::CreateGoal),
            "create-pillar" | "pillar" => Ok(Self::CreatePillar),
            "create-chain" | "chain" => Ok(Self::CreateChain),
            other => Err(ValidationError::InvalidValue {
                field: "action".into(),
                message: format!("unknown action type '{other}'"),
            }),
        }
    }
}

/// Outcome of a medium-confidence response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiddleBand {
    /// Queue for explicit approval
    Stage,
    /// Ask for detail, keeping what was understood
    ClarifyWithPartial,
}

/// Routing thresholds for one action type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionThresholds {
    /// At or above: apply directly
    pub direct: f64,
    /// At or above (and below `direct`): the middle band
    pub middle: f64,
    pub middle_band: MiddleBand,
}

impl ActionThresholds {
    const fn new(direct: f64, middle: f64, middle_band: MiddleBand) -> Self {
        Self {
            direct,
            middle,
            middle_band,
        }
    }

    fn validate(&self, name: &str) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.middle) || !(0.0..=1.0).contains(&self.direct) {
            return Err(format!("{name}: thresholds must be within [0, 1]"));
        }
        if self.middle > self.direct {
            return Err(format!("{name}: middle threshold exceeds direct threshold"));
        }
        Ok(())
    }
}

/// Per-action thresholds and composite weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverPolicy {
    pub create_event: ActionThresholds,
    pub create_goal: ActionThresholds,
    pub create_pillar: ActionThresholds,
    pub create_chain: ActionThresholds,
    pub weights: IntentWeights,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self {
            create_event: ActionThresholds::new(0.7, 0.5, MiddleBand::Stage),
            create_goal: ActionThresholds::new(0.8, 0.6, MiddleBand::ClarifyWithPartial),
            create_pillar: ActionThresholds::new(0.85, 0.6, MiddleBand::ClarifyWithPartial),
            create_chain: ActionThresholds::new(0.75, 0.6, MiddleBand::Stage),
            weights: IntentWeights::default(),
        }
    }
}

impl ResolverPolicy {
    pub fn thresholds(&self, action: ActionType) -> &ActionThresholds {
        match action {
            ActionType::CreateEvent => &self.create_event,
            ActionType::CreateGoal => &self.create_goal,
            ActionType::CreatePillar => &self.create_pillar,
            ActionType::CreateChain => &self.create_chain,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.create_event.validate("create_event")?;
        self.create_goal.validate("create_goal")?;
        self.create_pillar.validate("create_pillar")?;
        self.create_chain.validate("create_chain")?;
        self.weights.validate()
    }
}

/// A mutation that was committed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppliedMutation {
    Blocks { blocks: Vec<TimeBlock> },
    Chain { chain: Chain, blocks: Vec<TimeBlock> },
    Goal { goal: Goal },
    Pillar { pillar: Pillar },
}

impl AppliedMutation {
    /// Blocks added to the timeline, if any.
    pub fn blocks(&self) -> &[TimeBlock] {
        match self {
            Self::Blocks { blocks } | Self::Chain { blocks, .. } => blocks,
            Self::Goal { .. } | Self::Pillar { .. } => &[],
        }
    }
}

/// Why a suggestion was staged instead of applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StageReason {
    MediumConfidence,
    /// Confidence was high but the placement was refused
    NoRoom(String),
}

/// A suggestion awaiting explicit approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedSuggestion {
    pub id: String,
    pub request: ResolveRequest,
    /// Effective score at staging time
    pub score: f64,
    pub reason: StageReason,
    /// Day whose timeline the suggestion was resolved against
    pub date: NaiveDate,
    pub staged_at: DateTime<Utc>,
}

/// Request for more detail from the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClarificationPrompt {
    pub action: ActionType,
    pub message: String,
    pub score: f64,
    /// What was understood so far
    pub partial: Vec<Suggestion>,
}

/// The resolver's verdict for one response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    ApplyDirectly { mutation: AppliedMutation },
    StageForApproval { staged: StagedSuggestion },
    AskClarification { prompt: ClarificationPrompt },
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ApplyDirectly { .. } => "apply_directly",
            Self::StageForApproval { .. } => "stage_for_approval",
            Self::AskClarification { .. } => "ask_clarification",
        }
    }
}

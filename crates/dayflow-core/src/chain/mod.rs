//! Chains: reusable, ordered sequences of activities.
//!
//! A chain is a template; placing it onto a timeline produces one block per
//! step. See [`ChainPlacer`] for the layout rules.

mod placer;

pub use placer::{Adjacency, ChainPlacer};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::timeline::{Energy, MAX_BLOCK_SECONDS};

/// Completions after which a chain counts as a routine.
pub const ROUTINE_THRESHOLD: u32 = 3;

/// Descriptive shape of a chain. Does not affect placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlowPattern {
    #[default]
    Waterfall,
    Spiral,
    Ripple,
    Wave,
}

/// One step of a chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStep {
    pub title: String,
    pub duration_seconds: i64,
    #[serde(default)]
    pub energy: Energy,
    #[serde(default)]
    pub glyph: String,
}

impl ChainStep {
    /// # Errors
    /// Returns an error if `duration` is not strictly positive or is longer
    /// than a day.
    pub fn new(
        title: impl Into<String>,
        duration: Duration,
        energy: Energy,
        glyph: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let seconds = duration.num_seconds();
        if seconds <= 0 {
            return Err(ValidationError::NonPositiveDuration {
                field: "chain step duration".into(),
                seconds,
            });
        }
        if seconds > MAX_BLOCK_SECONDS {
            return Err(ValidationError::DurationTooLong {
                field: "chain step duration".into(),
                seconds,
            });
        }
        Ok(Self {
            title: title.into(),
            duration_seconds: seconds,
            energy,
            glyph: glyph.into(),
        })
    }

    pub fn duration(&self) -> Duration {
        Duration::seconds(self.duration_seconds)
    }
}

/// A named, ordered sequence of steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub steps: Vec<ChainStep>,
    #[serde(default)]
    pub flow_pattern: FlowPattern,
    #[serde(default)]
    pub completion_count: u32,
}

impl Chain {
    pub fn new(name: impl Into<String>, flow_pattern: FlowPattern) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            steps: Vec::new(),
            flow_pattern,
            completion_count: 0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Append a step; order of insertion is the order of execution.
    pub fn with_step(mut self, step: ChainStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn push_step(&mut self, step: ChainStep) {
        self.steps.push(step);
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sum of step durations, without buffers.
    pub fn total_duration(&self) -> Duration {
        Duration::seconds(self.steps.iter().map(|s| s.duration_seconds).sum())
    }

    /// First step start to last step end, with `buffer` between steps.
    pub fn span(&self, buffer: Duration) -> Duration {
        let gaps = self.steps.len().saturating_sub(1) as i32;
        self.total_duration() + buffer * gaps
    }

    /// Count one successful placement. Returns true when this completion
    /// promotes the chain to routine.
    pub fn record_completion(&mut self, threshold: u32) -> bool {
        let was_routine = self.completion_count >= threshold;
        self.completion_count = self.completion_count.saturating_add(1);
        !was_routine && self.completion_count >= threshold
    }

    pub fn is_routine_at(&self, threshold: u32) -> bool {
        self.completion_count >= threshold
    }

    pub fn is_routine(&self) -> bool {
        self.is_routine_at(ROUTINE_THRESHOLD)
    }
}

/// Built-in chains available for template expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainTemplate {
    MorningRoutine,
    DeepWork,
    EveningWindDown,
}

impl ChainTemplate {
    pub fn all() -> [ChainTemplate; 3] {
        [Self::MorningRoutine, Self::DeepWork, Self::EveningWindDown]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MorningRoutine => "Morning Routine",
            Self::DeepWork => "Deep Work",
            Self::EveningWindDown => "Evening Wind-Down",
        }
    }

    /// Expand into a fresh chain with a new identifier.
    pub fn expand(&self) -> Chain {
        let steps: &[(&str, i64, Energy, &str)] = match self {
            Self::MorningRoutine => &[
                ("Wake & hydrate", 10, Energy::Sunrise, "💧"),
                ("Stretch", 15, Energy::Sunrise, "🧘"),
                ("Breakfast", 20, Energy::Sunrise, "🍳"),
                ("Plan the day", 10, Energy::Sunrise, "📝"),
            ],
            Self::DeepWork => &[
                ("Prep", 15, Energy::Daylight, "🧭"),
                ("Focus block", 90, Energy::Daylight, "🎯"),
                ("Review", 15, Energy::Daylight, "🔍"),
            ],
            Self::EveningWindDown => &[
                ("Tidy up", 15, Energy::Moonlight, "🧹"),
                ("Reflect", 10, Energy::Moonlight, "📓"),
                ("Read", 30, Energy::Moonlight, "📖"),
            ],
        };
        let flow = match self {
            Self::MorningRoutine => FlowPattern::Waterfall,
            Self::DeepWork => FlowPattern::Wave,
            Self::EveningWindDown => FlowPattern::Ripple,
        };

        steps.iter().fold(
            Chain::new(self.display_name(), flow),
            |chain, &(title, minutes, energy, glyph)| {
                chain.with_step(ChainStep {
                    title: title.to_string(),
                    duration_seconds: minutes * 60,
                    energy,
                    glyph: glyph.to_string(),
                })
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(title: &str, minutes: i64) -> ChainStep {
        ChainStep::new(title, Duration::minutes(minutes), Energy::Daylight, "•").unwrap()
    }

    #[test]
    fn total_and_span() {
        let chain = Chain::new("c", FlowPattern::Spiral)
            .with_step(step("Prep", 15))
            .with_step(step("Work", 60))
            .with_step(step("Wrap", 10));
        assert_eq!(chain.total_duration(), Duration::minutes(85));
        assert_eq!(chain.span(Duration::minutes(5)), Duration::minutes(95));
        assert_eq!(Chain::new("e", FlowPattern::Wave).span(Duration::minutes(5)), Duration::zero());
    }

    #[test]
    fn step_rejects_zero_duration() {
        assert!(ChainStep::new("x", Duration::zero(), Energy::Sunrise, "").is_err());
        assert!(matches!(
            ChainStep::new("x", Duration::days(2), Energy::Sunrise, ""),
            Err(ValidationError::DurationTooLong { .. })
        ));
    }

    #[test]
    fn promotion_happens_once_at_threshold() {
        let mut chain = Chain::new("c", FlowPattern::Waterfall);
        assert!(!chain.record_completion(3));
        assert!(!chain.record_completion(3));
        assert!(chain.record_completion(3));
        assert!(chain.is_routine());
        assert!(!chain.record_completion(3));
        assert_eq!(chain.completion_count, 4);
    }

    #[test]
    fn templates_expand_in_order() {
        for template in ChainTemplate::all() {
            let chain = template.expand();
            assert!(!chain.is_empty());
            assert_eq!(chain.name, template.display_name());
            assert_eq!(chain.completion_count, 0);
        }
        let deep = ChainTemplate::DeepWork.expand();
        let titles: Vec<_> = deep.steps.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Prep", "Focus block", "Review"]);
        assert_eq!(deep.total_duration(), Duration::minutes(120));
    }

    #[test]
    fn chain_record_round_trips() {
        let mut chain = ChainTemplate::MorningRoutine.expand();
        chain.completion_count = 2;
        let json = serde_json::to_string(&chain).unwrap();
        assert!(json.contains("\"flow_pattern\":\"waterfall\""));
        let decoded: Chain = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, chain);
    }
}

//! Scheduling-intent scoring.
//!
//! Combines the raw AI confidence with signals read from the request into
//! a weighted average. The effective score is the larger of the two, so
//! the heuristic can promote a medium confidence but never demote one.

use serde::{Deserialize, Serialize};

use super::parser::{has_scheduling_intent, has_urgency, parse_time_of_day};
use super::Suggestion;

/// Weights of the composite score. They need not sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentWeights {
    pub confidence: f64,
    pub intent: f64,
    pub explicit_time: f64,
    pub urgency: f64,
    pub specificity: f64,
}

impl Default for IntentWeights {
    fn default() -> Self {
        Self {
            confidence: 0.5,
            intent: 0.2,
            explicit_time: 0.15,
            urgency: 0.05,
            specificity: 0.1,
        }
    }
}

impl IntentWeights {
    fn total(&self) -> f64 {
        self.confidence + self.intent + self.explicit_time + self.urgency + self.specificity
    }

    pub fn validate(&self) -> Result<(), String> {
        let all = [
            self.confidence,
            self.intent,
            self.explicit_time,
            self.urgency,
            self.specificity,
        ];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("weights must be finite and non-negative".into());
        }
        if self.confidence <= 0.0 {
            return Err("confidence weight must be positive".into());
        }
        Ok(())
    }
}

/// Signals observed in one request
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IntentSignals {
    pub scheduling_intent: bool,
    pub explicit_time: bool,
    pub urgency: bool,
    /// 1.0 for a single concrete suggestion, 0.0 otherwise
    pub specificity: f64,
}

impl IntentSignals {
    pub fn from_request(text: &str, suggestions: &[Suggestion]) -> Self {
        Self {
            scheduling_intent: has_scheduling_intent(text),
            explicit_time: parse_time_of_day(text).is_some()
                || suggestions.iter().any(|s| s.start_time.is_some()),
            urgency: has_urgency(text),
            specificity: if suggestions.len() == 1 { 1.0 } else { 0.0 },
        }
    }

    /// Weighted average of `confidence` and the observed signals.
    pub fn composite(&self, confidence: f64, weights: &IntentWeights) -> f64 {
        let flag = |on: bool| if on { 1.0 } else { 0.0 };
        let sum = weights.confidence * confidence
            + weights.intent * flag(self.scheduling_intent)
            + weights.explicit_time * flag(self.explicit_time)
            + weights.urgency * flag(self.urgency)
            + weights.specificity * self.specificity;
        let total = weights.total();
        if total > 0.0 {
            sum / total
        } else {
            confidence
        }
    }

    /// Score used for routing: never below `confidence`.
    pub fn effective(&self, confidence: f64, weights: &IntentWeights) -> f64 {
        let confidence = confidence.clamp(0.0, 1.0);
        self.composite(confidence, weights)
            .max(confidence)
            .clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn one() -> Vec<Suggestion> {
        vec![Suggestion::new("Dentist", Duration::minutes(60), 0.6)]
    }

    #[test]
    fn strong_signals_lift_medium_confidence() {
        let signals = IntentSignals::from_request("Schedule the dentist at 3pm", &one());
        assert!(signals.scheduling_intent && signals.explicit_time);
        let score = signals.effective(0.6, &IntentWeights::default());
        assert!((score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn weak_signals_never_lower_confidence() {
        let signals = IntentSignals::from_request("hmm", &[]);
        assert_eq!(signals, IntentSignals::default());
        assert_eq!(signals.effective(0.9, &IntentWeights::default()), 0.9);
    }

    #[test]
    fn suggestion_start_counts_as_explicit_time() {
        let mut suggestions = one();
        suggestions[0].start_time = Some(chrono::Utc::now());
        let signals = IntentSignals::from_request("dentist", &suggestions);
        assert!(signals.explicit_time);
    }

    #[test]
    fn weights_validation() {
        assert!(IntentWeights::default().validate().is_ok());
        let negative = IntentWeights {
            urgency: -0.1,
            ..IntentWeights::default()
        };
        assert!(negative.validate().is_err());
    }
}

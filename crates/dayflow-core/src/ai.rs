//! Boundary to the AI collaborator.
//!
//! The service is an opaque oracle: text and context go in, a response
//! with suggestions and a confidence comes out. Only the round-trip is
//! async; resolution happens afterwards on the caller's mutation path.

use std::time::Duration as StdDuration;

use async_trait::async_trait;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AiError;
use crate::suggestion::{ActionType, ResolveRequest, Suggestion};
use crate::timeline::{DayTimeline, TimeBlock};

/// What the service is told about the day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiContext {
    pub date: Option<NaiveDate>,
    pub now: Option<DateTime<Utc>>,
    #[serde(default)]
    pub blocks: Vec<TimeBlock>,
    /// Names of due pillars, most overdue first
    #[serde(default)]
    pub due_pillars: Vec<String>,
}

impl AiContext {
    pub fn for_day(timeline: &DayTimeline, now: DateTime<Utc>) -> Self {
        Self {
            date: Some(timeline.date()),
            now: Some(now),
            blocks: timeline.blocks().to_vec(),
            due_pillars: Vec::new(),
        }
    }

    pub fn with_due_pillars(mut self, names: Vec<String>) -> Self {
        self.due_pillars = names;
        self
    }
}

/// One answer from the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    #[serde(default)]
    pub text: String,
    pub confidence: f64,
    #[serde(default)]
    pub action_type: Option<ActionType>,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    /// Items the service already created on its side, passed through as-is
    #[serde(default)]
    pub created_items: Vec<serde_json::Value>,
    /// Name for the created chain/goal/pillar
    #[serde(default)]
    pub title: Option<String>,
}

impl AiResponse {
    /// Check the fields the resolver depends on.
    pub fn validate(&self) -> Result<(), AiError> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(AiError::MalformedResponse(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        if self.action_type.is_some() && self.suggestions.is_empty() && self.title.is_none() {
            return Err(AiError::MalformedResponse(
                "action without suggestions or title".into(),
            ));
        }
        Ok(())
    }

    /// Resolver input for this response, if it asks for an action at all.
    pub fn to_request(&self, request_text: &str) -> Option<ResolveRequest> {
        let action = self.action_type?;
        Some(ResolveRequest {
            action,
            suggestions: self.suggestions.clone(),
            confidence: self.confidence,
            request_text: request_text.to_string(),
            title: self.title.clone(),
        })
    }
}

/// An AI backend.
///
/// Implementations own their transport; the core never talks to the
/// network itself.
#[async_trait]
pub trait AiService: Send + Sync {
    /// Unique identifier (e.g. "local", "remote").
    fn name(&self) -> &str;

    async fn process_message(&self, text: &str, context: &AiContext) -> Result<AiResponse, AiError>;
}

/// Run one request under `timeout`, then validate the answer.
///
/// Timing out drops the in-flight future, which is the only cancellation
/// the service sees.
pub async fn round_trip<S: AiService + ?Sized>(
    service: &S,
    text: &str,
    context: &AiContext,
    timeout: StdDuration,
) -> Result<AiResponse, AiError> {
    tracing::debug!(service = service.name(), "sending AI request");
    let response = tokio::time::timeout(timeout, service.process_message(text, context))
        .await
        .map_err(|_| AiError::Timeout {
            timeout_secs: timeout.as_secs(),
        })??;
    response.validate()?;
    tracing::debug!(
        service = service.name(),
        confidence = response.confidence,
        suggestions = response.suggestions.len(),
        "AI response received"
    );
    Ok(response)
}

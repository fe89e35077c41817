//! The planner's library of chains, pillars and goals.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::Chain;
use crate::error::{CoreError, Result};
use crate::pillar::Pillar;

/// A longer-horizon objective that blocks may link to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    pub fn new(title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: String::new(),
            target_date: None,
            created_at,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_target_date(mut self, date: NaiveDate) -> Self {
        self.target_date = Some(date);
        self
    }
}

/// Everything that outlives a single day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub chains: Vec<Chain>,
    #[serde(default)]
    pub pillars: Vec<Pillar>,
    #[serde(default)]
    pub goals: Vec<Goal>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain(&self, id: &str) -> Option<&Chain> {
        self.chains.iter().find(|c| c.id == id)
    }

    pub fn chain_mut(&mut self, id: &str) -> Result<&mut Chain> {
        self.chains
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| CoreError::not_found("chain", id))
    }

    /// Add or replace a chain by id.
    pub fn upsert_chain(&mut self, chain: Chain) {
        match self.chains.iter_mut().find(|c| c.id == chain.id) {
            Some(existing) => *existing = chain,
            None => self.chains.push(chain),
        }
    }

    pub fn pillar(&self, id: &str) -> Option<&Pillar> {
        self.pillars.iter().find(|p| p.id == id)
    }

    /// Add a validated pillar.
    pub fn add_pillar(&mut self, pillar: Pillar) -> Result<()> {
        pillar.validate()?;
        self.pillars.push(pillar);
        Ok(())
    }

    pub fn goal(&self, id: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    pub fn add_goal(&mut self, goal: Goal) {
        self.goals.push(goal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainTemplate;
    use crate::pillar::Cadence;

    #[test]
    fn upsert_replaces_by_id() {
        let mut library = Library::new();
        let mut chain = ChainTemplate::DeepWork.expand();
        library.upsert_chain(chain.clone());
        chain.completion_count = 2;
        library.upsert_chain(chain.clone());
        assert_eq!(library.chains.len(), 1);
        assert_eq!(library.chain(&chain.id).unwrap().completion_count, 2);
    }

    #[test]
    fn missing_chain_is_not_found() {
        let mut library = Library::new();
        assert!(matches!(
            library.chain_mut("nope"),
            Err(CoreError::NotFound { kind: "chain", .. })
        ));
    }

    #[test]
    fn add_pillar_validates() {
        let mut library = Library::new();
        let mut pillar = Pillar::new("Exercise", Cadence::Daily, 30, 60).unwrap();
        pillar.min_duration_minutes = 90;
        assert!(library.add_pillar(pillar).is_err());
        assert!(library.pillars.is_empty());
    }

    #[test]
    fn goal_round_trips() {
        let goal = Goal::new("Run a marathon", Utc::now())
            .with_description("Autumn race")
            .with_target_date(NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        let json = serde_json::to_string(&goal).unwrap();
        let decoded: Goal = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, goal);
    }
}

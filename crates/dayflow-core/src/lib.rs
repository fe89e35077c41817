//! # Dayflow Core Library
//!
//! Scheduling core for a day planner built from time blocks, reusable
//! chains, recurring pillars and AI suggestions. It follows a CLI-first
//! philosophy: every operation is available through the standalone
//! `dayflow` binary, and any GUI is a thin layer over this library.
//!
//! ## Architecture
//!
//! - **Timeline**: the day's ordered, non-overlapping blocks, mutated only
//!   through validated commands, plus the gap finder
//! - **Chains**: ordered activity sequences laid out with buffers
//! - **Pillars**: recurring commitments with computed due status and slot search
//! - **Backfill**: reconstruction of a plausible day from a ranked library
//! - **Suggestions**: confidence-based routing of AI responses
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`DayTimeline`]: one day's blocks and the non-overlap invariant
//! - [`ChainPlacer`]: atomic chain placement
//! - [`PillarTracker`]: due checks and slot search
//! - [`SuggestionResolver`]: apply / stage / clarify routing
//! - [`DayPlanner`]: the single writer tying everything together

pub mod ai;
pub mod backfill;
pub mod chain;
pub mod error;
pub mod library;
pub mod pillar;
pub mod planner;
pub mod storage;
pub mod suggestion;
pub mod timeline;

pub use ai::{AiContext, AiResponse, AiService};
pub use backfill::{ActivityTemplate, BackfillReconstructor};
pub use chain::{Adjacency, Chain, ChainPlacer, ChainStep, ChainTemplate, FlowPattern};
pub use error::{AiError, ConfigError, CoreError, PlacementError, ValidationError};
pub use library::{Goal, Library};
pub use pillar::{Cadence, DuePillar, Pillar, PillarTracker, Slot, TimeWindow};
pub use planner::{DayPlanner, PlannerSnapshot};
pub use storage::Config;
pub use suggestion::{
    ActionType, AppliedMutation, Decision, ResolveRequest, StagedSuggestion, Suggestion,
    SuggestionResolver,
};
pub use timeline::{
    DayTimeline, Energy, GapFinder, GlassState, TimeBlock, TimeGap, TimelineCommand,
};

//! Chain placement onto a day timeline.
//!
//! Steps are laid out back to back from a start time with a fixed buffer
//! between consecutive steps. The whole span is checked before anything is
//! written, so a chain is either placed completely or not at all.

use chrono::{DateTime, Duration, Utc};

use super::Chain;
use crate::error::PlacementError;
use crate::storage::ChainConfig;
use crate::timeline::{DayTimeline, GapFinder, GlassState, TimeBlock};

/// Where to put a chain relative to an existing block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adjacency {
    /// End one buffer before the block starts
    Before(String),
    /// Start one buffer after the block ends
    After(String),
}

impl Adjacency {
    pub fn target_id(&self) -> &str {
        match self {
            Self::Before(id) | Self::After(id) => id,
        }
    }
}

/// Lays out chains as contiguous block sequences.
#[derive(Debug, Clone)]
pub struct ChainPlacer {
    buffer: Duration,
    min_adjacent_gap: Duration,
    routine_threshold: u32,
    state: GlassState,
}

impl ChainPlacer {
    /// Placer with default settings (5 minute buffer, routine at 3)
    pub fn new() -> Self {
        Self::from_config(&ChainConfig::default())
    }

    pub fn from_config(config: &ChainConfig) -> Self {
        Self {
            buffer: Duration::minutes(config.buffer_minutes),
            min_adjacent_gap: Duration::minutes(config.min_adjacent_gap_minutes),
            routine_threshold: config.routine_threshold,
            state: GlassState::Solid,
        }
    }

    pub fn with_buffer(mut self, buffer: Duration) -> Self {
        self.buffer = buffer;
        self
    }

    /// Provenance tag given to produced blocks
    pub fn with_state(mut self, state: GlassState) -> Self {
        self.state = state;
        self
    }

    pub fn buffer(&self) -> Duration {
        self.buffer
    }

    /// Compute the blocks `chain` would occupy from `start`, without
    /// touching the timeline.
    ///
    /// # Errors
    /// `EmptyChain` for a chain without steps, `OutsideDay` if the span
    /// leaves the calendar day, `OverlapConflict` if any part of the span
    /// (buffers included) is occupied.
    pub fn plan(
        &self,
        chain: &Chain,
        start: DateTime<Utc>,
        timeline: &DayTimeline,
    ) -> Result<Vec<TimeBlock>, PlacementError> {
        if chain.is_empty() {
            return Err(PlacementError::EmptyChain(chain.name.clone()));
        }

        let end = start + chain.span(self.buffer);
        if !timeline.contains_range(start, end) {
            return Err(PlacementError::OutsideDay { start, end });
        }
        timeline.check_free(start, end, None)?;

        let mut cursor = start;
        let mut blocks = Vec::with_capacity(chain.steps.len());
        for step in &chain.steps {
            let block = TimeBlock::try_new(&step.title, cursor, step.duration())
                .map_err(|e| PlacementError::InvalidBlock {
                    id: chain.id.clone(),
                    reason: e.to_string(),
                })?
                .with_energy(step.energy)
                .with_glyph(&step.glyph)
                .with_state(self.state)
                .with_chain(&chain.id);
            cursor = block.end_time() + self.buffer;
            blocks.push(block);
        }

        tracing::debug!(
            chain = %chain.name,
            start = %start,
            end = %end,
            steps = blocks.len(),
            "planned chain"
        );
        Ok(blocks)
    }

    /// Place `chain` at `start` and count the completion.
    ///
    /// On error the timeline and the chain are unchanged.
    pub fn place(
        &self,
        chain: &mut Chain,
        start: DateTime<Utc>,
        timeline: &mut DayTimeline,
    ) -> Result<Vec<TimeBlock>, PlacementError> {
        let blocks = self.plan(chain, start, timeline)?;
        timeline.insert_all(blocks.clone())?;

        let promoted = chain.record_completion(self.routine_threshold);
        tracing::info!(
            chain = %chain.name,
            steps = blocks.len(),
            completions = chain.completion_count,
            "placed chain"
        );
        if promoted {
            tracing::info!(chain = %chain.name, "chain promoted to routine");
        }
        Ok(blocks)
    }

    /// Start time for placing `chain` next to an existing block.
    ///
    /// # Errors
    /// `UnknownBlock` if the target is missing, `OverlapConflict` if the
    /// target itself overlaps a neighbour, `InsufficientGap` if the gap on
    /// that side cannot hold the chain plus its separating buffer.
    pub fn adjacent_start(
        &self,
        chain: &Chain,
        adjacency: &Adjacency,
        timeline: &DayTimeline,
    ) -> Result<DateTime<Utc>, PlacementError> {
        if chain.is_empty() {
            return Err(PlacementError::EmptyChain(chain.name.clone()));
        }

        let target = timeline
            .get(adjacency.target_id())
            .ok_or_else(|| PlacementError::UnknownBlock(adjacency.target_id().to_string()))?;

        let finder = GapFinder::new().with_min_slot(self.min_adjacent_gap);
        let span = chain.span(self.buffer);
        let required = (span + self.buffer).max(self.min_adjacent_gap);

        let available = match adjacency {
            Adjacency::Before(_) => finder.gap_before(target, timeline)?,
            Adjacency::After(_) => finder.gap_after(target, timeline)?,
        };
        if available < required {
            return Err(PlacementError::InsufficientGap {
                available,
                required,
            });
        }

        Ok(match adjacency {
            Adjacency::Before(_) => target.start_time - span - self.buffer,
            Adjacency::After(_) => target.end_time() + self.buffer,
        })
    }

    /// Place `chain` directly before or after an existing block.
    pub fn insert(
        &self,
        chain: &mut Chain,
        adjacency: &Adjacency,
        timeline: &mut DayTimeline,
    ) -> Result<Vec<TimeBlock>, PlacementError> {
        let start = self.adjacent_start(chain, adjacency, timeline)?;
        self.place(chain, start, timeline)
    }

    pub fn insert_before(
        &self,
        chain: &mut Chain,
        target_id: &str,
        timeline: &mut DayTimeline,
    ) -> Result<Vec<TimeBlock>, PlacementError> {
        self.insert(chain, &Adjacency::Before(target_id.to_string()), timeline)
    }

    pub fn insert_after(
        &self,
        chain: &mut Chain,
        target_id: &str,
        timeline: &mut DayTimeline,
    ) -> Result<Vec<TimeBlock>, PlacementError> {
        self.insert(chain, &Adjacency::After(target_id.to_string()), timeline)
    }
}

impl Default for ChainPlacer {
    fn default() -> Self {
        Self::new()
    }
}

//! Day timelines and free-time detection.
//!
//! This module provides:
//! - The `TimeBlock` record and its provenance/energy tags
//! - `DayTimeline`, the per-day store that owns the non-overlap invariant
//! - Gap detection around blocks and across a day

mod block;
mod gap;
mod store;

pub use block::{Energy, GlassState, TimeBlock, MAX_BLOCK_SECONDS};
pub use gap::{GapFinder, GapSize, TimeGap};
pub use store::{DayTimeline, TimelineCommand};

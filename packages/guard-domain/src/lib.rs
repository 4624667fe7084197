//! Scenario reconstruction over sparsely sampled detection records.
//!
//! Records returned by a tag query are indexed by identity, merged into scenarios through their
//! recorded neighbor frames, sorted by frame ordinal, and expanded into the dense frame sequence
//! that full-resolution retrieval needs.

pub mod expansion;
pub mod frame;
pub mod grouping;
pub mod index;
pub mod ingest;
pub mod predicate;
pub mod record;
pub mod scenario;

mod error;

pub use error::{Error, Result};
pub use expansion::{RangeExpander, SingleFramePolicy};
pub use frame::FrameFormat;
pub use grouping::{AdjacencyGrouper, group_records};
pub use index::RecordIndex;
pub use ingest::{CapturedFrame, SampledDetection};
pub use predicate::{Comparison, TagPredicate};
pub use record::{DetectionRecord, IdentityKey, IdentityRef};
pub use scenario::{Scenario, build_scenarios, sort_scenario};

use crate::record::IdentityKey;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Duplicate detection identity {key}.")]
	DuplicateIdentity { key: IdentityKey },
	#[error("Duplicate frame {frame} in scenario {collector_id}/{collection_seq}.")]
	DuplicateFrame { collector_id: String, collection_seq: String, frame: u64 },
	#[error("Malformed frame range: end {end} precedes start {start}.")]
	MalformedRange { start: u64, end: u64 },
	#[error("Invalid frame identifier {frame:?}.")]
	InvalidFrame { frame: String },
	#[error("Frame {value} does not fit a width of {width} digits.")]
	FrameOverflow { value: u64, width: u32 },
	#[error("Scenario must contain at least one record.")]
	EmptyScenario,
	#[error("Scenario mixes sessions {expected} and {found}.")]
	MixedScenario { expected: String, found: String },
	#[error("Invalid tag predicate: {message}")]
	InvalidPredicate { message: String },
	#[error("Drop rate must be greater than zero.")]
	InvalidDropRate,
}

use crate::{Error, FrameFormat, Result, Scenario};

/// What to retrieve for a scenario holding a single sampled frame.
///
/// A lone sample has no second endpoint to bound a range. `Drop` skips it entirely; `Window`
/// retrieves `radius` frames on each side of it instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SingleFramePolicy {
	#[default]
	Drop,
	Window { radius: u64 },
}
impl SingleFramePolicy {
	pub fn from_config(cfg: &guard_config::Scenario) -> Self {
		match cfg.single_frame.as_str() {
			"window" => Self::Window { radius: cfg.single_frame_window },
			_ => Self::Drop,
		}
	}
}

/// Expands sorted scenarios into every frame identifier between their sampled endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeExpander {
	format: FrameFormat,
	single_frame: SingleFramePolicy,
}
impl RangeExpander {
	pub fn new(format: FrameFormat, single_frame: SingleFramePolicy) -> Self {
		Self { format, single_frame }
	}

	pub fn from_config(cfg: &guard_config::Scenario) -> Self {
		Self::new(FrameFormat::from_config(cfg), SingleFramePolicy::from_config(cfg))
	}

	pub fn format(&self) -> &FrameFormat {
		&self.format
	}

	pub fn single_frame(&self) -> SingleFramePolicy {
		self.single_frame
	}

	pub fn expand(&self, scenario: &Scenario) -> Result<Vec<String>> {
		self.expand_values(scenario.frame_values())
	}

	/// Expands frame identifiers in the order given. Out-of-order input fails.
	pub fn expand_frames<S>(&self, frames: &[S]) -> Result<Vec<String>>
	where
		S: AsRef<str>,
	{
		let values = frames
			.iter()
			.map(|frame| self.format.parse(frame.as_ref()))
			.collect::<Result<Vec<_>>>()?;

		self.expand_values(&values)
	}

	/// Every pair `[start, end)` except the last, which is closed so the final sample is
	/// emitted exactly once.
	pub fn expand_values(&self, frames: &[u64]) -> Result<Vec<String>> {
		match frames {
			[] => Ok(Vec::new()),
			[single] => self.expand_single(*single),
			_ => {
				let last_pair = frames.len() - 2;
				let mut out = Vec::new();

				for (position, pair) in frames.windows(2).enumerate() {
					self.expand_pair(pair[0], pair[1], position == last_pair, &mut out)?;
				}

				Ok(out)
			},
		}
	}

	pub fn expand_pair(
		&self,
		start: u64,
		end: u64,
		inclusive: bool,
		out: &mut Vec<String>,
	) -> Result<()> {
		if end < start {
			return Err(Error::MalformedRange { start, end });
		}

		if inclusive {
			self.push_range(start, end, out)
		} else if end > start {
			self.push_range(start, end - 1, out)
		} else {
			Ok(())
		}
	}

	fn expand_single(&self, frame: u64) -> Result<Vec<String>> {
		match self.single_frame {
			SingleFramePolicy::Drop => Ok(Vec::new()),
			SingleFramePolicy::Window { radius } => {
				let (first, last) = (frame.saturating_sub(radius), frame.saturating_add(radius));
				let mut out = Vec::new();

				self.push_range(first, last, &mut out)?;

				Ok(out)
			},
		}
	}

	/// Appends `first..=last`. The upper bound is checked against the width before anything is
	/// emitted.
	fn push_range(&self, first: u64, last: u64, out: &mut Vec<String>) -> Result<()> {
		self.format.format(last)?;

		for value in first..=last {
			out.push(self.format.format(value)?);
		}

		Ok(())
	}
}

use crate::{Error, Result};

/// Fixed-width, zero-padded decimal frame identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFormat {
	width: u32,
}
impl FrameFormat {
	pub const DEFAULT_WIDTH: u32 = 10;

	pub fn new(width: u32) -> Self {
		Self { width }
	}

	pub fn from_config(cfg: &guard_config::Scenario) -> Self {
		Self::new(cfg.frame_width)
	}

	pub fn width(&self) -> u32 {
		self.width
	}

	/// Ordinal value of `frame`. Accepts any non-empty run of ASCII digits.
	pub fn parse(&self, frame: &str) -> Result<u64> {
		if frame.is_empty() || !frame.bytes().all(|byte| byte.is_ascii_digit()) {
			return Err(Error::InvalidFrame { frame: frame.to_string() });
		}

		let digits = frame.trim_start_matches('0');

		if digits.is_empty() {
			return Ok(0);
		}

		digits.parse::<u64>().map_err(|_| Error::InvalidFrame { frame: frame.to_string() })
	}

	/// Re-pads `frame` to this width, so `"5"` and `"0000000005"` name the same frame.
	pub fn canonical(&self, frame: &str) -> Result<String> {
		self.format(self.parse(frame)?)
	}

	pub fn format(&self, value: u64) -> Result<String> {
		let rendered = format!("{value:0width$}", width = self.width as usize);

		if rendered.len() > self.width as usize {
			return Err(Error::FrameOverflow { value, width: self.width });
		}

		Ok(rendered)
	}
}
impl Default for FrameFormat {
	fn default() -> Self {
		Self::new(Self::DEFAULT_WIDTH)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_zero_padded_frames() {
		let format = FrameFormat::default();

		assert_eq!(format.parse("0000000100").expect("parse failed"), 100);
		assert_eq!(format.parse("0000000000").expect("parse failed"), 0);
		assert_eq!(format.parse("42").expect("parse failed"), 42);
	}

	#[test]
	fn canonical_repads_to_width() {
		let format = FrameFormat::default();

		assert_eq!(format.canonical("5").expect("canonical failed"), "0000000005");
		assert_eq!(format.canonical("000000000005").expect("canonical failed"), "0000000005");
		assert!(matches!(
			FrameFormat::new(2).canonical("100"),
			Err(Error::FrameOverflow { value: 100, width: 2 })
		));
	}

	#[test]
	fn rejects_non_digit_frames() {
		let format = FrameFormat::default();

		for frame in ["", "00000001a0", "-000000001", " 000000001", "0000000001.png"] {
			assert!(
				matches!(format.parse(frame), Err(Error::InvalidFrame { .. })),
				"Expected {frame:?} to be rejected."
			);
		}
	}

	#[test]
	fn rejects_values_beyond_u64() {
		let format = FrameFormat::default();

		assert!(matches!(
			format.parse("99999999999999999999999"),
			Err(Error::InvalidFrame { .. })
		));
	}

	#[test]
	fn formats_to_configured_width() {
		assert_eq!(FrameFormat::default().format(7).expect("format failed"), "0000000007");
		assert_eq!(FrameFormat::new(6).format(123).expect("format failed"), "000123");
		assert!(matches!(
			FrameFormat::new(3).format(1_000),
			Err(Error::FrameOverflow { value: 1_000, width: 3 })
		));
	}
}

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Comparison {
	#[serde(rename = "$gt")]
	Gt,
	#[serde(rename = "$gte")]
	Gte,
	#[serde(rename = "$lt")]
	Lt,
	#[serde(rename = "$lte")]
	Lte,
	#[serde(rename = "$eq")]
	Eq,
	#[serde(rename = "$ne")]
	Ne,
}
impl Comparison {
	pub fn as_sql(self) -> &'static str {
		match self {
			Self::Gt => ">",
			Self::Gte => ">=",
			Self::Lt => "<",
			Self::Lte => "<=",
			Self::Eq => "=",
			Self::Ne => "<>",
		}
	}
}
impl FromStr for Comparison {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self> {
		match raw.trim().trim_start_matches('$').to_ascii_lowercase().as_str() {
			"gt" => Ok(Self::Gt),
			"gte" => Ok(Self::Gte),
			"lt" => Ok(Self::Lt),
			"lte" => Ok(Self::Lte),
			"eq" => Ok(Self::Eq),
			"ne" => Ok(Self::Ne),
			other => Err(Error::InvalidPredicate {
				message: format!("Unknown comparison operator {other:?}."),
			}),
		}
	}
}
impl fmt::Display for Comparison {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Gt => "gt",
			Self::Gte => "gte",
			Self::Lt => "lt",
			Self::Lte => "lte",
			Self::Eq => "eq",
			Self::Ne => "ne",
		};

		f.write_str(name)
	}
}

/// Conjunction of per-tag count thresholds, e.g. `{"car": {"$gt": 0}}`.
///
/// Tags missing from a record never satisfy a condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagPredicate {
	conditions: BTreeMap<String, BTreeMap<Comparison, u64>>,
}
impl TagPredicate {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, tag: impl Into<String>, op: Comparison, value: u64) -> Self {
		self.insert(tag, op, value);

		self
	}

	pub fn insert(&mut self, tag: impl Into<String>, op: Comparison, value: u64) {
		self.conditions.entry(tag.into()).or_default().insert(op, value);
	}

	/// Parses `tag:op:value` terms, e.g. `car:gt:0` or `traffic light:gte:2`.
	pub fn parse_terms<S>(terms: &[S]) -> Result<Self>
	where
		S: AsRef<str>,
	{
		let mut predicate = Self::new();

		for term in terms {
			let term = term.as_ref();
			let mut parts = term.rsplitn(3, ':');
			let (Some(value), Some(op), Some(tag)) = (parts.next(), parts.next(), parts.next())
			else {
				return Err(Error::InvalidPredicate {
					message: format!("Expected tag:op:value, got {term:?}."),
				});
			};
			let value = value.trim().parse::<u64>().map_err(|_| Error::InvalidPredicate {
				message: format!("Threshold in {term:?} must be a non-negative integer."),
			})?;

			predicate.insert(tag.trim(), op.parse()?, value);
		}

		predicate.validate()?;

		Ok(predicate)
	}

	pub fn validate(&self) -> Result<()> {
		for (tag, ops) in &self.conditions {
			if tag.trim().is_empty() {
				return Err(Error::InvalidPredicate {
					message: "Tag names must be non-empty.".to_string(),
				});
			}
			if ops.is_empty() {
				return Err(Error::InvalidPredicate {
					message: format!("Tag {tag:?} has no conditions."),
				});
			}
		}

		Ok(())
	}

	pub fn is_empty(&self) -> bool {
		self.conditions.is_empty()
	}

	pub fn conditions(&self) -> impl Iterator<Item = (&str, Comparison, u64)> + '_ {
		self.conditions
			.iter()
			.flat_map(|(tag, ops)| ops.iter().map(move |(op, value)| (tag.as_str(), *op, *value)))
	}
}

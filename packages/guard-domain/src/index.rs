use std::collections::{HashMap, hash_map::Entry};

use crate::{DetectionRecord, Error, IdentityRef, Result};

/// Dense arena over a result set: each distinct identity gets the id of its position.
pub struct RecordIndex<'a> {
	records: &'a [DetectionRecord],
	ids: HashMap<IdentityRef<'a>, usize>,
}
impl<'a> RecordIndex<'a> {
	pub fn build(records: &'a [DetectionRecord]) -> Result<Self> {
		let mut ids = HashMap::with_capacity(records.len());

		for (id, record) in records.iter().enumerate() {
			match ids.entry(record.identity()) {
				Entry::Vacant(slot) => {
					slot.insert(id);
				},
				Entry::Occupied(slot) =>
					return Err(Error::DuplicateIdentity { key: slot.key().to_key() }),
			}
		}

		Ok(Self { records, ids })
	}

	pub fn id_of(&self, key: IdentityRef<'a>) -> Option<usize> {
		self.ids.get(&key).copied()
	}

	pub fn record(&self, id: usize) -> &'a DetectionRecord {
		&self.records[id]
	}

	pub fn records(&self) -> &'a [DetectionRecord] {
		self.records
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}

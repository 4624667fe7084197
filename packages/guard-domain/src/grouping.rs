//! Connected components of a result set under recorded neighbor references.
//!
//! Two records belong to the same scenario when one names the other as its `start_frame` or
//! `end_frame`, transitively. References are always resolved inside the referencing record's
//! collector and session, so components never span sessions. References to frames missing from
//! the result set contribute nothing.

use crate::{DetectionRecord, RecordIndex, Result};

/// Disjoint-set forest over dense ids with path compression and union by size.
#[derive(Debug, Clone)]
pub struct AdjacencyGrouper {
	parent: Vec<usize>,
	size: Vec<usize>,
	components: usize,
}
impl AdjacencyGrouper {
	pub fn new(len: usize) -> Self {
		Self { parent: (0..len).collect(), size: vec![1; len], components: len }
	}

	/// Builds the forest for an index by merging every record with its present neighbors.
	pub fn from_index(index: &RecordIndex<'_>) -> Self {
		let mut grouper = Self::new(index.len());

		for (id, record) in index.records().iter().enumerate() {
			let key = record.identity();

			for neighbor in [record.start_frame.as_str(), record.end_frame.as_str()] {
				let Some(other) = index.id_of(key.neighbor(neighbor)) else {
					continue;
				};

				grouper.union(id, other);
			}
		}

		grouper
	}

	pub fn len(&self) -> usize {
		self.parent.len()
	}

	pub fn is_empty(&self) -> bool {
		self.parent.is_empty()
	}

	pub fn find(&mut self, id: usize) -> usize {
		let mut root = id;

		while self.parent[root] != root {
			root = self.parent[root];
		}

		let mut current = id;

		while self.parent[current] != root {
			let next = self.parent[current];

			self.parent[current] = root;
			current = next;
		}

		root
	}

	/// Merges the sets holding `a` and `b`. Returns `false` when they were already joined.
	pub fn union(&mut self, a: usize, b: usize) -> bool {
		let root_a = self.find(a);
		let root_b = self.find(b);

		if root_a == root_b {
			return false;
		}

		let (large, small) = if self.size[root_a] >= self.size[root_b] {
			(root_a, root_b)
		} else {
			(root_b, root_a)
		};

		self.parent[small] = large;
		self.size[large] += self.size[small];
		self.components -= 1;

		true
	}

	pub fn component_count(&self) -> usize {
		self.components
	}

	/// Member ids per component. Members ascend; components are ordered by their smallest
	/// member, so the layout depends only on the partition and the id assignment.
	pub fn into_groups(mut self) -> Vec<Vec<usize>> {
		let mut slot_of_root = vec![usize::MAX; self.len()];
		let mut groups: Vec<Vec<usize>> = Vec::with_capacity(self.components);

		for id in 0..self.len() {
			let root = self.find(id);

			if slot_of_root[root] == usize::MAX {
				slot_of_root[root] = groups.len();

				groups.push(Vec::with_capacity(self.size[root]));
			}

			groups[slot_of_root[root]].push(id);
		}

		groups
	}
}

/// Partitions `records` into unsorted scenario groups.
///
/// Every input record lands in exactly one group. Fails on a duplicate identity.
pub fn group_records(records: Vec<DetectionRecord>) -> Result<Vec<Vec<DetectionRecord>>> {
	let groups = {
		let index = RecordIndex::build(&records)?;

		AdjacencyGrouper::from_index(&index).into_groups()
	};
	let mut slots = records.into_iter().map(Some).collect::<Vec<_>>();

	Ok(groups
		.into_iter()
		.map(|ids| ids.into_iter().filter_map(|id| slots[id].take()).collect())
		.collect())
}

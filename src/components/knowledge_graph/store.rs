//! Node position cache that outlives the canvas component.
//!
//! Layout only places nodes the store does not know yet, so remounting the
//! graph (or switching pages) keeps whatever arrangement the user dragged
//! the nodes into.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::types::{NodeId, Position};

/// Key-value store of last-known node positions.
pub trait PositionStore {
	/// Last stored position of `id`, if any.
	fn get(&self, id: &str) -> Option<Position>;
	/// Stores (or overwrites) the position of `id`.
	fn set(&mut self, id: &str, position: Position);
}

/// Plain in-memory store. No eviction.
#[derive(Clone, Debug, Default)]
pub struct MemoryPositionStore {
	positions: HashMap<NodeId, Position>,
}

impl MemoryPositionStore {
	pub fn len(&self) -> usize {
		self.positions.len()
	}
}

impl PositionStore for MemoryPositionStore {
	fn get(&self, id: &str) -> Option<Position> {
		self.positions.get(id).copied()
	}

	fn set(&mut self, id: &str, position: Position) {
		match self.positions.get_mut(id) {
			Some(slot) => *slot = position,
			None => {
				self.positions.insert(id.to_owned(), position);
			}
		}
	}
}

/// Cloneable handle to one [`MemoryPositionStore`]; every clone sees the
/// same positions. Provided app-wide through Leptos context.
#[derive(Clone, Debug, Default)]
pub struct SharedPositionStore {
	inner: Arc<RwLock<MemoryPositionStore>>,
}

impl SharedPositionStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
	}
}

impl PositionStore for SharedPositionStore {
	fn get(&self, id: &str) -> Option<Position> {
		self.inner.read().unwrap_or_else(PoisonError::into_inner).get(id)
	}

	fn set(&mut self, id: &str, position: Position) {
		self.inner
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.set(id, position);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn set_overwrites() {
		let mut store = MemoryPositionStore::default();
		assert_eq!(store.get("pii"), None);
		store.set("pii", Position::new(1.0, 2.0));
		store.set("pii", Position::new(300.0, 300.0));
		assert_eq!(store.get("pii"), Some(Position::new(300.0, 300.0)));
		assert_eq!(store.len(), 1);
	}

	#[test]
	fn shared_handles_see_each_other() {
		let mut a = SharedPositionStore::new();
		let b = a.clone();
		a.set("privacy", Position::new(10.0, -4.0));
		assert_eq!(b.get("privacy"), Some(Position::new(10.0, -4.0)));
		assert_eq!(b.len(), 1);
	}
}

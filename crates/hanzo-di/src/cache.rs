//! Scope-keyed instance cache
//!
//! Scoped instances are remembered under `(scope, binding, generic
//! arguments)`. Entries hold their instance strongly and their scope weakly:
//! once the scope object is dropped the entry is dead, invisible to lookups,
//! and reclaimed by [`Cache::prune`], which deactivates the instance.
//!
//! Deactivation always runs outside the index lock, so strategies and
//! deactivation actions may resolve or release other instances.

use crate::binding::BindingId;
use crate::context::Context;
use crate::instance::{Instance, InstanceReference};
use crate::pipeline::Pipeline;
use crate::scope::ScopeKey;
use crate::service::ServiceType;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
	scope: ScopeKey,
	binding: BindingId,
	generic_arguments: Vec<ServiceType>,
}

struct CacheEntry {
	context: Arc<Context>,
	reference: Arc<InstanceReference>,
}

/// Store of scoped instances
pub struct Cache {
	pipeline: Arc<Pipeline>,
	entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl Cache {
	/// Cache deactivating evicted instances through `pipeline`.
	pub fn new(pipeline: Arc<Pipeline>) -> Self {
		Self {
			pipeline,
			entries: RwLock::new(HashMap::new()),
		}
	}

	/// Live instance remembered for the key, if any.
	pub fn try_get(
		&self,
		scope: &ScopeKey,
		binding: BindingId,
		generic_arguments: &[ServiceType],
	) -> Option<Instance> {
		if !scope.is_alive() {
			return None;
		}
		let key = CacheKey {
			scope: scope.clone(),
			binding,
			generic_arguments: generic_arguments.to_vec(),
		};
		self.entries
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(&key)
			.map(|entry| entry.reference.instance())
	}

	/// Remembers the instance of `context` under `scope`.
	///
	/// The first live entry for a key wins: returns `false`, storing nothing,
	/// when another instance is already remembered for the same key.
	pub fn remember(&self, context: &Arc<Context>, scope: ScopeKey, reference: Arc<InstanceReference>) -> bool {
		let key = CacheKey {
			scope,
			binding: context.binding().id(),
			generic_arguments: context.generic_arguments().to_vec(),
		};

		let replaced = {
			let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
			if entries.get(&key).is_some_and(|_| key.scope.is_alive()) {
				return false;
			}
			entries.insert(
				key,
				CacheEntry {
					context: Arc::clone(context),
					reference,
				},
			)
		};

		if let Some(dead) = replaced {
			self.deactivate(vec![dead]);
		}
		true
	}

	/// Removes the entry remembered with `reference` without deactivating it.
	///
	/// Matches the reference itself, so an entry whose instance was replaced
	/// during activation is still found.
	pub fn forget(&self, reference: &Arc<InstanceReference>) -> bool {
		!self
			.take(|_, entry| Arc::ptr_eq(&entry.reference, reference))
			.is_empty()
	}

	/// Removes and deactivates every entry holding exactly `instance`.
	pub fn release(&self, instance: &Instance) -> bool {
		let released = self.take(|_, entry| entry.reference.instance().ptr_eq(instance));
		let found = !released.is_empty();
		self.deactivate(released);
		found
	}

	/// Removes and deactivates everything owned by `scope`.
	pub fn clear_scope(&self, scope: &ScopeKey) -> usize {
		let cleared = self.take(|key, _| &key.scope == scope);
		let count = cleared.len();
		if count > 0 {
			tracing::debug!(scope = ?scope, count, "scope cleared");
		}
		self.deactivate(cleared);
		count
	}

	/// Removes and deactivates every entry.
	pub fn clear(&self) {
		let cleared: Vec<CacheEntry> = self
			.entries
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.drain()
			.map(|(_, entry)| entry)
			.collect();
		self.deactivate(cleared);
	}

	/// Removes and deactivates entries whose scope was dropped.
	pub fn prune(&self) -> usize {
		let dead = self.take(|key, _| !key.scope.is_alive());
		let count = dead.len();
		self.deactivate(dead);
		self.pipeline.prune();
		tracing::debug!(count, "cache pruned");
		count
	}

	/// Number of stored entries, dead ones included until pruned.
	pub fn len(&self) -> usize {
		self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn take<F>(&self, mut predicate: F) -> Vec<CacheEntry>
	where
		F: FnMut(&CacheKey, &CacheEntry) -> bool,
	{
		let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
		let keys: Vec<CacheKey> = entries
			.iter()
			.filter(|(key, entry)| predicate(key, entry))
			.map(|(key, _)| key.clone())
			.collect();
		keys.iter().filter_map(|key| entries.remove(key)).collect()
	}

	fn deactivate(&self, entries: Vec<CacheEntry>) {
		for entry in entries {
			if let Err(error) = self.pipeline.deactivate(&entry.context, &entry.reference) {
				tracing::warn!(
					instance = ?entry.reference.instance(),
					error = %error,
					"deactivation failed"
				);
			}
		}
	}
}

impl fmt::Debug for Cache {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Cache").field("entries", &self.len()).finish()
	}
}

//! Scope keys
//!
//! A scope is any shared object whose lifetime bounds the lifetime of the
//! instances cached under it: the kernel for singletons, a per-thread token
//! for thread scope, an [`ActivationBlock`](crate::ActivationBlock) or any
//! user object. The engine only ever holds scopes weakly.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

/// Identity of a scope object, held weakly.
///
/// Two keys are equal when they point at the same allocation. Because the
/// key keeps the allocation itself reserved (only the value is dropped),
/// an address cannot be reused by another scope while any key to it exists.
///
/// # Examples
///
/// ```
/// use hanzo_di::ScopeKey;
/// use std::sync::Arc;
///
/// let request_scope = Arc::new(String::from("request-42"));
/// let key = ScopeKey::of(&request_scope);
///
/// assert_eq!(key, ScopeKey::of(&request_scope));
/// assert!(key.is_alive());
///
/// drop(request_scope);
/// assert!(!key.is_alive());
/// ```
#[derive(Clone)]
pub struct ScopeKey {
	handle: Weak<dyn Any + Send + Sync>,
	type_name: &'static str,
}

impl ScopeKey {
	/// Key for a scope object of any type.
	pub fn of<T: Any + Send + Sync>(scope: &Arc<T>) -> Self {
		let handle: Weak<T> = Arc::downgrade(scope);
		Self {
			handle,
			type_name: std::any::type_name::<T>(),
		}
	}

	pub(crate) fn from_weak<T: Any + Send + Sync>(scope: &Weak<T>) -> Self {
		let handle: Weak<T> = scope.clone();
		Self {
			handle,
			type_name: std::any::type_name::<T>(),
		}
	}

	/// Key for an already type-erased scope object.
	pub fn from_dyn(scope: &Arc<dyn Any + Send + Sync>) -> Self {
		Self {
			handle: Arc::downgrade(scope),
			type_name: "dyn Any",
		}
	}

	/// Whether the scope object is still alive.
	pub fn is_alive(&self) -> bool {
		self.handle.strong_count() > 0
	}

	/// Address of the scope allocation.
	pub fn id(&self) -> usize {
		self.handle.as_ptr() as *const () as usize
	}

	/// Rust type name of the scope object.
	pub fn type_name(&self) -> &'static str {
		self.type_name
	}
}

impl PartialEq for ScopeKey {
	fn eq(&self, other: &Self) -> bool {
		Weak::ptr_eq(&self.handle, &other.handle)
	}
}

impl Eq for ScopeKey {}

impl Hash for ScopeKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id().hash(state);
	}
}

impl fmt::Debug for ScopeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"ScopeKey({} @ {:#x}{})",
			self.type_name,
			self.id(),
			if self.is_alive() { "" } else { ", dropped" }
		)
	}
}

/// Token standing for the current thread in thread-scoped bindings
#[derive(Debug)]
pub struct ThreadScope {
	_private: (),
}

thread_local! {
	static THREAD_SCOPE: Arc<ThreadScope> = Arc::new(ThreadScope { _private: () });
}

/// Scope key of the calling thread; it dies when the thread exits.
pub fn current_thread_scope() -> ScopeKey {
	THREAD_SCOPE.with(ScopeKey::of)
}

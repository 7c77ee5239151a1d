//! Binding metadata used by request constraints

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Name plus arbitrary typed tags attached to a binding.
///
/// Metadata never influences construction; it only exists so that request
/// constraints can pick one binding among several for the same service.
///
/// # Examples
///
/// ```
/// use hanzo_di::BindingMetadata;
///
/// let mut metadata = BindingMetadata::new();
/// metadata.set_name("primary");
/// metadata.set("weight", 3u32);
///
/// assert_eq!(metadata.name(), Some("primary"));
/// assert_eq!(metadata.get::<u32>("weight"), Some(&3));
/// assert_eq!(metadata.get::<String>("weight"), None);
/// ```
#[derive(Clone, Default)]
pub struct BindingMetadata {
	name: Option<String>,
	entries: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl BindingMetadata {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn set_name(&mut self, name: impl Into<String>) {
		self.name = Some(name.into());
	}

	/// Stores a tag, replacing any previous value under `key`.
	pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
		self.entries.insert(key.into(), Arc::new(value));
	}

	/// Reads a tag, `None` when absent or of another type.
	pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
		self.entries.get(key).and_then(|value| value.downcast_ref::<T>())
	}

	pub fn has(&self, key: &str) -> bool {
		self.entries.contains_key(key)
	}
}

impl fmt::Debug for BindingMetadata {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut keys: Vec<&String> = self.entries.keys().collect();
		keys.sort();
		f.debug_struct("BindingMetadata")
			.field("name", &self.name)
			.field("keys", &keys)
			.finish()
	}
}

//! Activation pipeline
//!
//! The pipeline runs every registered [`ActivationStrategy`] in registration
//! order when an instance is activated, and again when it is deactivated.
//! An [`ActivationCache`] remembers which instances went through either step
//! so that each happens at most once per instance.

mod strategies;

pub use strategies::{
	BindingActionStrategy, DisposableStrategy, InitializableStrategy, MethodInjectionStrategy,
	PropertyInjectionStrategy, StartableStrategy,
};

use crate::context::Context;
use crate::error::ActivationResult;
use crate::instance::{Component, Instance, InstanceReference};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// One step of activation and deactivation
#[cfg_attr(test, mockall::automock)]
pub trait ActivationStrategy: Send + Sync {
	/// Name used in traces.
	fn name(&self) -> &'static str;

	fn activate(&self, _context: &Arc<Context>, _reference: &InstanceReference) -> ActivationResult<()> {
		Ok(())
	}

	fn deactivate(&self, _context: &Arc<Context>, _reference: &InstanceReference) -> ActivationResult<()> {
		Ok(())
	}
}

/// Instances already activated or deactivated, tracked by identity.
///
/// Entries hold the instance weakly; [`ActivationCache::prune`] forgets
/// instances that no longer exist.
#[derive(Default)]
pub struct ActivationCache {
	activated: Mutex<HashMap<usize, Weak<dyn Component>>>,
	deactivated: Mutex<HashMap<usize, Weak<dyn Component>>>,
}

impl ActivationCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_activated(&self, instance: &Instance) -> bool {
		Self::contains(&self.activated, instance)
	}

	pub fn is_deactivated(&self, instance: &Instance) -> bool {
		Self::contains(&self.deactivated, instance)
	}

	pub fn add_activated(&self, instance: &Instance) {
		Self::insert(&self.activated, instance);
	}

	pub fn add_deactivated(&self, instance: &Instance) {
		Self::insert(&self.deactivated, instance);
	}

	/// Drops records of instances that no longer exist.
	pub fn prune(&self) {
		for set in [&self.activated, &self.deactivated] {
			set.lock()
				.unwrap_or_else(PoisonError::into_inner)
				.retain(|_, weak| weak.strong_count() > 0);
		}
	}

	/// Forgets every record.
	pub fn clear(&self) {
		self.activated.lock().unwrap_or_else(PoisonError::into_inner).clear();
		self.deactivated.lock().unwrap_or_else(PoisonError::into_inner).clear();
	}

	fn contains(set: &Mutex<HashMap<usize, Weak<dyn Component>>>, instance: &Instance) -> bool {
		set.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.get(&instance.address())
			.is_some_and(|weak| weak.strong_count() > 0)
	}

	fn insert(set: &Mutex<HashMap<usize, Weak<dyn Component>>>, instance: &Instance) {
		set.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.insert(instance.address(), instance.downgrade());
	}
}

impl fmt::Debug for ActivationCache {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let activated = self.activated.lock().unwrap_or_else(PoisonError::into_inner).len();
		let deactivated = self.deactivated.lock().unwrap_or_else(PoisonError::into_inner).len();
		f.debug_struct("ActivationCache")
			.field("activated", &activated)
			.field("deactivated", &deactivated)
			.finish()
	}
}

/// Ordered list of activation strategies
pub struct Pipeline {
	strategies: Vec<Arc<dyn ActivationStrategy>>,
	activation_cache: Option<ActivationCache>,
}

impl Pipeline {
	/// Pipeline running `strategies` in order, tracking activations when
	/// `track_activations` is set.
	pub fn new(strategies: Vec<Arc<dyn ActivationStrategy>>, track_activations: bool) -> Self {
		Self {
			strategies,
			activation_cache: track_activations.then(ActivationCache::new),
		}
	}

	/// Built-in strategies: property injection, method injection,
	/// initialization, start/stop, binding actions, disposal.
	pub fn default_strategies() -> Vec<Arc<dyn ActivationStrategy>> {
		vec![
			Arc::new(PropertyInjectionStrategy),
			Arc::new(MethodInjectionStrategy),
			Arc::new(InitializableStrategy),
			Arc::new(StartableStrategy),
			Arc::new(BindingActionStrategy),
			Arc::new(DisposableStrategy),
		]
	}

	pub fn strategies(&self) -> &[Arc<dyn ActivationStrategy>] {
		&self.strategies
	}

	pub fn activation_cache(&self) -> Option<&ActivationCache> {
		self.activation_cache.as_ref()
	}

	/// Runs every strategy's activation step, stopping at the first failure.
	pub fn activate(&self, context: &Arc<Context>, reference: &InstanceReference) -> ActivationResult<()> {
		let instance = reference.instance();
		if self.activation_cache.as_ref().is_some_and(|cache| cache.is_activated(&instance)) {
			return Ok(());
		}

		for strategy in &self.strategies {
			tracing::trace!(strategy = strategy.name(), instance = ?instance, "activate");
			strategy.activate(context, reference)?;
		}

		if let Some(cache) = &self.activation_cache {
			cache.add_activated(&instance);
			cache.add_activated(&reference.instance());
		}
		Ok(())
	}

	/// Runs every strategy's deactivation step and reports the first failure.
	pub fn deactivate(&self, context: &Arc<Context>, reference: &InstanceReference) -> ActivationResult<()> {
		let instance = reference.instance();
		if self.activation_cache.as_ref().is_some_and(|cache| cache.is_deactivated(&instance)) {
			return Ok(());
		}
		if let Some(cache) = &self.activation_cache {
			cache.add_deactivated(&instance);
		}

		let mut first_error = None;
		for strategy in &self.strategies {
			tracing::trace!(strategy = strategy.name(), instance = ?instance, "deactivate");
			if let Err(error) = strategy.deactivate(context, reference) {
				first_error.get_or_insert(error);
			}
		}
		first_error.map_or(Ok(()), Err)
	}

	/// Forgets activation records of dropped instances.
	pub fn prune(&self) {
		if let Some(cache) = &self.activation_cache {
			cache.prune();
		}
	}
}

impl Default for Pipeline {
	fn default() -> Self {
		Self::new(Self::default_strategies(), true)
	}
}

impl fmt::Debug for Pipeline {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let names: Vec<&str> = self.strategies.iter().map(|strategy| strategy.name()).collect();
		f.debug_struct("Pipeline")
			.field("strategies", &names)
			.field("activation_cache", &self.activation_cache)
			.finish()
	}
}

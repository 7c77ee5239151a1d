//! Resolution root
//!
//! The [`Kernel`] owns the bindings and the shared collaborators (cache,
//! planner, pipeline, formatter) and turns requests into contexts. It is
//! always handled through an `Arc`, which also serves as the scope of
//! singleton bindings: dropping or disposing the kernel deactivates every
//! instance it still caches.
//!
//! ```
//! use hanzo_di::{Binding, Component, Instance, Kernel, Plan, PlanRegistry, ServiceType};
//! use std::sync::Arc;
//!
//! struct Sword;
//! impl Component for Sword {}
//!
//! let plans = Arc::new(PlanRegistry::new());
//! plans.register(
//!     Plan::builder(ServiceType::of::<Sword>())
//!         .constructor(vec![], |_| Ok(Instance::new(Sword)))
//!         .build(),
//! );
//! let kernel = Kernel::builder().plans(plans).build().unwrap();
//! kernel.bind(Binding::builder(ServiceType::of::<Sword>()).in_singleton_scope().build());
//!
//! let first = kernel.get(&ServiceType::of::<Sword>()).unwrap();
//! let second = kernel.get(&ServiceType::of::<Sword>()).unwrap();
//! assert_eq!(first, second);
//! ```

use crate::binding::Binding;
use crate::cache::Cache;
use crate::context::Context;
use crate::error::{ActivationError, ActivationResult};
use crate::formatter::{DefaultExceptionFormatter, ExceptionFormatter};
use crate::instance::{Component, Instance};
use crate::parameter::Parameter;
use crate::pipeline::{ActivationStrategy, Pipeline};
use crate::planning::{PlanRegistry, Planner};
use crate::precedence::BindingPrecedenceComparer;
use crate::request::Request;
use crate::scope::ScopeKey;
use crate::service::ServiceType;
use crate::settings::KernelSettings;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

/// Resolution root owning bindings and shared collaborators
pub struct Kernel {
	this: Weak<Kernel>,
	settings: Arc<KernelSettings>,
	bindings: RwLock<HashMap<ServiceType, Vec<Arc<Binding>>>>,
	cache: Arc<Cache>,
	pipeline: Arc<Pipeline>,
	planner: Arc<dyn Planner>,
	formatter: Arc<dyn ExceptionFormatter>,
	disposed: AtomicBool,
}

impl Kernel {
	/// Kernel with default settings, an empty plan registry and the built-in strategies.
	pub fn new() -> Arc<Self> {
		Self::assemble(
			KernelSettings::default(),
			Arc::new(PlanRegistry::new()),
			Arc::new(DefaultExceptionFormatter),
			Pipeline::default_strategies(),
		)
	}

	pub fn with_settings(settings: KernelSettings) -> ActivationResult<Arc<Self>> {
		Self::builder().settings(settings).build()
	}

	pub fn builder() -> KernelBuilder {
		KernelBuilder::default()
	}

	fn assemble(
		settings: KernelSettings,
		planner: Arc<dyn Planner>,
		formatter: Arc<dyn ExceptionFormatter>,
		strategies: Vec<Arc<dyn ActivationStrategy>>,
	) -> Arc<Self> {
		let pipeline = Arc::new(Pipeline::new(strategies, settings.activation_cache_enabled));
		let cache = Arc::new(Cache::new(Arc::clone(&pipeline)));
		Arc::new_cyclic(|this| Self {
			this: this.clone(),
			settings: Arc::new(settings),
			bindings: RwLock::new(HashMap::new()),
			cache,
			pipeline,
			planner,
			formatter,
			disposed: AtomicBool::new(false),
		})
	}

	pub fn settings(&self) -> &KernelSettings {
		&self.settings
	}

	pub fn cache(&self) -> &Arc<Cache> {
		&self.cache
	}

	pub fn pipeline(&self) -> &Arc<Pipeline> {
		&self.pipeline
	}

	pub fn planner(&self) -> &Arc<dyn Planner> {
		&self.planner
	}

	pub fn formatter(&self) -> &Arc<dyn ExceptionFormatter> {
		&self.formatter
	}

	/// Scope of singleton bindings: the kernel itself.
	pub fn singleton_scope(&self) -> ScopeKey {
		ScopeKey::from_weak(&self.this)
	}

	pub fn is_disposed(&self) -> bool {
		self.disposed.load(Ordering::Acquire)
	}

	fn ensure_live(&self) -> ActivationResult<()> {
		if self.is_disposed() {
			return Err(ActivationError::KernelDisposed);
		}
		Ok(())
	}

	pub fn bind(&self, binding: Arc<Binding>) {
		tracing::debug!(binding = %binding.description(), "bind");
		self.bindings
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.entry(binding.service().clone())
			.or_default()
			.push(binding);
	}

	/// Removes every binding registered for `service`; returns how many there were.
	pub fn unbind(&self, service: &ServiceType) -> usize {
		self.bindings
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.remove(service)
			.map_or(0, |removed| removed.len())
	}

	/// Bindings registered for `service`, followed by those of its generic definition.
	pub fn bindings_for(&self, service: &ServiceType) -> Vec<Arc<Binding>> {
		let bindings = self.bindings.read().unwrap_or_else(PoisonError::into_inner);
		let mut found: Vec<Arc<Binding>> = bindings.get(service).cloned().unwrap_or_default();
		if service.is_closed_generic()
			&& let Some(definition) = service.generic_definition()
			&& let Some(open) = bindings.get(&definition)
		{
			found.extend(open.iter().cloned());
		}
		found
	}

	/// Root request for `service`.
	pub fn request(&self, service: ServiceType) -> Request {
		Request::new(service)
	}

	fn matching_bindings(&self, request: &Request) -> Vec<Arc<Binding>> {
		self.bindings_for(request.service())
			.into_iter()
			.filter(|binding| binding.matches(request) && request.satisfies_constraint(binding.metadata()))
			.collect()
	}

	fn is_self_bindable(&self, request: &Request) -> bool {
		let service = request.service();
		self.settings.implicit_self_binding
			&& request.constraint().is_none()
			&& !service.is_interface()
			&& !service.is_open_generic()
			&& self.planner.has_plan(service)
	}

	fn implicit_self_binding(&self, request: &Request) -> Option<Arc<Binding>> {
		if !self.is_self_bindable(request) {
			return None;
		}
		let mut bindings = self.bindings.write().unwrap_or_else(PoisonError::into_inner);
		let registered = bindings.entry(request.service().clone()).or_default();
		if let Some(existing) = registered.iter().find(|binding| binding.is_implicit()) {
			return Some(Arc::clone(existing));
		}
		let binding = Binding::builder(request.service().clone())
			.to_self()
			.implicit()
			.build();
		tracing::debug!(service = %request.service(), "implicit self-binding");
		registered.push(Arc::clone(&binding));
		Some(binding)
	}

	/// Whether resolving `request` would find at least one binding.
	pub fn can_resolve(&self, request: &Request) -> bool {
		!self.is_disposed() && (!self.matching_bindings(request).is_empty() || self.is_self_bindable(request))
	}

	/// Builds the context resolving `request` through `binding`.
	pub fn context_for(&self, request: Arc<Request>, binding: Arc<Binding>) -> ActivationResult<Arc<Context>> {
		Context::builder()
			.kernel_weak(self.this.clone())
			.request(request)
			.binding(binding)
			.cache(Arc::clone(&self.cache))
			.planner(Arc::clone(&self.planner))
			.pipeline(Arc::clone(&self.pipeline))
			.formatter(Arc::clone(&self.formatter))
			.settings(Arc::clone(&self.settings))
			.build()
	}

	/// Resolves `request`.
	///
	/// A unique request yields at most one instance and fails when several
	/// bindings share the top precedence. A multiple request yields one
	/// instance per matching binding, leaving implicit bindings out whenever
	/// an explicit one matches. Optional requests with no match yield nothing.
	pub fn resolve(&self, request: Request) -> ActivationResult<Vec<Instance>> {
		self.ensure_live()?;
		if request.depth() > self.settings.max_resolution_depth {
			return Err(ActivationError::MaxDepthExceeded(request.depth()));
		}
		let request = Arc::new(request);

		let mut candidates = self.matching_bindings(&request);
		if candidates.is_empty()
			&& let Some(implicit) = self.implicit_self_binding(&request)
		{
			candidates.push(implicit);
		}

		if candidates.is_empty() {
			if request.is_optional() {
				return Ok(Vec::new());
			}
			return Err(ActivationError::NoMatchingBindings {
				service: request.service().to_string(),
				message: self.formatter.no_matching_bindings(&request),
			});
		}

		if request.is_unique() {
			let mut tier = BindingPrecedenceComparer::top_tier(&candidates);
			if tier.len() > 1 {
				return Err(ActivationError::AmbiguousBindings {
					service: request.service().to_string(),
					candidates: tier.iter().map(|binding| binding.description()).collect(),
					message: self.formatter.ambiguous_bindings(&request, &tier),
				});
			}
			let Some(binding) = tier.pop() else {
				return Ok(Vec::new());
			};
			let context = self.context_for(request, binding)?;
			return Ok(context.resolve()?.into_iter().collect());
		}

		if candidates.iter().any(|binding| !binding.is_implicit()) {
			candidates.retain(|binding| !binding.is_implicit());
		}
		let mut instances = Vec::with_capacity(candidates.len());
		for binding in candidates {
			let context = self.context_for(Arc::clone(&request), binding)?;
			instances.extend(context.resolve()?);
		}
		Ok(instances)
	}

	/// Resolves a unique request to at most one instance.
	pub fn resolve_single(&self, request: Request) -> ActivationResult<Option<Instance>> {
		Ok(self.resolve(request)?.into_iter().next())
	}

	fn require(&self, service: &ServiceType, instance: Option<Instance>) -> ActivationResult<Instance> {
		instance.ok_or_else(|| ActivationError::ProviderReturnedNull {
			service: service.to_string(),
			message: self.formatter.no_instance_resolved(service),
		})
	}

	pub fn get(&self, service: &ServiceType) -> ActivationResult<Instance> {
		let instance = self.resolve_single(self.request(service.clone()))?;
		self.require(service, instance)
	}

	/// Like [`Kernel::get`], but nothing to resolve is not an error.
	pub fn try_get(&self, service: &ServiceType) -> ActivationResult<Option<Instance>> {
		self.resolve_single(self.request(service.clone()).optional())
	}

	/// Resolves the binding named `name`.
	pub fn get_named(&self, service: &ServiceType, name: &str) -> ActivationResult<Instance> {
		let instance = self.resolve_single(self.request(service.clone()).named(name))?;
		self.require(service, instance)
	}

	/// Resolves every matching binding.
	pub fn get_all(&self, service: &ServiceType) -> ActivationResult<Vec<Instance>> {
		self.resolve(self.request(service.clone()).multiple().optional())
	}

	pub fn get_with_parameters(
		&self,
		service: &ServiceType,
		parameters: Vec<Parameter>,
	) -> ActivationResult<Instance> {
		let instance = self.resolve_single(self.request(service.clone()).with_parameters(parameters))?;
		self.require(service, instance)
	}

	/// Resolves `service` and views the instance as `T`.
	pub fn get_as<T: Component>(&self, service: &ServiceType) -> ActivationResult<Arc<T>> {
		self.get(service)?.downcast::<T>()
	}

	/// Deactivates a cached instance and forgets it.
	pub fn release(&self, instance: &Instance) -> bool {
		self.cache.release(instance)
	}

	pub fn clear_cache(&self) {
		self.cache.clear();
	}

	/// Deactivates instances whose scope was dropped.
	pub fn prune_cache(&self) -> usize {
		self.cache.prune()
	}

	/// Scope whose instances are deactivated when the returned block is dropped.
	pub fn begin_block(&self) -> ActivationResult<ActivationBlock> {
		self.ensure_live()?;
		let kernel = self.this.upgrade().ok_or(ActivationError::KernelDisposed)?;
		Ok(ActivationBlock::new(kernel))
	}

	/// Spawns the periodic cache pruner on the current Tokio runtime.
	#[cfg(feature = "pruner")]
	pub fn start_pruner(&self) -> crate::pruner::CachePruner {
		crate::pruner::CachePruner::start(&self.cache, self.settings.cache_pruning_interval())
	}

	/// Deactivates every cached instance and refuses further resolution. Idempotent.
	pub fn dispose(&self) {
		if self.disposed.swap(true, Ordering::AcqRel) {
			return;
		}
		tracing::debug!(cached = self.cache.len(), "disposing kernel");
		self.cache.clear();
		self.bindings
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.clear();
		if let Some(activations) = self.pipeline.activation_cache() {
			activations.clear();
		}
	}
}

impl Drop for Kernel {
	fn drop(&mut self) {
		self.dispose();
	}
}

impl fmt::Debug for Kernel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let bindings: usize = self
			.bindings
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.values()
			.map(Vec::len)
			.sum();
		f.debug_struct("Kernel")
			.field("settings", &self.settings)
			.field("bindings", &bindings)
			.field("cache", &self.cache)
			.field("disposed", &self.is_disposed())
			.finish()
	}
}

/// Builder of a [`Kernel`]
#[derive(Default)]
pub struct KernelBuilder {
	settings: Option<KernelSettings>,
	planner: Option<Arc<dyn Planner>>,
	formatter: Option<Arc<dyn ExceptionFormatter>>,
	strategies: Option<Vec<Arc<dyn ActivationStrategy>>>,
	extra_strategies: Vec<Arc<dyn ActivationStrategy>>,
}

impl KernelBuilder {
	pub fn settings(mut self, settings: KernelSettings) -> Self {
		self.settings = Some(settings);
		self
	}

	pub fn planner(mut self, planner: Arc<dyn Planner>) -> Self {
		self.planner = Some(planner);
		self
	}

	/// Uses `plans` as the planner.
	pub fn plans(self, plans: Arc<PlanRegistry>) -> Self {
		self.planner(plans)
	}

	pub fn formatter(mut self, formatter: Arc<dyn ExceptionFormatter>) -> Self {
		self.formatter = Some(formatter);
		self
	}

	/// Replaces the built-in strategies.
	pub fn strategies(mut self, strategies: Vec<Arc<dyn ActivationStrategy>>) -> Self {
		self.strategies = Some(strategies);
		self
	}

	/// Appends a strategy after the others.
	pub fn strategy(mut self, strategy: Arc<dyn ActivationStrategy>) -> Self {
		self.extra_strategies.push(strategy);
		self
	}

	pub fn build(self) -> ActivationResult<Arc<Kernel>> {
		let settings = self.settings.unwrap_or_default();
		settings.validate()?;
		let mut strategies = self.strategies.unwrap_or_else(Pipeline::default_strategies);
		strategies.extend(self.extra_strategies);
		Ok(Kernel::assemble(
			settings,
			self.planner.unwrap_or_else(|| Arc::new(PlanRegistry::new())),
			self.formatter.unwrap_or_else(|| Arc::new(DefaultExceptionFormatter)),
			strategies,
		))
	}
}

/// Token standing for one activation block
#[derive(Debug)]
pub struct BlockScope {
	_private: (),
}

/// Resolution root whose instances live as long as the block.
///
/// Every request issued through the block, and every child request they
/// spawn, is scoped to the block. Dropping the block deactivates those
/// instances.
pub struct ActivationBlock {
	kernel: Arc<Kernel>,
	token: Arc<BlockScope>,
}

impl ActivationBlock {
	fn new(kernel: Arc<Kernel>) -> Self {
		Self {
			kernel,
			token: Arc::new(BlockScope { _private: () }),
		}
	}

	pub fn kernel(&self) -> &Arc<Kernel> {
		&self.kernel
	}

	pub fn scope(&self) -> ScopeKey {
		ScopeKey::of(&self.token)
	}

	/// Root request for `service` scoped to this block.
	pub fn request(&self, service: ServiceType) -> Request {
		let scope = self.scope();
		Request::new(service).with_scope_override(move || Some(scope.clone()))
	}

	pub fn resolve(&self, request: Request) -> ActivationResult<Vec<Instance>> {
		let scope = self.scope();
		self.kernel
			.resolve(request.with_scope_override(move || Some(scope.clone())))
	}

	pub fn get(&self, service: &ServiceType) -> ActivationResult<Instance> {
		let instance = self.kernel.resolve_single(self.request(service.clone()))?;
		self.kernel.require(service, instance)
	}

	pub fn try_get(&self, service: &ServiceType) -> ActivationResult<Option<Instance>> {
		self.kernel
			.resolve_single(self.request(service.clone()).optional())
	}

	pub fn get_all(&self, service: &ServiceType) -> ActivationResult<Vec<Instance>> {
		self.kernel
			.resolve(self.request(service.clone()).multiple().optional())
	}

	pub fn get_as<T: Component>(&self, service: &ServiceType) -> ActivationResult<Arc<T>> {
		self.get(service)?.downcast::<T>()
	}
}

impl Drop for ActivationBlock {
	fn drop(&mut self) {
		self.kernel.cache().clear_scope(&self.scope());
	}
}

impl fmt::Debug for ActivationBlock {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ActivationBlock")
			.field("scope", &self.scope())
			.finish()
	}
}

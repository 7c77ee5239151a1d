//! Resolution contexts
//!
//! A [`Context`] is one attempt to resolve a request through one binding.
//! It carries everything the attempt needs (the request, the selected
//! binding, the merged parameters, the plan, the inferred generic arguments)
//! and implements the resolution algorithm in [`Context::resolve`]:
//!
//! 1. compute the scope, from the request's override or the binding
//! 2. return the cached instance on a scoped cache hit
//! 3. push the binding onto the active stack, failing on a cycle
//! 4. create the instance through the binding's provider
//! 5. remember a scoped instance before it is activated
//! 6. handle a null instance per the null-injection setting
//! 7. attach the plan of the concrete type
//! 8. activate through the pipeline, rolling the cache back on failure

use crate::binding::Binding;
use crate::cache::Cache;
use crate::error::{ActivationError, ActivationResult};
use crate::formatter::ExceptionFormatter;
use crate::generics::infer_generic_arguments;
use crate::instance::{Instance, InstanceReference};
use crate::kernel::Kernel;
use crate::parameter::Parameter;
use crate::pipeline::Pipeline;
use crate::planning::{Plan, Planner, Target};
use crate::request::Request;
use crate::scope::ScopeKey;
use crate::service::ServiceType;
use crate::settings::KernelSettings;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, Weak};

/// One resolution attempt of a request through a binding
pub struct Context {
	kernel: Weak<Kernel>,
	request: Arc<Request>,
	binding: Arc<Binding>,
	cache: Arc<Cache>,
	planner: Arc<dyn Planner>,
	pipeline: Arc<Pipeline>,
	formatter: Arc<dyn ExceptionFormatter>,
	settings: Arc<KernelSettings>,
	parameters: OnceLock<Vec<Parameter>>,
	plan: OnceLock<Arc<Plan>>,
	instance: RwLock<Option<Instance>>,
	generic_arguments: Vec<ServiceType>,
	has_inferred_generic_arguments: bool,
}

impl Context {
	pub fn builder() -> ContextBuilder {
		ContextBuilder::default()
	}

	/// Owning kernel; fails once the kernel has been dropped.
	pub fn kernel(&self) -> ActivationResult<Arc<Kernel>> {
		self.kernel.upgrade().ok_or(ActivationError::KernelDisposed)
	}

	pub fn request(&self) -> &Arc<Request> {
		&self.request
	}

	pub fn binding(&self) -> &Arc<Binding> {
		&self.binding
	}

	pub fn cache(&self) -> &Arc<Cache> {
		&self.cache
	}

	pub fn planner(&self) -> &Arc<dyn Planner> {
		&self.planner
	}

	pub fn pipeline(&self) -> &Arc<Pipeline> {
		&self.pipeline
	}

	pub fn formatter(&self) -> &Arc<dyn ExceptionFormatter> {
		&self.formatter
	}

	pub fn settings(&self) -> &KernelSettings {
		&self.settings
	}

	/// Request parameters followed by binding parameters, computed once.
	pub fn parameters(&self) -> &[Parameter] {
		self.parameters.get_or_init(|| {
			self.request
				.parameters()
				.iter()
				.chain(self.binding.parameters())
				.cloned()
				.collect()
		})
	}

	/// First parameter overriding `target`.
	pub fn parameter_for(&self, target: &Target) -> Option<&Parameter> {
		self.parameters()
			.iter()
			.find(|parameter| parameter.applies_to(target))
	}

	pub fn plan(&self) -> Option<Arc<Plan>> {
		self.plan.get().cloned()
	}

	/// Attaches `plan` unless one is already attached; returns whether it was.
	pub fn set_plan(&self, plan: Arc<Plan>) -> bool {
		self.plan.set(plan).is_ok()
	}

	/// Instance produced by this context, once created.
	pub fn instance(&self) -> Option<Instance> {
		self.instance
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	pub fn generic_arguments(&self) -> &[ServiceType] {
		&self.generic_arguments
	}

	/// `true` whenever the binding is an open template, even with no argument inferred.
	pub fn has_inferred_generic_arguments(&self) -> bool {
		self.has_inferred_generic_arguments
	}

	/// Scope owning this context's instance; `None` for transient.
	///
	/// An override yielding no scope falls back to the binding's own scope.
	pub fn scope(&self) -> Option<ScopeKey> {
		self.request
			.scope_override()
			.or_else(|| self.binding.scope(self))
	}

	/// Request for `target`, issued while this context injects it.
	pub fn create_child_request(self: &Arc<Self>, target: Target) -> Request {
		Request::child(self, target)
	}

	/// Value for `target`: an overriding parameter wins, otherwise a child
	/// request is resolved through the kernel.
	pub fn resolve_target(self: &Arc<Self>, target: &Target) -> ActivationResult<Option<Instance>> {
		if let Some(parameter) = self.parameter_for(target) {
			return Ok(parameter.value(self, target));
		}
		let kernel = self.kernel()?;
		kernel.resolve_single(self.create_child_request(target.clone()))
	}

	/// Resolves the instance for this context.
	///
	/// Returns `Ok(None)` only for a null instance with null injection
	/// allowed. When activation fails after a scoped instance was
	/// remembered, the cache entry is removed (without deactivation) and the
	/// activation error is returned unchanged.
	pub fn resolve(self: &Arc<Self>) -> ActivationResult<Option<Instance>> {
		let scope = self.scope();

		if let Some(scope) = &scope
			&& let Some(cached) =
				self.cache
					.try_get(scope, self.binding.id(), &self.generic_arguments)
		{
			tracing::debug!(service = %self.request.service(), instance = ?cached, "cache hit");
			self.set_instance(cached.clone());
			return Ok(Some(cached));
		}

		let _guard = match self.request.enter(&self.binding) {
			Ok(guard) => guard,
			Err(active) => return Err(self.cycle_error(&active)),
		};

		tracing::debug!(
			service = %self.request.service(),
			binding = %self.binding.description(),
			depth = self.request.depth(),
			"resolving"
		);

		let provider = self.binding.provider(self);
		let Some(instance) = provider.create(self)? else {
			return self.resolve_null();
		};
		self.set_instance(instance.clone());

		let reference = Arc::new(InstanceReference::new(instance.clone()));
		let remembered = match scope {
			Some(scope) => self.cache.remember(self, scope, Arc::clone(&reference)),
			None => false,
		};

		if self.plan.get().is_none() {
			self.set_plan(self.planner.plan(&instance.concrete_type()));
		}

		if let Err(error) = self.pipeline.activate(self, &reference) {
			if remembered {
				tracing::debug!(instance = ?instance, error = %error, "activation failed, cache rolled back");
				self.cache.forget(&reference);
			}
			return Err(error);
		}

		let instance = reference.instance();
		self.set_instance(instance.clone());
		Ok(Some(instance))
	}

	fn resolve_null(&self) -> ActivationResult<Option<Instance>> {
		if !self.settings.allow_null_injection {
			return Err(ActivationError::ProviderReturnedNull {
				service: self.request.service().to_string(),
				message: self.formatter.provider_returned_null(self),
			});
		}
		if self.plan.get().is_none() {
			self.set_plan(self.planner.plan(self.request.service()));
		}
		Ok(None)
	}

	fn cycle_error(&self, active: &[Arc<Binding>]) -> ActivationError {
		let start = active
			.iter()
			.position(|binding| binding.id() == self.binding.id())
			.unwrap_or(0);
		let path: Vec<String> = active[start..]
			.iter()
			.chain(std::iter::once(&self.binding))
			.map(|binding| binding.service().to_string())
			.collect();
		let path = path.join(" -> ");
		ActivationError::CircularDependency {
			message: self.formatter.cyclical_dependency(self, &path),
			path,
		}
	}

	fn set_instance(&self, instance: Instance) {
		*self.instance.write().unwrap_or_else(PoisonError::into_inner) = Some(instance);
	}
}

impl fmt::Debug for Context {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Context")
			.field("service", self.request.service())
			.field("binding", &self.binding.id())
			.field("generic_arguments", &self.generic_arguments)
			.field("has_plan", &self.plan.get().is_some())
			.finish_non_exhaustive()
	}
}

/// Builder of a [`Context`]; every collaborator except settings is required.
#[derive(Default)]
pub struct ContextBuilder {
	kernel: Option<Weak<Kernel>>,
	request: Option<Arc<Request>>,
	binding: Option<Arc<Binding>>,
	cache: Option<Arc<Cache>>,
	planner: Option<Arc<dyn Planner>>,
	pipeline: Option<Arc<Pipeline>>,
	formatter: Option<Arc<dyn ExceptionFormatter>>,
	settings: Option<Arc<KernelSettings>>,
}

impl ContextBuilder {
	pub fn kernel(mut self, kernel: &Arc<Kernel>) -> Self {
		self.kernel = Some(Arc::downgrade(kernel));
		self
	}

	pub(crate) fn kernel_weak(mut self, kernel: Weak<Kernel>) -> Self {
		self.kernel = Some(kernel);
		self
	}

	pub fn request(mut self, request: Arc<Request>) -> Self {
		self.request = Some(request);
		self
	}

	pub fn binding(mut self, binding: Arc<Binding>) -> Self {
		self.binding = Some(binding);
		self
	}

	pub fn cache(mut self, cache: Arc<Cache>) -> Self {
		self.cache = Some(cache);
		self
	}

	pub fn planner(mut self, planner: Arc<dyn Planner>) -> Self {
		self.planner = Some(planner);
		self
	}

	pub fn pipeline(mut self, pipeline: Arc<Pipeline>) -> Self {
		self.pipeline = Some(pipeline);
		self
	}

	pub fn formatter(mut self, formatter: Arc<dyn ExceptionFormatter>) -> Self {
		self.formatter = Some(formatter);
		self
	}

	pub fn settings(mut self, settings: Arc<KernelSettings>) -> Self {
		self.settings = Some(settings);
		self
	}

	/// Builds the context, inferring generic arguments from the request.
	pub fn build(self) -> ActivationResult<Arc<Context>> {
		let kernel = self.kernel.ok_or(ActivationError::MissingCollaborator("kernel"))?;
		let request = self.request.ok_or(ActivationError::MissingCollaborator("request"))?;
		let binding = self.binding.ok_or(ActivationError::MissingCollaborator("binding"))?;
		let cache = self.cache.ok_or(ActivationError::MissingCollaborator("cache"))?;
		let planner = self.planner.ok_or(ActivationError::MissingCollaborator("planner"))?;
		let pipeline = self.pipeline.ok_or(ActivationError::MissingCollaborator("pipeline"))?;
		let formatter = self
			.formatter
			.ok_or(ActivationError::MissingCollaborator("exception formatter"))?;

		let inference = infer_generic_arguments(binding.service(), request.service());
		Ok(Arc::new(Context {
			kernel,
			request,
			binding,
			cache,
			planner,
			pipeline,
			formatter,
			settings: self.settings.unwrap_or_default(),
			parameters: OnceLock::new(),
			plan: OnceLock::new(),
			instance: RwLock::new(None),
			generic_arguments: inference.arguments,
			has_inferred_generic_arguments: inference.inferred,
		}))
	}
}

//! Bindings
//!
//! A [`Binding`] tells the engine how to produce instances of one service:
//! which provider creates them, which scope owns them, which conditions must
//! hold for the binding to apply and which actions run around activation.
//! Bindings are assembled with a [`BindingBuilder`] and are immutable once
//! built, except for the provider they memoize on first use.

use crate::context::Context;
use crate::error::ActivationResult;
use crate::instance::Instance;
use crate::metadata::BindingMetadata;
use crate::parameter::Parameter;
use crate::provider::{CallbackProvider, ConstantProvider, Provider, StandardProvider};
use crate::request::Request;
use crate::scope::{ScopeKey, current_thread_scope};
use crate::service::ServiceType;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

static NEXT_BINDING_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u64);

impl BindingId {
	fn next() -> Self {
		Self(NEXT_BINDING_ID.fetch_add(1, Ordering::Relaxed))
	}
}

impl fmt::Display for BindingId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Predicate deciding whether a binding applies to a request
pub type Condition = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

/// Computes the scope owning a binding's instances
pub type ScopeCallback = Arc<dyn Fn(&Context) -> Option<ScopeKey> + Send + Sync>;

/// Produces the provider of a binding; invoked at most once per binding
pub type ProviderCallback = Arc<dyn Fn(&Context) -> Arc<dyn Provider> + Send + Sync>;

/// Action run when an instance is activated or deactivated
pub type LifecycleAction = Arc<dyn Fn(&Context, &Instance) -> ActivationResult<()> + Send + Sync>;

/// Lifetime strategy declared on a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeKind {
	/// A new instance per resolution
	#[default]
	Transient,
	/// One instance per kernel
	Singleton,
	/// One instance per thread
	Thread,
	/// Scope computed by a user callback
	Custom,
}

/// What a binding resolves to
#[derive(Debug, Clone)]
pub enum BindingTarget {
	/// The service type itself
	SelfType,
	/// Another (usually concrete) type
	Type(ServiceType),
	/// A user-supplied provider
	Provider,
	/// A factory closure
	Method,
	/// A fixed instance
	Constant,
}

/// How to produce instances of one service.
pub struct Binding {
	id: BindingId,
	service: ServiceType,
	metadata: BindingMetadata,
	conditions: Vec<Condition>,
	scope_kind: ScopeKind,
	scope_callback: Option<ScopeCallback>,
	target: BindingTarget,
	provider_callback: ProviderCallback,
	provider: OnceLock<Arc<dyn Provider>>,
	parameters: Vec<Parameter>,
	activation_actions: Vec<LifecycleAction>,
	deactivation_actions: Vec<LifecycleAction>,
	is_implicit: bool,
}

impl Binding {
	/// Start building a binding for `service`.
	///
	/// # Examples
	///
	/// ```
	/// use hanzo_di::{Binding, ScopeKind, ServiceType};
	///
	/// let binding = Binding::builder(ServiceType::named_interface("IWeapon"))
	///     .to(ServiceType::named("Sword"))
	///     .named("primary")
	///     .in_singleton_scope()
	///     .build();
	///
	/// assert_eq!(binding.metadata().name(), Some("primary"));
	/// assert_eq!(binding.scope_kind(), ScopeKind::Singleton);
	/// assert!(!binding.is_conditional());
	/// ```
	pub fn builder(service: ServiceType) -> BindingBuilder {
		BindingBuilder::new(service)
	}

	pub fn id(&self) -> BindingId {
		self.id
	}

	pub fn service(&self) -> &ServiceType {
		&self.service
	}

	pub fn metadata(&self) -> &BindingMetadata {
		&self.metadata
	}

	pub fn is_conditional(&self) -> bool {
		!self.conditions.is_empty()
	}

	/// Whether every condition holds for `request`.
	pub fn matches(&self, request: &Request) -> bool {
		self.conditions.iter().all(|condition| condition(request))
	}

	pub fn scope_kind(&self) -> ScopeKind {
		self.scope_kind
	}

	/// Scope owning instances created in `context`; `None` for transient.
	pub fn scope(&self, context: &Context) -> Option<ScopeKey> {
		self.scope_callback.as_ref().and_then(|callback| callback(context))
	}

	pub fn target(&self) -> &BindingTarget {
		&self.target
	}

	/// Provider of this binding, created on first use and kept for the binding's lifetime.
	pub fn provider(&self, context: &Context) -> Arc<dyn Provider> {
		Arc::clone(self.provider.get_or_init(|| (self.provider_callback)(context)))
	}

	pub fn parameters(&self) -> &[Parameter] {
		&self.parameters
	}

	pub fn activation_actions(&self) -> &[LifecycleAction] {
		&self.activation_actions
	}

	pub fn deactivation_actions(&self) -> &[LifecycleAction] {
		&self.deactivation_actions
	}

	pub fn is_implicit(&self) -> bool {
		self.is_implicit
	}

	/// Short description used in diagnostics.
	pub fn description(&self) -> String {
		let mut description = match &self.target {
			BindingTarget::SelfType => format!("self-binding of {}", self.service),
			BindingTarget::Type(implementation) => {
				format!("binding from {} to {}", self.service, implementation)
			}
			BindingTarget::Provider => format!("provider binding from {}", self.service),
			BindingTarget::Method => format!("binding from {} to method", self.service),
			BindingTarget::Constant => format!("binding from {} to constant value", self.service),
		};
		if let Some(name) = self.metadata.name() {
			description.push_str(&format!(" named \"{}\"", name));
		}
		if self.is_conditional() {
			description.push_str(" (conditional)");
		}
		if self.is_implicit {
			description.push_str(" (implicit)");
		}
		description
	}
}

impl fmt::Debug for Binding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Binding")
			.field("id", &self.id)
			.field("service", &self.service)
			.field("target", &self.target)
			.field("scope", &self.scope_kind)
			.field("conditions", &self.conditions.len())
			.field("is_implicit", &self.is_implicit)
			.finish_non_exhaustive()
	}
}

/// Builder of a [`Binding`]
pub struct BindingBuilder {
	service: ServiceType,
	metadata: BindingMetadata,
	conditions: Vec<Condition>,
	scope_kind: ScopeKind,
	scope_callback: Option<ScopeCallback>,
	target: BindingTarget,
	provider_callback: Option<ProviderCallback>,
	parameters: Vec<Parameter>,
	activation_actions: Vec<LifecycleAction>,
	deactivation_actions: Vec<LifecycleAction>,
	is_implicit: bool,
}

impl BindingBuilder {
	pub fn new(service: ServiceType) -> Self {
		Self {
			service,
			metadata: BindingMetadata::new(),
			conditions: Vec::new(),
			scope_kind: ScopeKind::Transient,
			scope_callback: None,
			target: BindingTarget::SelfType,
			provider_callback: None,
			parameters: Vec::new(),
			activation_actions: Vec::new(),
			deactivation_actions: Vec::new(),
			is_implicit: false,
		}
	}

	/// Resolves the service by constructing the service type itself.
	pub fn to_self(mut self) -> Self {
		let implementation = self.service.clone();
		self.target = BindingTarget::SelfType;
		self.provider_callback = Some(standard_provider(implementation));
		self
	}

	/// Resolves the service by constructing `implementation`.
	pub fn to(mut self, implementation: ServiceType) -> Self {
		self.target = BindingTarget::Type(implementation.clone());
		self.provider_callback = Some(standard_provider(implementation));
		self
	}

	/// Always resolves `instance`; implies singleton scope.
	pub fn to_constant(mut self, instance: Instance) -> Self {
		let provider: Arc<dyn Provider> = Arc::new(ConstantProvider::new(instance));
		self.target = BindingTarget::Constant;
		self.provider_callback = Some(Arc::new(move |_: &Context| Arc::clone(&provider)));
		self.in_singleton_scope()
	}

	/// Resolves the service by calling `factory`.
	pub fn to_method<F>(mut self, factory: F) -> Self
	where
		F: Fn(&Arc<Context>) -> ActivationResult<Option<Instance>> + Send + Sync + 'static,
	{
		let provider: Arc<dyn Provider> = Arc::new(CallbackProvider::new(factory));
		self.target = BindingTarget::Method;
		self.provider_callback = Some(Arc::new(move |_: &Context| Arc::clone(&provider)));
		self
	}

	/// Resolves the service through a user-supplied provider.
	pub fn to_provider(mut self, provider: Arc<dyn Provider>) -> Self {
		self.target = BindingTarget::Provider;
		self.provider_callback = Some(Arc::new(move |_: &Context| Arc::clone(&provider)));
		self
	}

	/// Resolves the service through a provider built on first use.
	pub fn to_provider_with<F>(mut self, callback: F) -> Self
	where
		F: Fn(&Context) -> Arc<dyn Provider> + Send + Sync + 'static,
	{
		self.target = BindingTarget::Provider;
		self.provider_callback = Some(Arc::new(callback));
		self
	}

	pub fn named(mut self, name: impl Into<String>) -> Self {
		self.metadata.set_name(name);
		self
	}

	pub fn with_metadata<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
		self.metadata.set(key, value);
		self
	}

	/// Adds a condition; the binding only applies to requests satisfying all of them.
	pub fn when<F>(mut self, condition: F) -> Self
	where
		F: Fn(&Request) -> bool + Send + Sync + 'static,
	{
		self.conditions.push(Arc::new(condition));
		self
	}

	/// Applies only when injected into a target declared by `owner`.
	pub fn when_injected_into(self, owner: ServiceType) -> Self {
		self.when(move |request| {
			request
				.target()
				.and_then(|target| target.owner())
				.is_some_and(|declaring| declaring.is_assignable_to(&owner))
		})
	}

	pub fn in_transient_scope(mut self) -> Self {
		self.scope_kind = ScopeKind::Transient;
		self.scope_callback = None;
		self
	}

	/// One instance per kernel, released when the kernel is disposed.
	pub fn in_singleton_scope(mut self) -> Self {
		self.scope_kind = ScopeKind::Singleton;
		self.scope_callback = Some(Arc::new(|context: &Context| {
			context.kernel().ok().map(|kernel| kernel.singleton_scope())
		}));
		self
	}

	/// One instance per thread, reclaimed by pruning once the thread exits.
	pub fn in_thread_scope(mut self) -> Self {
		self.scope_kind = ScopeKind::Thread;
		self.scope_callback = Some(Arc::new(|_: &Context| Some(current_thread_scope())));
		self
	}

	pub fn in_scope<F>(mut self, scope: F) -> Self
	where
		F: Fn(&Context) -> Option<ScopeKey> + Send + Sync + 'static,
	{
		self.scope_kind = ScopeKind::Custom;
		self.scope_callback = Some(Arc::new(scope));
		self
	}

	pub fn with_parameter(mut self, parameter: Parameter) -> Self {
		self.parameters.push(parameter);
		self
	}

	pub fn on_activation<F>(mut self, action: F) -> Self
	where
		F: Fn(&Context, &Instance) -> ActivationResult<()> + Send + Sync + 'static,
	{
		self.activation_actions.push(Arc::new(action));
		self
	}

	pub fn on_deactivation<F>(mut self, action: F) -> Self
	where
		F: Fn(&Context, &Instance) -> ActivationResult<()> + Send + Sync + 'static,
	{
		self.deactivation_actions.push(Arc::new(action));
		self
	}

	/// Marks the binding as created by the engine rather than declared.
	pub fn implicit(mut self) -> Self {
		self.is_implicit = true;
		self
	}

	/// Finishes the binding; without an explicit target the service binds to itself.
	pub fn build(self) -> Arc<Binding> {
		let provider_callback = self
			.provider_callback
			.unwrap_or_else(|| standard_provider(self.service.clone()));
		Arc::new(Binding {
			id: BindingId::next(),
			service: self.service,
			metadata: self.metadata,
			conditions: self.conditions,
			scope_kind: self.scope_kind,
			scope_callback: self.scope_callback,
			target: self.target,
			provider_callback,
			provider: OnceLock::new(),
			parameters: self.parameters,
			activation_actions: self.activation_actions,
			deactivation_actions: self.deactivation_actions,
			is_implicit: self.is_implicit,
		})
	}
}

fn standard_provider(implementation: ServiceType) -> ProviderCallback {
	Arc::new(move |_: &Context| Arc::new(StandardProvider::new(implementation.clone())) as Arc<dyn Provider>)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::instance::Value;
	use rstest::rstest;

	#[rstest]
	fn binding_ids_are_unique() {
		let a = Binding::builder(ServiceType::named("Sword")).build();
		let b = Binding::builder(ServiceType::named("Sword")).build();

		assert_ne!(a.id(), b.id());
	}

	#[rstest]
	fn unconditional_binding_matches_everything() {
		let binding = Binding::builder(ServiceType::named("Sword")).build();

		assert!(!binding.is_conditional());
		assert!(binding.matches(&Request::new(ServiceType::named("Sword"))));
	}

	#[rstest]
	fn all_conditions_must_hold() {
		// Arrange
		let binding = Binding::builder(ServiceType::named("Sword"))
			.when(|_| true)
			.when(|request| request.is_optional())
			.build();

		// Assert
		assert!(binding.is_conditional());
		assert!(!binding.matches(&Request::new(ServiceType::named("Sword"))));
		assert!(binding.matches(&Request::new(ServiceType::named("Sword")).optional()));
	}

	#[rstest]
	fn constant_binding_is_singleton() {
		let binding = Binding::builder(ServiceType::named("Config"))
			.to_constant(Instance::new(Value("prod")))
			.build();

		assert_eq!(binding.scope_kind(), ScopeKind::Singleton);
		assert!(matches!(binding.target(), BindingTarget::Constant));
	}

	#[rstest]
	fn description_names_target_and_flags() {
		let binding = Binding::builder(ServiceType::named_interface("IWeapon"))
			.to(ServiceType::named("Sword"))
			.named("main")
			.when(|_| true)
			.build();

		assert_eq!(
			binding.description(),
			"binding from IWeapon to Sword named \"main\" (conditional)"
		);
	}

	#[rstest]
	fn when_injected_into_rejects_root_requests() {
		let binding = Binding::builder(ServiceType::named_interface("IWeapon"))
			.when_injected_into(ServiceType::named("Samurai"))
			.build();

		assert!(binding.is_conditional());
		assert!(!binding.matches(&Request::new(ServiceType::named_interface("IWeapon"))));
	}
}

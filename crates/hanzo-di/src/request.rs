//! Resolution requests

use crate::binding::{Binding, BindingId};
use crate::context::Context;
use crate::metadata::BindingMetadata;
use crate::parameter::Parameter;
use crate::planning::Target;
use crate::scope::ScopeKey;
use crate::service::ServiceType;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Predicate over binding metadata restricting which bindings may serve a request
pub type Constraint = Arc<dyn Fn(&BindingMetadata) -> bool + Send + Sync>;

/// Scope replacing whatever the selected binding declares
pub type ScopeOverride = Arc<dyn Fn() -> Option<ScopeKey> + Send + Sync>;

/// A request for a service, either from a caller or from an injection target.
///
/// Child requests are created by a [`Context`] while it injects a target;
/// they copy the parent's active-binding stack so a binding entered twice on
/// the same chain can be detected as a cycle.
pub struct Request {
	service: ServiceType,
	constraint: Option<Constraint>,
	parameters: Vec<Parameter>,
	scope_override: Option<ScopeOverride>,
	active_bindings: Mutex<Vec<Arc<Binding>>>,
	parent_context: Option<Arc<Context>>,
	parent_request: Option<Arc<Request>>,
	target: Option<Target>,
	depth: usize,
	is_optional: bool,
	is_unique: bool,
}

impl Request {
	/// Root request for `service`.
	pub fn new(service: ServiceType) -> Self {
		Self {
			service,
			constraint: None,
			parameters: Vec::new(),
			scope_override: None,
			active_bindings: Mutex::new(Vec::new()),
			parent_context: None,
			parent_request: None,
			target: None,
			depth: 0,
			is_optional: false,
			is_unique: true,
		}
	}

	/// Request created while `parent` injects `target`.
	pub fn child(parent: &Arc<Context>, target: Target) -> Self {
		let parent_request = parent.request();
		let parameters = parent
			.parameters()
			.iter()
			.filter(|parameter| parameter.should_inherit())
			.cloned()
			.collect();
		Self {
			service: target.service().clone(),
			constraint: target.constraint().cloned(),
			parameters,
			scope_override: parent_request.scope_override.clone(),
			active_bindings: Mutex::new(parent_request.active_bindings()),
			parent_context: Some(Arc::clone(parent)),
			parent_request: Some(Arc::clone(parent_request)),
			is_optional: target.is_optional(),
			target: Some(target),
			depth: parent_request.depth + 1,
			is_unique: true,
		}
	}

	pub fn with_constraint<F>(mut self, constraint: F) -> Self
	where
		F: Fn(&BindingMetadata) -> bool + Send + Sync + 'static,
	{
		self.constraint = Some(Arc::new(constraint));
		self
	}

	/// Only bindings named `name` may serve this request.
	pub fn named(self, name: impl Into<String>) -> Self {
		let name = name.into();
		self.with_constraint(move |metadata| metadata.name() == Some(name.as_str()))
	}

	pub fn with_parameter(mut self, parameter: Parameter) -> Self {
		self.parameters.push(parameter);
		self
	}

	pub fn with_parameters<I>(mut self, parameters: I) -> Self
	where
		I: IntoIterator<Item = Parameter>,
	{
		self.parameters.extend(parameters);
		self
	}

	pub fn with_scope_override<F>(mut self, scope: F) -> Self
	where
		F: Fn() -> Option<ScopeKey> + Send + Sync + 'static,
	{
		self.scope_override = Some(Arc::new(scope));
		self
	}

	/// Resolving nothing is not an error.
	pub fn optional(mut self) -> Self {
		self.is_optional = true;
		self
	}

	/// Every matching binding is resolved instead of exactly one.
	pub fn multiple(mut self) -> Self {
		self.is_unique = false;
		self
	}

	pub fn service(&self) -> &ServiceType {
		&self.service
	}

	pub fn constraint(&self) -> Option<&Constraint> {
		self.constraint.as_ref()
	}

	/// Whether `metadata` satisfies the constraint; vacuously true without one.
	pub fn satisfies_constraint(&self, metadata: &BindingMetadata) -> bool {
		self.constraint
			.as_ref()
			.is_none_or(|constraint| constraint(metadata))
	}

	pub fn parameters(&self) -> &[Parameter] {
		&self.parameters
	}

	/// Scope forced by the caller. `None` when there is no override or the
	/// override yields no scope.
	pub fn scope_override(&self) -> Option<ScopeKey> {
		self.scope_override.as_ref().and_then(|scope| scope())
	}

	pub fn parent_context(&self) -> Option<&Arc<Context>> {
		self.parent_context.as_ref()
	}

	pub fn parent_request(&self) -> Option<&Arc<Request>> {
		self.parent_request.as_ref()
	}

	pub fn target(&self) -> Option<&Target> {
		self.target.as_ref()
	}

	pub fn depth(&self) -> usize {
		self.depth
	}

	pub fn is_optional(&self) -> bool {
		self.is_optional
	}

	pub fn is_unique(&self) -> bool {
		self.is_unique
	}

	/// Snapshot of the bindings being activated on this chain, outermost first.
	pub fn active_bindings(&self) -> Vec<Arc<Binding>> {
		self.active_bindings
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	/// Pushes `binding` onto the active stack.
	///
	/// Fails with the stack snapshot when the binding is already active; the
	/// returned guard pops the binding when dropped.
	pub(crate) fn enter(&self, binding: &Arc<Binding>) -> Result<ActiveBindingGuard<'_>, Vec<Arc<Binding>>> {
		let mut active = self
			.active_bindings
			.lock()
			.unwrap_or_else(PoisonError::into_inner);
		if active.iter().any(|entered| entered.id() == binding.id()) {
			return Err(active.clone());
		}
		active.push(Arc::clone(binding));
		Ok(ActiveBindingGuard {
			request: self,
			binding: binding.id(),
		})
	}
}

impl fmt::Debug for Request {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Request")
			.field("service", &self.service)
			.field("target", &self.target)
			.field("depth", &self.depth)
			.field("is_optional", &self.is_optional)
			.field("is_unique", &self.is_unique)
			.field("parameters", &self.parameters)
			.finish_non_exhaustive()
	}
}

/// RAII guard: pops its binding from the active stack on drop
#[derive(Debug)]
pub(crate) struct ActiveBindingGuard<'a> {
	request: &'a Request,
	binding: BindingId,
}

impl Drop for ActiveBindingGuard<'_> {
	fn drop(&mut self) {
		let mut active = self
			.request
			.active_bindings
			.lock()
			.unwrap_or_else(PoisonError::into_inner);
		if let Some(position) = active.iter().rposition(|entered| entered.id() == self.binding) {
			active.remove(position);
		}
	}
}

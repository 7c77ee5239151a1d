//! Providers create the instances a binding resolves to

use crate::context::Context;
use crate::error::{ActivationError, ActivationResult};
use crate::instance::Instance;
use crate::planning::{Arguments, ConstructorDirective, Target};
use crate::request::Request;
use crate::service::ServiceType;
use std::fmt;
use std::sync::Arc;

/// Creates instances for a binding
#[cfg_attr(test, mockall::automock)]
pub trait Provider: Send + Sync {
	/// Creates an instance in `context`; `None` is a null instance.
	fn create(&self, context: &Arc<Context>) -> ActivationResult<Option<Instance>>;
}

/// Provider that calls a constructor declared in the implementation's plan.
///
/// A marked constructor is always used and fails when one of its targets
/// cannot be satisfied. Otherwise the constructor with the most parameters
/// among those whose every parameter can be satisfied wins; ties go to the
/// first declared. A target is satisfiable when a parameter overrides it,
/// when it is optional, or when the kernel can resolve it.
pub struct StandardProvider {
	implementation: ServiceType,
}

impl StandardProvider {
	pub fn new(implementation: ServiceType) -> Self {
		Self { implementation }
	}

	pub fn implementation(&self) -> &ServiceType {
		&self.implementation
	}

	fn select<'p>(
		context: &Arc<Context>,
		constructors: &'p [&'p ConstructorDirective],
	) -> ActivationResult<Option<&'p ConstructorDirective>> {
		if let Some(marked) = constructors.iter().find(|constructor| constructor.is_marked()) {
			for target in marked.targets() {
				if !Self::is_satisfiable(context, target)? {
					return Ok(None);
				}
			}
			return Ok(Some(*marked));
		}

		let mut best: Option<&ConstructorDirective> = None;
		for constructor in constructors {
			if best.is_some_and(|best| best.targets().len() >= constructor.targets().len()) {
				continue;
			}
			let mut satisfiable = true;
			for target in constructor.targets() {
				if !Self::is_satisfiable(context, target)? {
					satisfiable = false;
					break;
				}
			}
			if satisfiable {
				best = Some(*constructor);
			}
		}
		Ok(best)
	}

	fn is_satisfiable(context: &Arc<Context>, target: &Target) -> ActivationResult<bool> {
		if target.is_optional() || context.parameter_for(target).is_some() {
			return Ok(true);
		}
		let kernel = context.kernel()?;
		Ok(kernel.can_resolve(&Request::child(context, target.clone())))
	}
}

impl Provider for StandardProvider {
	fn create(&self, context: &Arc<Context>) -> ActivationResult<Option<Instance>> {
		let implementation = if self.implementation.is_open_generic() {
			self.implementation
				.make_generic(context.generic_arguments().to_vec())?
		} else {
			self.implementation.clone()
		};

		let plan = context.planner().plan(&implementation);
		context.set_plan(Arc::clone(&plan));

		let constructors: Vec<&ConstructorDirective> = plan.constructors().collect();
		let Some(constructor) = Self::select(context, &constructors)? else {
			let message = context
				.formatter()
				.unsatisfied_constructor(context, &implementation);
			return Err(ActivationError::UnsatisfiedConstructor {
				implementation: implementation.to_string(),
				message,
			});
		};

		let mut values = Vec::with_capacity(constructor.targets().len());
		for target in constructor.targets() {
			values.push(context.resolve_target(target)?);
		}
		let arguments =
			Arguments::new(values).with_generic_arguments(implementation.generic_arguments().to_vec());

		tracing::trace!(
			implementation = %implementation,
			arguments = arguments.len(),
			"invoking constructor"
		);
		constructor.invoke(&arguments).map(Some)
	}
}

impl fmt::Debug for StandardProvider {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StandardProvider")
			.field("implementation", &self.implementation)
			.finish()
	}
}

/// Provider returning the same instance every time
#[derive(Debug, Clone)]
pub struct ConstantProvider {
	instance: Instance,
}

impl ConstantProvider {
	pub fn new(instance: Instance) -> Self {
		Self { instance }
	}
}

impl Provider for ConstantProvider {
	fn create(&self, _context: &Arc<Context>) -> ActivationResult<Option<Instance>> {
		Ok(Some(self.instance.clone()))
	}
}

type Factory = Box<dyn Fn(&Arc<Context>) -> ActivationResult<Option<Instance>> + Send + Sync>;

/// Provider delegating to a factory closure
pub struct CallbackProvider {
	factory: Factory,
}

impl CallbackProvider {
	pub fn new<F>(factory: F) -> Self
	where
		F: Fn(&Arc<Context>) -> ActivationResult<Option<Instance>> + Send + Sync + 'static,
	{
		Self {
			factory: Box::new(factory),
		}
	}
}

impl Provider for CallbackProvider {
	fn create(&self, context: &Arc<Context>) -> ActivationResult<Option<Instance>> {
		(self.factory)(context)
	}
}

impl fmt::Debug for CallbackProvider {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CallbackProvider").finish_non_exhaustive()
	}
}

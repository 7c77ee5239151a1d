//! Built-in activation strategies

use super::ActivationStrategy;
use crate::context::Context;
use crate::error::ActivationResult;
use crate::instance::InstanceReference;
use crate::planning::Arguments;
use std::sync::Arc;

/// Injects the properties declared in the plan
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyInjectionStrategy;

impl ActivationStrategy for PropertyInjectionStrategy {
	fn name(&self) -> &'static str {
		"property-injection"
	}

	fn activate(&self, context: &Arc<Context>, reference: &InstanceReference) -> ActivationResult<()> {
		let Some(plan) = context.plan() else {
			return Ok(());
		};
		for property in plan.properties() {
			let value = context.resolve_target(property.target())?;
			property.inject(&reference.instance(), value)?;
		}
		Ok(())
	}
}

/// Calls the injection methods declared in the plan
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodInjectionStrategy;

impl ActivationStrategy for MethodInjectionStrategy {
	fn name(&self) -> &'static str {
		"method-injection"
	}

	fn activate(&self, context: &Arc<Context>, reference: &InstanceReference) -> ActivationResult<()> {
		let Some(plan) = context.plan() else {
			return Ok(());
		};
		for method in plan.methods() {
			let mut values = Vec::with_capacity(method.targets().len());
			for target in method.targets() {
				values.push(context.resolve_target(target)?);
			}
			let arguments = Arguments::new(values)
				.with_generic_arguments(plan.concrete_type().generic_arguments().to_vec());
			method.inject(&reference.instance(), &arguments)?;
		}
		Ok(())
	}
}

/// Runs [`Initializable::initialize`](crate::Initializable::initialize)
#[derive(Debug, Clone, Copy, Default)]
pub struct InitializableStrategy;

impl ActivationStrategy for InitializableStrategy {
	fn name(&self) -> &'static str {
		"initializable"
	}

	fn activate(&self, _context: &Arc<Context>, reference: &InstanceReference) -> ActivationResult<()> {
		reference
			.find(|component| component.as_initializable().map(|target| target.initialize()))
			.unwrap_or(Ok(()))
	}
}

/// Starts instances on activation and stops them on deactivation
#[derive(Debug, Clone, Copy, Default)]
pub struct StartableStrategy;

impl ActivationStrategy for StartableStrategy {
	fn name(&self) -> &'static str {
		"startable"
	}

	fn activate(&self, _context: &Arc<Context>, reference: &InstanceReference) -> ActivationResult<()> {
		reference
			.find(|component| component.as_startable().map(|target| target.start()))
			.unwrap_or(Ok(()))
	}

	fn deactivate(&self, _context: &Arc<Context>, reference: &InstanceReference) -> ActivationResult<()> {
		reference
			.find(|component| component.as_startable().map(|target| target.stop()))
			.unwrap_or(Ok(()))
	}
}

/// Runs the binding's own activation and deactivation actions
#[derive(Debug, Clone, Copy, Default)]
pub struct BindingActionStrategy;

impl ActivationStrategy for BindingActionStrategy {
	fn name(&self) -> &'static str {
		"binding-actions"
	}

	fn activate(&self, context: &Arc<Context>, reference: &InstanceReference) -> ActivationResult<()> {
		let instance = reference.instance();
		for action in context.binding().activation_actions() {
			action(context, &instance)?;
		}
		Ok(())
	}

	fn deactivate(&self, context: &Arc<Context>, reference: &InstanceReference) -> ActivationResult<()> {
		let instance = reference.instance();
		let mut first_error = None;
		for action in context.binding().deactivation_actions() {
			if let Err(error) = action(context, &instance) {
				first_error.get_or_insert(error);
			}
		}
		first_error.map_or(Ok(()), Err)
	}
}

/// Disposes instances on deactivation, looking through proxies
#[derive(Debug, Clone, Copy, Default)]
pub struct DisposableStrategy;

impl ActivationStrategy for DisposableStrategy {
	fn name(&self) -> &'static str {
		"disposable"
	}

	fn deactivate(&self, _context: &Arc<Context>, reference: &InstanceReference) -> ActivationResult<()> {
		reference
			.find(|component| component.as_disposable().map(|target| target.dispose()))
			.unwrap_or(Ok(()))
	}
}

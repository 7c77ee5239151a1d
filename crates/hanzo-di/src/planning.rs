//! Activation plans
//!
//! A [`Plan`] lists the injection points of one concrete type: the
//! constructors a provider may call, the properties and the methods the
//! pipeline injects after construction. Injection points are declared with a
//! [`PlanBuilder`] and registered in a [`PlanRegistry`], which memoizes one
//! plan per concrete type.
//!
//! ```
//! use hanzo_di::{Arguments, Component, Instance, Plan, PlanRegistry, Planner, ServiceType, Target};
//! use std::sync::Arc;
//!
//! struct Sword;
//! impl Component for Sword {}
//!
//! struct Samurai {
//!     weapon: Arc<Sword>,
//! }
//! impl Component for Samurai {}
//!
//! let registry = PlanRegistry::new();
//! registry.register(
//!     Plan::builder(ServiceType::of::<Samurai>())
//!         .constructor(vec![Target::constructor_argument("weapon", ServiceType::of::<Sword>())], |args: &Arguments| {
//!             Ok(Instance::new(Samurai { weapon: args.get::<Sword>(0)? }))
//!         })
//!         .build(),
//! );
//!
//! let plan = registry.plan(&ServiceType::of::<Samurai>());
//! assert_eq!(plan.constructors().count(), 1);
//! ```

use crate::error::{ActivationError, ActivationResult};
use crate::instance::{Component, Instance};
use crate::metadata::BindingMetadata;
use crate::parameter::ParameterKind;
use crate::request::Constraint;
use crate::service::ServiceType;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// One injection point: a constructor or method parameter, or a property.
#[derive(Clone)]
pub struct Target {
	name: String,
	service: ServiceType,
	kind: ParameterKind,
	optional: bool,
	constraint: Option<Constraint>,
	owner: Option<ServiceType>,
	method: Option<String>,
}

impl Target {
	pub fn new(kind: ParameterKind, name: impl Into<String>, service: ServiceType) -> Self {
		Self {
			name: name.into(),
			service,
			kind,
			optional: false,
			constraint: None,
			owner: None,
			method: None,
		}
	}

	pub fn constructor_argument(name: impl Into<String>, service: ServiceType) -> Self {
		Self::new(ParameterKind::ConstructorArgument, name, service)
	}

	pub fn property(name: impl Into<String>, service: ServiceType) -> Self {
		Self::new(ParameterKind::Property, name, service)
	}

	pub fn method_argument(name: impl Into<String>, service: ServiceType) -> Self {
		Self::new(ParameterKind::MethodArgument, name, service)
	}

	/// Missing dependencies inject nothing instead of failing.
	pub fn optional(mut self) -> Self {
		self.optional = true;
		self
	}

	/// Restricts candidate bindings to those named `name`.
	pub fn named(self, name: impl Into<String>) -> Self {
		let name = name.into();
		self.with_constraint(move |metadata| metadata.name() == Some(name.as_str()))
	}

	/// Restricts candidate bindings by their metadata.
	pub fn with_constraint<F>(mut self, constraint: F) -> Self
	where
		F: Fn(&BindingMetadata) -> bool + Send + Sync + 'static,
	{
		self.constraint = Some(Arc::new(constraint));
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn service(&self) -> &ServiceType {
		&self.service
	}

	pub fn kind(&self) -> ParameterKind {
		self.kind
	}

	pub fn is_optional(&self) -> bool {
		self.optional
	}

	pub fn constraint(&self) -> Option<&Constraint> {
		self.constraint.as_ref()
	}

	/// Type declaring this injection point, once the target belongs to a plan.
	pub fn owner(&self) -> Option<&ServiceType> {
		self.owner.as_ref()
	}

	/// Human-readable location, e.g. `parameter weapon of constructor of type Samurai`.
	pub fn description(&self) -> String {
		let owner = self
			.owner
			.as_ref()
			.map_or_else(|| "<unknown>".to_string(), ToString::to_string);
		match self.kind {
			ParameterKind::ConstructorArgument => {
				format!("parameter {} of constructor of type {}", self.name, owner)
			}
			ParameterKind::Property => format!("property {} of type {}", self.name, owner),
			ParameterKind::MethodArgument => format!(
				"parameter {} of method {} of type {}",
				self.name,
				self.method.as_deref().unwrap_or("<unknown>"),
				owner
			),
		}
	}

	fn placed(mut self, owner: &ServiceType, method: Option<&str>) -> Self {
		self.owner = Some(owner.clone());
		self.method = method.map(str::to_string);
		self
	}
}

impl fmt::Debug for Target {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Target")
			.field("name", &self.name)
			.field("service", &self.service)
			.field("kind", &self.kind)
			.field("optional", &self.optional)
			.field("constrained", &self.constraint.is_some())
			.finish()
	}
}

/// Values resolved for a directive's targets, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
	values: Vec<Option<Instance>>,
	generic_arguments: Vec<ServiceType>,
}

impl Arguments {
	pub fn new(values: Vec<Option<Instance>>) -> Self {
		Self {
			values,
			generic_arguments: Vec::new(),
		}
	}

	/// Attaches the generic arguments of the type being constructed.
	pub fn with_generic_arguments(mut self, generic_arguments: Vec<ServiceType>) -> Self {
		self.generic_arguments = generic_arguments;
		self
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Raw value at `index`; `None` when absent or not injected.
	pub fn instance(&self, index: usize) -> Option<&Instance> {
		self.values.get(index).and_then(Option::as_ref)
	}

	/// Required argument at `index`, viewed as `T`.
	pub fn get<T: Component>(&self, index: usize) -> ActivationResult<Arc<T>> {
		self.instance(index)
			.ok_or(ActivationError::MissingArgument(index))?
			.downcast::<T>()
	}

	/// Optional argument at `index`, viewed as `T`.
	pub fn optional<T: Component>(&self, index: usize) -> ActivationResult<Option<Arc<T>>> {
		self.instance(index).map(Instance::downcast::<T>).transpose()
	}

	/// Generic arguments of the closed type under construction.
	pub fn generic_arguments(&self) -> &[ServiceType] {
		&self.generic_arguments
	}
}

type ConstructorInjector = Arc<dyn Fn(&Arguments) -> ActivationResult<Instance> + Send + Sync>;
type PropertyInjector = Arc<dyn Fn(&Instance, Option<Instance>) -> ActivationResult<()> + Send + Sync>;
type MethodInjector = Arc<dyn Fn(&Instance, &Arguments) -> ActivationResult<()> + Send + Sync>;

/// A constructor a provider may call
#[derive(Clone)]
pub struct ConstructorDirective {
	targets: Vec<Target>,
	marked: bool,
	injector: ConstructorInjector,
}

impl ConstructorDirective {
	pub fn targets(&self) -> &[Target] {
		&self.targets
	}

	/// Marked constructors are always chosen over unmarked ones.
	pub fn is_marked(&self) -> bool {
		self.marked
	}

	pub fn invoke(&self, arguments: &Arguments) -> ActivationResult<Instance> {
		(self.injector)(arguments)
	}
}

/// A property set after construction
#[derive(Clone)]
pub struct PropertyDirective {
	target: Target,
	injector: PropertyInjector,
}

impl PropertyDirective {
	pub fn target(&self) -> &Target {
		&self.target
	}

	pub fn inject(&self, instance: &Instance, value: Option<Instance>) -> ActivationResult<()> {
		(self.injector)(instance, value)
	}
}

/// A method called after construction
#[derive(Clone)]
pub struct MethodDirective {
	name: String,
	targets: Vec<Target>,
	injector: MethodInjector,
}

impl MethodDirective {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn targets(&self) -> &[Target] {
		&self.targets
	}

	pub fn inject(&self, instance: &Instance, arguments: &Arguments) -> ActivationResult<()> {
		(self.injector)(instance, arguments)
	}
}

#[derive(Clone)]
pub enum Directive {
	Constructor(ConstructorDirective),
	Property(PropertyDirective),
	Method(MethodDirective),
}

/// Injection points of one concrete type
#[derive(Clone)]
pub struct Plan {
	concrete_type: ServiceType,
	directives: Vec<Directive>,
}

impl Plan {
	pub fn builder(concrete_type: ServiceType) -> PlanBuilder {
		PlanBuilder::new(concrete_type)
	}

	/// Plan with no injection points.
	pub fn empty(concrete_type: ServiceType) -> Self {
		Self {
			concrete_type,
			directives: Vec::new(),
		}
	}

	pub fn concrete_type(&self) -> &ServiceType {
		&self.concrete_type
	}

	pub fn directives(&self) -> &[Directive] {
		&self.directives
	}

	pub fn constructors(&self) -> impl Iterator<Item = &ConstructorDirective> {
		self.directives.iter().filter_map(|directive| match directive {
			Directive::Constructor(constructor) => Some(constructor),
			_ => None,
		})
	}

	pub fn properties(&self) -> impl Iterator<Item = &PropertyDirective> {
		self.directives.iter().filter_map(|directive| match directive {
			Directive::Property(property) => Some(property),
			_ => None,
		})
	}

	pub fn methods(&self) -> impl Iterator<Item = &MethodDirective> {
		self.directives.iter().filter_map(|directive| match directive {
			Directive::Method(method) => Some(method),
			_ => None,
		})
	}

	/// Same injection points, declared for `concrete_type`.
	fn rekeyed(&self, concrete_type: ServiceType) -> Self {
		Self {
			concrete_type,
			directives: self.directives.clone(),
		}
	}
}

impl fmt::Debug for Plan {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Plan")
			.field("concrete_type", &self.concrete_type)
			.field("constructors", &self.constructors().count())
			.field("properties", &self.properties().count())
			.field("methods", &self.methods().count())
			.finish()
	}
}

/// Declarative builder of a [`Plan`]
pub struct PlanBuilder {
	concrete_type: ServiceType,
	directives: Vec<Directive>,
}

impl PlanBuilder {
	pub fn new(concrete_type: ServiceType) -> Self {
		Self {
			concrete_type,
			directives: Vec::new(),
		}
	}

	pub fn constructor<F>(self, targets: Vec<Target>, injector: F) -> Self
	where
		F: Fn(&Arguments) -> ActivationResult<Instance> + Send + Sync + 'static,
	{
		self.push_constructor(targets, false, Arc::new(injector))
	}

	/// Constructor selected regardless of how many parameters other constructors could satisfy.
	pub fn marked_constructor<F>(self, targets: Vec<Target>, injector: F) -> Self
	where
		F: Fn(&Arguments) -> ActivationResult<Instance> + Send + Sync + 'static,
	{
		self.push_constructor(targets, true, Arc::new(injector))
	}

	fn push_constructor(mut self, targets: Vec<Target>, marked: bool, injector: ConstructorInjector) -> Self {
		let targets = targets
			.into_iter()
			.map(|target| target.placed(&self.concrete_type, None))
			.collect();
		self.directives.push(Directive::Constructor(ConstructorDirective {
			targets,
			marked,
			injector,
		}));
		self
	}

	pub fn property<F>(mut self, target: Target, injector: F) -> Self
	where
		F: Fn(&Instance, Option<Instance>) -> ActivationResult<()> + Send + Sync + 'static,
	{
		let target = target.placed(&self.concrete_type, None);
		self.directives.push(Directive::Property(PropertyDirective {
			target,
			injector: Arc::new(injector),
		}));
		self
	}

	/// Property setter working on the typed component.
	pub fn property_of<C, F>(self, target: Target, setter: F) -> Self
	where
		C: Component,
		F: Fn(&C, Option<Instance>) -> ActivationResult<()> + Send + Sync + 'static,
	{
		self.property(target, move |instance, value| setter(&*instance.downcast::<C>()?, value))
	}

	pub fn method<F>(mut self, name: impl Into<String>, targets: Vec<Target>, injector: F) -> Self
	where
		F: Fn(&Instance, &Arguments) -> ActivationResult<()> + Send + Sync + 'static,
	{
		let name = name.into();
		let targets = targets
			.into_iter()
			.map(|target| target.placed(&self.concrete_type, Some(&name)))
			.collect();
		self.directives.push(Directive::Method(MethodDirective {
			name,
			targets,
			injector: Arc::new(injector),
		}));
		self
	}

	/// Injection method working on the typed component.
	pub fn method_of<C, F>(self, name: impl Into<String>, targets: Vec<Target>, method: F) -> Self
	where
		C: Component,
		F: Fn(&C, &Arguments) -> ActivationResult<()> + Send + Sync + 'static,
	{
		self.method(name, targets, move |instance, arguments| {
			method(&*instance.downcast::<C>()?, arguments)
		})
	}

	pub fn build(self) -> Plan {
		Plan {
			concrete_type: self.concrete_type,
			directives: self.directives,
		}
	}
}

/// Source of activation plans
#[cfg_attr(test, mockall::automock)]
pub trait Planner: Send + Sync {
	/// Plan for `concrete_type`; types nobody declared get an empty plan.
	fn plan(&self, concrete_type: &ServiceType) -> Arc<Plan>;

	/// Whether a plan was declared for `concrete_type` or its generic definition.
	fn has_plan(&self, concrete_type: &ServiceType) -> bool;
}

/// Planner backed by declared plans, memoized per concrete type.
///
/// A closed generic type with no plan of its own uses the plan declared for
/// its generic definition.
#[derive(Default)]
pub struct PlanRegistry {
	declared: RwLock<HashMap<ServiceType, Arc<Plan>>>,
	built: RwLock<HashMap<ServiceType, Arc<Plan>>>,
}

impl PlanRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Declares a plan, replacing any previous declaration for its type.
	pub fn register(&self, plan: Plan) {
		let concrete_type = plan.concrete_type().clone();
		self.declared
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.insert(concrete_type, Arc::new(plan));
		// Closed instantiations may have been derived from the old declaration.
		self.built.write().unwrap_or_else(PoisonError::into_inner).clear();
	}

	fn declared(&self, concrete_type: &ServiceType) -> Option<Arc<Plan>> {
		let declared = self.declared.read().unwrap_or_else(PoisonError::into_inner);
		if let Some(plan) = declared.get(concrete_type) {
			return Some(Arc::clone(plan));
		}
		let definition = concrete_type
			.generic_definition()
			.filter(|_| concrete_type.is_closed_generic())?;
		declared
			.get(&definition)
			.map(|plan| Arc::new(plan.rekeyed(concrete_type.clone())))
	}
}

impl Planner for PlanRegistry {
	fn plan(&self, concrete_type: &ServiceType) -> Arc<Plan> {
		if let Some(plan) = self
			.built
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(concrete_type)
		{
			return Arc::clone(plan);
		}

		let plan = self
			.declared(concrete_type)
			.unwrap_or_else(|| Arc::new(Plan::empty(concrete_type.clone())));
		tracing::trace!(concrete_type = %concrete_type, "plan built");
		Arc::clone(
			self.built
				.write()
				.unwrap_or_else(PoisonError::into_inner)
				.entry(concrete_type.clone())
				.or_insert(plan),
		)
	}

	fn has_plan(&self, concrete_type: &ServiceType) -> bool {
		self.declared(concrete_type).is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::instance::Value;
	use rstest::rstest;
	use std::sync::OnceLock;

	#[derive(Default)]
	struct Holder {
		slot: OnceLock<Instance>,
	}

	impl Component for Holder {}

	fn holder_plan() -> Plan {
		Plan::builder(ServiceType::of::<Holder>())
			.constructor(vec![], |_| Ok(Instance::new(Holder::default())))
			.property_of::<Holder, _>(
				Target::property("slot", ServiceType::of::<Value<u8>>()),
				|holder, value| {
					if let Some(value) = value {
						let _ = holder.slot.set(value);
					}
					Ok(())
				},
			)
			.build()
	}

	#[rstest]
	fn registry_memoizes_plans() {
		// Arrange
		let registry = PlanRegistry::new();
		registry.register(holder_plan());

		// Act
		let first = registry.plan(&ServiceType::of::<Holder>());
		let second = registry.plan(&ServiceType::of::<Holder>());

		// Assert
		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(first.constructors().count(), 1);
		assert_eq!(first.properties().count(), 1);
	}

	#[rstest]
	fn undeclared_type_gets_empty_plan() {
		let registry = PlanRegistry::new();

		let plan = registry.plan(&ServiceType::of::<String>());

		assert!(plan.directives().is_empty());
		assert!(!registry.has_plan(&ServiceType::of::<String>()));
	}

	#[rstest]
	fn closed_generic_uses_definition_plan() {
		// Arrange
		let definition = ServiceType::open_concrete("Repository", 1);
		let registry = PlanRegistry::new();
		registry.register(
			Plan::builder(definition.clone())
				.constructor(vec![], |_| Ok(Instance::new(Value(0u8))))
				.build(),
		);
		let closed = definition.make_generic(vec![ServiceType::of::<u32>()]).unwrap();

		// Act
		let plan = registry.plan(&closed);

		// Assert
		assert!(registry.has_plan(&closed));
		assert_eq!(plan.concrete_type(), &closed);
		assert_eq!(plan.constructors().count(), 1);
	}

	#[rstest]
	fn targets_describe_their_location() {
		let plan = Plan::builder(ServiceType::named("Samurai"))
			.constructor(
				vec![Target::constructor_argument("weapon", ServiceType::named_interface("IWeapon"))],
				|_| Ok(Instance::new(Value(()))),
			)
			.method("arm", vec![Target::method_argument("sidearm", ServiceType::named("Dagger"))], |_, _| Ok(()))
			.build();

		let constructor = plan.constructors().next().unwrap();
		let method = plan.methods().next().unwrap();

		assert_eq!(
			constructor.targets()[0].description(),
			"parameter weapon of constructor of type Samurai"
		);
		assert_eq!(
			method.targets()[0].description(),
			"parameter sidearm of method arm of type Samurai"
		);
	}

	#[rstest]
	fn property_of_rejects_foreign_instance() {
		let plan = holder_plan();
		let property = plan.properties().next().unwrap();

		let result = property.inject(&Instance::new(Value(1u8)), None);

		assert!(matches!(result, Err(ActivationError::InvalidCast { .. })));
	}

	#[rstest]
	fn arguments_report_missing_positions() {
		let arguments = Arguments::new(vec![Some(Instance::new(Value(3u8))), None]);

		assert_eq!(**arguments.get::<Value<u8>>(0).unwrap(), 3);
		assert!(arguments.optional::<Value<u8>>(1).unwrap().is_none());
		assert!(matches!(
			arguments.get::<Value<u8>>(1),
			Err(ActivationError::MissingArgument(1))
		));
	}
}

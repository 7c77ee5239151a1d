//! Explicit parameter overrides

use crate::context::Context;
use crate::instance::Instance;
use crate::planning::Target;
use std::fmt;
use std::sync::Arc;

/// Which kind of injection point a parameter overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
	/// A constructor parameter
	ConstructorArgument,
	/// A property set after construction
	Property,
	/// A parameter of an injection method
	MethodArgument,
}

type ValueCallback = Arc<dyn Fn(&Context, &Target) -> Option<Instance> + Send + Sync>;

#[derive(Clone)]
enum ParameterValue {
	Constant(Option<Instance>),
	Computed(ValueCallback),
}

/// Value supplied for a named injection point, winning over binding resolution.
///
/// # Examples
///
/// ```
/// use hanzo_di::{Instance, Parameter, ParameterKind, Value};
///
/// let damage = Parameter::constructor_argument("damage", Instance::new(Value(12u32)));
/// assert_eq!(damage.name(), "damage");
/// assert_eq!(damage.kind(), ParameterKind::ConstructorArgument);
/// assert!(!damage.should_inherit());
/// ```
#[derive(Clone)]
pub struct Parameter {
	name: String,
	kind: ParameterKind,
	value: ParameterValue,
	should_inherit: bool,
}

impl Parameter {
	pub fn new(kind: ParameterKind, name: impl Into<String>, value: Option<Instance>) -> Self {
		Self {
			name: name.into(),
			kind,
			value: ParameterValue::Constant(value),
			should_inherit: false,
		}
	}

	/// Parameter whose value is computed from the resolving context and target.
	pub fn computed<F>(kind: ParameterKind, name: impl Into<String>, callback: F) -> Self
	where
		F: Fn(&Context, &Target) -> Option<Instance> + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			kind,
			value: ParameterValue::Computed(Arc::new(callback)),
			should_inherit: false,
		}
	}

	pub fn constructor_argument(name: impl Into<String>, value: Instance) -> Self {
		Self::new(ParameterKind::ConstructorArgument, name, Some(value))
	}

	pub fn property(name: impl Into<String>, value: Instance) -> Self {
		Self::new(ParameterKind::Property, name, Some(value))
	}

	pub fn method_argument(name: impl Into<String>, value: Instance) -> Self {
		Self::new(ParameterKind::MethodArgument, name, Some(value))
	}

	/// Marks the parameter as flowing into child requests.
	pub fn inherited(mut self) -> Self {
		self.should_inherit = true;
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn kind(&self) -> ParameterKind {
		self.kind
	}

	pub fn should_inherit(&self) -> bool {
		self.should_inherit
	}

	/// Whether this parameter overrides `target`.
	pub fn applies_to(&self, target: &Target) -> bool {
		self.kind == target.kind() && self.name == target.name()
	}

	/// Value for `target` in `context`.
	pub fn value(&self, context: &Context, target: &Target) -> Option<Instance> {
		match &self.value {
			ParameterValue::Constant(value) => value.clone(),
			ParameterValue::Computed(callback) => callback(context, target),
		}
	}
}

impl fmt::Debug for Parameter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Parameter")
			.field("name", &self.name)
			.field("kind", &self.kind)
			.field("should_inherit", &self.should_inherit)
			.finish_non_exhaustive()
	}
}

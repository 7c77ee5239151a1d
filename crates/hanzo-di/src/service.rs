//! Runtime service type descriptors
//!
//! Rust erases generics at runtime, so the engine works with explicit
//! descriptors: a [`ServiceType`] names a type, says whether it is an
//! interface or a concrete type, carries its generic shape (open template or
//! closed instantiation) and lists the interfaces it implements.

use crate::error::{ActivationError, ActivationResult};
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Whether a service type is abstract or instantiable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
	/// A trait object or other abstraction
	Interface,
	/// An instantiable type
	Concrete,
}

#[derive(Debug, Clone)]
enum GenericShape {
	NonGeneric,
	Open { arity: usize },
	Closed {
		definition: ServiceType,
		arguments: Vec<ServiceType>,
	},
}

#[derive(Debug, Clone)]
struct TypeDescriptor {
	name: String,
	kind: TypeKind,
	shape: GenericShape,
	interfaces: Vec<ServiceType>,
	type_id: Option<TypeId>,
}

/// Identity of a requestable service.
///
/// Cloning is cheap. Two service types are equal when they have the same
/// name, the same openness and the same generic arguments; the list of
/// implemented interfaces does not take part in identity.
///
/// # Examples
///
/// ```
/// use hanzo_di::ServiceType;
///
/// let dictionary = ServiceType::open_interface("IDictionary", 2);
/// let closed = dictionary
///     .make_generic(vec![ServiceType::of::<i32>(), ServiceType::of::<String>()])
///     .unwrap();
///
/// assert!(closed.is_closed_generic());
/// assert_eq!(closed.generic_definition(), Some(dictionary));
/// ```
#[derive(Clone)]
pub struct ServiceType(Arc<TypeDescriptor>);

impl ServiceType {
	/// Concrete descriptor derived from a Rust type.
	pub fn of<T: ?Sized + 'static>() -> Self {
		Self::from_descriptor(TypeDescriptor {
			name: std::any::type_name::<T>().to_string(),
			kind: TypeKind::Concrete,
			shape: GenericShape::NonGeneric,
			interfaces: Vec::new(),
			type_id: Some(TypeId::of::<T>()),
		})
	}

	/// Interface descriptor derived from a Rust type, usually `dyn Trait`.
	pub fn interface<T: ?Sized + 'static>() -> Self {
		Self::from_descriptor(TypeDescriptor {
			name: std::any::type_name::<T>().to_string(),
			kind: TypeKind::Interface,
			shape: GenericShape::NonGeneric,
			interfaces: Vec::new(),
			type_id: Some(TypeId::of::<T>()),
		})
	}

	/// Named concrete descriptor with no Rust type behind it.
	pub fn named(name: impl Into<String>) -> Self {
		Self::declared(name.into(), TypeKind::Concrete, GenericShape::NonGeneric)
	}

	/// Named interface descriptor with no Rust type behind it.
	pub fn named_interface(name: impl Into<String>) -> Self {
		Self::declared(name.into(), TypeKind::Interface, GenericShape::NonGeneric)
	}

	/// Open generic interface template with `arity` unbound parameters.
	pub fn open_interface(name: impl Into<String>, arity: usize) -> Self {
		Self::declared(name.into(), TypeKind::Interface, GenericShape::Open { arity })
	}

	/// Open generic concrete template with `arity` unbound parameters.
	pub fn open_concrete(name: impl Into<String>, arity: usize) -> Self {
		Self::declared(name.into(), TypeKind::Concrete, GenericShape::Open { arity })
	}

	fn declared(name: String, kind: TypeKind, shape: GenericShape) -> Self {
		Self::from_descriptor(TypeDescriptor {
			name,
			kind,
			shape,
			interfaces: Vec::new(),
			type_id: None,
		})
	}

	fn from_descriptor(descriptor: TypeDescriptor) -> Self {
		Self(Arc::new(descriptor))
	}

	/// Closes an open template over `arguments`.
	///
	/// Interfaces declared on the template are closed positionally: an
	/// interface that is itself an open template of the same arity is closed
	/// over the same arguments.
	pub fn make_generic(&self, arguments: Vec<ServiceType>) -> ActivationResult<ServiceType> {
		let GenericShape::Open { arity } = self.0.shape else {
			return Err(ActivationError::GenericArity {
				definition: self.to_string(),
				expected: 0,
				actual: arguments.len(),
			});
		};
		if arity != arguments.len() {
			return Err(ActivationError::GenericArity {
				definition: self.to_string(),
				expected: arity,
				actual: arguments.len(),
			});
		}

		let interfaces = self
			.0
			.interfaces
			.iter()
			.map(|interface| match interface.0.shape {
				GenericShape::Open { arity } if arity == arguments.len() => interface
					.make_generic(arguments.clone())
					.unwrap_or_else(|_| interface.clone()),
				_ => interface.clone(),
			})
			.collect();

		Ok(Self::from_descriptor(TypeDescriptor {
			name: self.0.name.clone(),
			kind: self.0.kind,
			shape: GenericShape::Closed {
				definition: self.clone(),
				arguments,
			},
			interfaces,
			type_id: None,
		}))
	}

	/// Returns a copy of this descriptor that also implements `interfaces`.
	pub fn with_interfaces<I>(&self, interfaces: I) -> Self
	where
		I: IntoIterator<Item = ServiceType>,
	{
		let mut descriptor = (*self.0).clone();
		descriptor.interfaces.extend(interfaces);
		Self::from_descriptor(descriptor)
	}

	/// Type name without generic arguments.
	pub fn name(&self) -> &str {
		&self.0.name
	}

	/// Interface or concrete.
	pub fn kind(&self) -> TypeKind {
		self.0.kind
	}

	/// Rust `TypeId`, when the descriptor was derived from a Rust type.
	pub fn type_id(&self) -> Option<TypeId> {
		self.0.type_id
	}

	pub fn is_interface(&self) -> bool {
		self.0.kind == TypeKind::Interface
	}

	/// `true` for templates with unbound parameters.
	pub fn is_open_generic(&self) -> bool {
		matches!(self.0.shape, GenericShape::Open { .. })
	}

	/// `true` for instantiations of an open template.
	pub fn is_closed_generic(&self) -> bool {
		matches!(self.0.shape, GenericShape::Closed { .. })
	}

	/// Template of a closed type, or the type itself when it is a template.
	pub fn generic_definition(&self) -> Option<ServiceType> {
		match &self.0.shape {
			GenericShape::NonGeneric => None,
			GenericShape::Open { .. } => Some(self.clone()),
			GenericShape::Closed { definition, .. } => Some(definition.clone()),
		}
	}

	/// Bound generic arguments; empty for open and non-generic types.
	pub fn generic_arguments(&self) -> &[ServiceType] {
		match &self.0.shape {
			GenericShape::Closed { arguments, .. } => arguments,
			_ => &[],
		}
	}

	/// Directly implemented interfaces and base types.
	pub fn interfaces(&self) -> &[ServiceType] {
		&self.0.interfaces
	}

	/// Whether `other` is this type or one of its transitive interfaces.
	pub fn is_assignable_to(&self, other: &ServiceType) -> bool {
		if self == other {
			return true;
		}
		self.0
			.interfaces
			.iter()
			.any(|interface| interface.is_assignable_to(other))
	}
}

impl PartialEq for ServiceType {
	fn eq(&self, other: &Self) -> bool {
		if Arc::ptr_eq(&self.0, &other.0) {
			return true;
		}
		self.0.name == other.0.name
			&& self.is_open_generic() == other.is_open_generic()
			&& self.generic_arguments() == other.generic_arguments()
	}
}

impl Eq for ServiceType {}

impl Hash for ServiceType {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.0.name.hash(state);
		self.is_open_generic().hash(state);
		self.generic_arguments().hash(state);
	}
}

impl fmt::Display for ServiceType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0.name)?;
		match &self.0.shape {
			GenericShape::NonGeneric => Ok(()),
			GenericShape::Open { arity } => {
				write!(f, "<{}>", ",".repeat(arity.saturating_sub(1)))
			}
			GenericShape::Closed { arguments, .. } => {
				let arguments: Vec<String> = arguments.iter().map(ToString::to_string).collect();
				write!(f, "<{}>", arguments.join(", "))
			}
		}
	}
}

impl fmt::Debug for ServiceType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ServiceType({self})")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	trait Weapon {}

	#[rstest]
	fn rust_derived_types_compare_by_name() {
		// Arrange
		let a = ServiceType::of::<String>();
		let b = ServiceType::of::<String>().with_interfaces([ServiceType::named_interface("IText")]);

		// Assert
		assert_eq!(a, b);
		assert_eq!(a.kind(), TypeKind::Concrete);
		assert_eq!(a.type_id(), Some(TypeId::of::<String>()));
	}

	#[rstest]
	fn interface_descriptor_is_not_concrete() {
		let weapon = ServiceType::interface::<dyn Weapon>();

		assert!(weapon.is_interface());
		assert!(!weapon.is_open_generic());
		assert_eq!(weapon.generic_definition(), None);
	}

	#[rstest]
	fn closed_generics_differ_by_arguments() {
		// Arrange
		let template = ServiceType::open_interface("IRepository", 1);

		// Act
		let of_int = template.make_generic(vec![ServiceType::of::<i32>()]).unwrap();
		let of_string = template.make_generic(vec![ServiceType::of::<String>()]).unwrap();

		// Assert
		assert_ne!(of_int, of_string);
		assert_ne!(of_int, template);
		assert_eq!(of_int.to_string(), "IRepository<i32>");
		assert_eq!(template.to_string(), "IRepository<>");
	}

	#[rstest]
	#[case(0)]
	#[case(2)]
	fn make_generic_rejects_wrong_arity(#[case] count: usize) {
		let template = ServiceType::open_interface("IRepository", 1);
		let arguments = vec![ServiceType::of::<i32>(); count];

		let result = template.make_generic(arguments);

		assert!(matches!(
			result,
			Err(ActivationError::GenericArity { expected: 1, .. })
		));
	}

	#[rstest]
	fn make_generic_closes_template_interfaces() {
		// Arrange
		let contract = ServiceType::open_interface("IDictionary", 2);
		let implementation = ServiceType::open_concrete("Dictionary", 2).with_interfaces([contract.clone()]);
		let arguments = vec![ServiceType::of::<i32>(), ServiceType::of::<String>()];

		// Act
		let closed = implementation.make_generic(arguments.clone()).unwrap();

		// Assert
		let expected = contract.make_generic(arguments).unwrap();
		assert!(closed.is_assignable_to(&expected));
	}
}

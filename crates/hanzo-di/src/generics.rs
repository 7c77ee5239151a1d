//! Generic argument inference for open-template bindings

use crate::service::ServiceType;
use std::collections::{HashSet, VecDeque};

/// Outcome of inferring a template's arguments from a requested type
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenericInference {
	/// Inferred arguments, positionally matching the template parameters
	pub arguments: Vec<ServiceType>,
	/// `true` whenever the binding was an open template, even if nothing could be inferred
	pub inferred: bool,
}

/// Infers the type arguments of `template` from the closed `requested` type.
///
/// The requested type's own definition is tried first, then every
/// transitively implemented interface in breadth-first order. A requested
/// type unrelated to the template yields an empty argument list that is
/// still marked as inferred; a non-template binding yields nothing and is
/// not marked.
///
/// # Examples
///
/// ```
/// use hanzo_di::{ServiceType, infer_generic_arguments};
///
/// let template = ServiceType::open_interface("IDictionary", 2);
/// let requested = template
///     .make_generic(vec![ServiceType::of::<i32>(), ServiceType::of::<String>()])
///     .unwrap();
///
/// let inference = infer_generic_arguments(&template, &requested);
/// assert!(inference.inferred);
/// assert_eq!(inference.arguments, vec![ServiceType::of::<i32>(), ServiceType::of::<String>()]);
/// ```
pub fn infer_generic_arguments(template: &ServiceType, requested: &ServiceType) -> GenericInference {
	if !template.is_open_generic() {
		return GenericInference::default();
	}

	let mut visited = HashSet::new();
	let mut queue = VecDeque::from([requested.clone()]);
	while let Some(candidate) = queue.pop_front() {
		if !visited.insert(candidate.clone()) {
			continue;
		}
		if candidate.is_closed_generic() && candidate.generic_definition().as_ref() == Some(template) {
			return GenericInference {
				arguments: candidate.generic_arguments().to_vec(),
				inferred: true,
			};
		}
		queue.extend(candidate.interfaces().iter().cloned());
	}

	GenericInference {
		arguments: Vec::new(),
		inferred: true,
	}
}

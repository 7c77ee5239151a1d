//! Binding precedence
//!
//! When several bindings match a request the engine keeps only the top
//! precedence tier. Precedence is decided by four discriminators, in order,
//! stopping at the first that differs:
//!
//! 1. a present binding beats an absent one
//! 2. a conditional binding beats an unconditional one
//! 3. a closed or non-generic binding beats an open-generic one
//! 4. an explicit binding beats an implicit one

use crate::binding::Binding;
use std::cmp::Ordering;
use std::sync::Arc;

/// Lexicographic rank of a binding; larger is stronger.
type Rank = (bool, bool, bool, bool);

/// Total order over candidate bindings
#[derive(Debug, Clone, Copy, Default)]
pub struct BindingPrecedenceComparer;

impl BindingPrecedenceComparer {
	fn rank(binding: Option<&Binding>) -> Rank {
		match binding {
			None => (false, false, false, false),
			Some(binding) => (
				true,
				binding.is_conditional(),
				!binding.service().is_open_generic(),
				!binding.is_implicit(),
			),
		}
	}

	/// `Greater` when `x` takes precedence over `y`.
	pub fn compare(x: Option<&Binding>, y: Option<&Binding>) -> Ordering {
		Self::rank(x).cmp(&Self::rank(y))
	}

	/// Candidates sharing the highest precedence, in their original order.
	pub fn top_tier(candidates: &[Arc<Binding>]) -> Vec<Arc<Binding>> {
		let Some(best) = candidates
			.iter()
			.map(|binding| Self::rank(Some(binding)))
			.max()
		else {
			return Vec::new();
		};
		candidates
			.iter()
			.filter(|binding| Self::rank(Some(binding)) == best)
			.cloned()
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::service::ServiceType;
	use proptest::prelude::*;
	use rstest::rstest;

	fn binding(conditional: bool, open: bool, implicit: bool) -> Arc<Binding> {
		let service = if open {
			ServiceType::open_interface("IRepository", 1)
		} else {
			ServiceType::named_interface("IRepository")
		};
		let mut builder = Binding::builder(service);
		if conditional {
			builder = builder.when(|_| true);
		}
		if implicit {
			builder = builder.implicit();
		}
		builder.build()
	}

	#[rstest]
	#[case(binding(true, false, false), binding(false, false, false))]
	#[case(binding(false, false, false), binding(false, true, false))]
	#[case(binding(false, false, false), binding(false, false, true))]
	#[case(binding(true, true, true), binding(false, false, false))]
	#[case(binding(false, true, false), binding(false, false, true))]
	fn stronger_binding_wins(#[case] stronger: Arc<Binding>, #[case] weaker: Arc<Binding>) {
		assert_eq!(
			BindingPrecedenceComparer::compare(Some(&stronger), Some(&weaker)),
			Ordering::Greater
		);
		assert_eq!(
			BindingPrecedenceComparer::compare(Some(&weaker), Some(&stronger)),
			Ordering::Less
		);
	}

	#[rstest]
	fn present_beats_absent() {
		let weakest = binding(false, true, true);

		assert_eq!(
			BindingPrecedenceComparer::compare(Some(&weakest), None),
			Ordering::Greater
		);
		assert_eq!(BindingPrecedenceComparer::compare(None, None), Ordering::Equal);
	}

	#[rstest]
	fn top_tier_keeps_every_tied_candidate() {
		// Arrange
		let first = binding(true, false, false);
		let unconditional = binding(false, false, false);
		let second = binding(true, false, false);

		// Act
		let tier = BindingPrecedenceComparer::top_tier(&[first.clone(), unconditional, second.clone()]);

		// Assert
		let ids: Vec<_> = tier.iter().map(|b| b.id()).collect();
		assert_eq!(ids, [first.id(), second.id()]);
	}

	#[rstest]
	fn top_tier_of_nothing_is_empty() {
		assert!(BindingPrecedenceComparer::top_tier(&[]).is_empty());
	}

	fn flags() -> impl Strategy<Value = (bool, bool, bool)> {
		(any::<bool>(), any::<bool>(), any::<bool>())
	}

	proptest! {
		#[test]
		fn compare_is_antisymmetric(x in flags(), y in flags()) {
			let x = binding(x.0, x.1, x.2);
			let y = binding(y.0, y.1, y.2);

			prop_assert_eq!(
				BindingPrecedenceComparer::compare(Some(&x), Some(&y)),
				BindingPrecedenceComparer::compare(Some(&y), Some(&x)).reverse()
			);
		}

		#[test]
		fn top_tier_members_are_never_beaten(candidates in prop::collection::vec(flags(), 1..8)) {
			let candidates: Vec<_> = candidates
				.into_iter()
				.map(|(conditional, open, implicit)| binding(conditional, open, implicit))
				.collect();

			let tier = BindingPrecedenceComparer::top_tier(&candidates);

			prop_assert!(!tier.is_empty());
			for winner in &tier {
				for candidate in &candidates {
					prop_assert_ne!(
						BindingPrecedenceComparer::compare(Some(candidate), Some(winner)),
						Ordering::Greater
					);
				}
			}
		}
	}
}

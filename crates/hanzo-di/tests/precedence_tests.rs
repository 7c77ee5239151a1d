//! Tests for binding precedence, ambiguity and multi-injection

use hanzo_di::{ActivationError, Binding, Kernel};
use hanzo_test::components::*;
use hanzo_test::{armed_kernel, kernel};
use rstest::*;
use std::sync::Arc;

/// Test two unconditional bindings for one service are ambiguous
#[rstest]
fn test_equal_bindings_are_ambiguous(armed_kernel: Arc<Kernel>) {
	// Arrange
	armed_kernel.bind(Binding::builder(weapon_service()).to(shuriken_service()).build());

	// Act
	let result = armed_kernel.get(&weapon_service());

	// Assert
	match result {
		Err(ActivationError::AmbiguousBindings {
			candidates, message, ..
		}) => {
			assert_eq!(candidates.len(), 2);
			assert!(candidates.iter().any(|candidate| candidate.contains("Sword")));
			assert!(candidates.iter().any(|candidate| candidate.contains("Shuriken")));
			assert!(message.contains("More than one matching bindings are available"));
		}
		other => panic!("Expected AmbiguousBindings, got {:?}", other.map(|_| ())),
	}
}

/// Test a conditional binding outranks an unconditional one
#[rstest]
fn test_conditional_binding_wins(armed_kernel: Arc<Kernel>) {
	// Arrange
	armed_kernel.bind(
		Binding::builder(weapon_service())
			.to(shuriken_service())
			.when(|_| true)
			.build(),
	);

	// Act
	let resolved = armed_kernel.get(&weapon_service()).unwrap();

	// Assert
	assert!(resolved.is::<Shuriken>());
}

/// Test a conditional binding whose condition fails is not a candidate
#[rstest]
fn test_failing_condition_is_ignored(armed_kernel: Arc<Kernel>) {
	// Arrange
	armed_kernel.bind(
		Binding::builder(weapon_service())
			.to(shuriken_service())
			.when(|_| false)
			.build(),
	);

	// Act
	let resolved = armed_kernel.get(&weapon_service()).unwrap();

	// Assert
	assert!(resolved.is::<Sword>());
}

/// Test an explicit binding for a concrete type replaces its implicit self-binding
#[rstest]
fn test_explicit_binding_beats_implicit(kernel: Arc<Kernel>) {
	// Arrange
	let implicit = kernel.get(&sword_service()).unwrap();
	kernel.bind(Binding::builder(sword_service()).in_singleton_scope().build());

	// Act
	let first = kernel.get(&sword_service()).unwrap();
	let second = kernel.get(&sword_service()).unwrap();

	// Assert
	assert_ne!(implicit, first);
	assert_eq!(first, second);
}

/// Test the implicit self-binding is registered once and reused
#[rstest]
fn test_implicit_self_binding_registered_once(kernel: Arc<Kernel>) {
	// Act
	kernel.get(&sword_service()).unwrap();
	kernel.get(&sword_service()).unwrap();

	// Assert
	let bindings = kernel.bindings_for(&sword_service());
	assert_eq!(bindings.len(), 1);
	assert!(bindings[0].is_implicit());
}

/// Test multi-injection returns one instance per matching binding
#[rstest]
fn test_get_all_returns_every_binding(armed_kernel: Arc<Kernel>) {
	// Arrange
	armed_kernel.bind(Binding::builder(weapon_service()).to(shuriken_service()).build());

	// Act
	let weapons = armed_kernel.get_all(&weapon_service()).unwrap();

	// Assert
	assert_eq!(weapons.len(), 2);
	assert!(weapons[0].is::<Sword>());
	assert!(weapons[1].is::<Shuriken>());
}

/// Test multi-injection leaves out conditional bindings that do not match
#[rstest]
fn test_get_all_skips_unmatched_conditions(armed_kernel: Arc<Kernel>) {
	// Arrange
	armed_kernel.bind(
		Binding::builder(weapon_service())
			.to(shuriken_service())
			.when(|_| false)
			.build(),
	);

	// Act
	let weapons = armed_kernel.get_all(&weapon_service()).unwrap();

	// Assert
	assert_eq!(weapons.len(), 1);
}

/// Test multi-injection of an unbound interface is empty rather than an error
#[rstest]
fn test_get_all_unbound_is_empty(kernel: Arc<Kernel>) {
	// Act
	let weapons = kernel.get_all(&weapon_service()).unwrap();

	// Assert
	assert!(weapons.is_empty());
}

/// Test ambiguity inside a dependency names the consumer in the activation path
#[rstest]
fn test_ambiguity_in_dependency_shows_path(armed_kernel: Arc<Kernel>) {
	// Arrange
	armed_kernel.bind(Binding::builder(weapon_service()).to(shuriken_service()).build());

	// Act
	let error = armed_kernel.get(&ninja_service()).unwrap_err();

	// Assert
	let message = error.to_string();
	assert!(matches!(error, ActivationError::AmbiguousBindings { .. }));
	assert!(message.contains("2) Injection of dependency"));
	assert!(message.contains("into parameter weapon of constructor of type"));
	assert!(message.contains("1) Request for"));
}

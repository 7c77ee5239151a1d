//! Tests for cycle detection and the resolution depth guard

use hanzo_di::{ActivationError, Binding, Kernel, KernelSettings};
use hanzo_test::components::*;
use hanzo_test::{kernel, kernel_with_settings};
use rstest::*;
use std::sync::Arc;

/// Test a constructor cycle is reported with the binding path
#[rstest]
fn test_constructor_cycle_is_detected(kernel: Arc<Kernel>) {
	// Act
	let error = kernel.get(&chicken_service()).unwrap_err();

	// Assert
	assert!(error.is_circular_dependency());
	match error {
		ActivationError::CircularDependency { path, message } => {
			let hops: Vec<&str> = path.split(" -> ").collect();
			assert_eq!(hops.len(), 3);
			assert!(hops[0].ends_with("Chicken"));
			assert!(hops[1].ends_with("Egg"));
			assert!(hops[2].ends_with("Chicken"));
			assert!(message.contains(&format!("Cycle: {}", path)));
			assert!(message.contains("3) Injection of dependency"));
		}
		other => panic!("Expected CircularDependency, got {:?}", other),
	}
}

/// Test a cycle through properties of transient components is detected
#[rstest]
fn test_transient_property_cycle_is_detected(kernel: Arc<Kernel>) {
	// Act
	let result = kernel.get(&yin_service());

	// Assert
	assert!(result.is_err_and(|error| error.is_circular_dependency()));
}

/// Test singletons wired to each other through properties resolve
#[rstest]
fn test_singleton_property_cycle_resolves(kernel: Arc<Kernel>) {
	// Arrange
	kernel.bind(Binding::builder(yin_service()).in_singleton_scope().build());
	kernel.bind(Binding::builder(yang_service()).in_singleton_scope().build());

	// Act
	let yin_instance = kernel.get(&yin_service()).unwrap();
	let yin = yin_instance.downcast::<Yin>().unwrap();

	// Assert
	let yang = yin.peer.get().expect("yang injected").downcast::<Yang>().unwrap();
	assert_eq!(yang.peer.get(), Some(&yin_instance));
	assert_eq!(kernel.cache().len(), 2);
}

/// Test a cycle leaves nothing behind in the cache
#[rstest]
fn test_failed_cycle_leaves_cache_empty(kernel: Arc<Kernel>) {
	// Arrange
	kernel.bind(Binding::builder(chicken_service()).in_singleton_scope().build());

	// Act
	let result = kernel.get(&chicken_service());

	// Assert
	assert!(result.is_err());
	assert!(kernel.cache().is_empty());
}

/// Test requests nested deeper than the configured limit are refused
#[rstest]
#[case(1, true)]
#[case(2, false)]
fn test_max_resolution_depth(#[case] limit: usize, #[case] expect_error: bool) {
	// Arrange
	let kernel = kernel_with_settings(KernelSettings::default().with_max_resolution_depth(limit));
	kernel.bind(Binding::builder(weapon_service()).to(sword_service()).build());

	// Act
	let result = kernel.get(&dojo_service());

	// Assert
	if expect_error {
		assert!(matches!(result, Err(ActivationError::MaxDepthExceeded(2))));
	} else {
		let dojo = result.unwrap().downcast::<Dojo>().unwrap();
		let sensei = dojo.sensei().unwrap().downcast::<Samurai>().unwrap();
		assert!(sensei.weapon().is_some());
	}
}

//! Tests for the hanzo facade re-exports

use hanzo::prelude::*;
use hanzo_test::components::*;
use hanzo_test::kernel;
use rstest::*;
use std::sync::Arc;

/// Test the prelude covers a full bind-resolve-dispose cycle
#[rstest]
fn test_prelude_bind_resolve_dispose(kernel: Arc<Kernel>) {
	// Arrange
	kernel.bind(
		Binding::builder(weapon_service())
			.to(sword_service())
			.in_singleton_scope()
			.build(),
	);

	// Act
	let samurai = kernel.get_as::<Samurai>(&samurai_service()).unwrap();
	let sword = samurai.weapon().unwrap().downcast::<Sword>().unwrap();
	kernel.dispose();

	// Assert
	assert_eq!(sword.disposals(), 1);
}

/// Test settings loaded through the facade reach the kernel
#[rstest]
fn test_facade_settings() {
	// Arrange
	let settings = KernelSettings::default().with_max_resolution_depth(3);

	// Act
	let kernel = Kernel::with_settings(settings).unwrap();

	// Assert
	assert_eq!(kernel.settings().max_resolution_depth, 3);
	assert!(hanzo::di::Kernel::with_settings(KernelSettings::default().with_max_resolution_depth(0)).is_err());
}

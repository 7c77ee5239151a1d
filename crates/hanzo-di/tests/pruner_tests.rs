//! Tests for the background cache pruner (pruner feature)

use hanzo_di::{Binding, KernelSettings, ScopeKey};
use hanzo_test::components::*;
use hanzo_test::kernel_with_settings;
use rstest::*;
use std::sync::Arc;
use std::time::Duration;

fn fast_pruning() -> KernelSettings {
	KernelSettings::default()
		.with_cache_pruning_interval(Duration::from_secs(1))
		.unwrap()
}

/// Test the pruner deactivates instances whose scope was dropped
#[rstest]
#[tokio::test]
async fn test_pruner_reclaims_dead_scopes() {
	// Arrange
	let kernel = kernel_with_settings(fast_pruning());
	let session = Arc::new(String::from("session"));
	let key = ScopeKey::of(&session);
	kernel.bind(
		Binding::builder(weapon_service())
			.to(sword_service())
			.in_scope(move |_| Some(key.clone()))
			.build(),
	);
	let sword = kernel.get_as::<Sword>(&weapon_service()).unwrap();
	let pruner = kernel.start_pruner();

	// Act
	drop(session);
	tokio::time::sleep(Duration::from_millis(1500)).await;

	// Assert
	assert!(pruner.is_running());
	assert_eq!(sword.disposals(), 1);
	assert!(kernel.cache().is_empty());
}

/// Test the pruner leaves live scopes alone
#[rstest]
#[tokio::test]
async fn test_pruner_keeps_live_scopes() {
	// Arrange
	let kernel = kernel_with_settings(fast_pruning());
	kernel.bind(
		Binding::builder(weapon_service())
			.to(sword_service())
			.in_singleton_scope()
			.build(),
	);
	let sword = kernel.get_as::<Sword>(&weapon_service()).unwrap();
	let _pruner = kernel.start_pruner();

	// Act
	tokio::time::sleep(Duration::from_millis(1500)).await;

	// Assert
	assert_eq!(sword.disposals(), 0);
	assert_eq!(kernel.cache().len(), 1);
}

/// Test the pruner task ends once its kernel is gone
#[rstest]
#[tokio::test]
async fn test_pruner_exits_with_kernel() {
	// Arrange
	let kernel = kernel_with_settings(fast_pruning());
	let pruner = kernel.start_pruner();

	// Act
	drop(kernel);
	tokio::time::sleep(Duration::from_millis(2500)).await;

	// Assert
	assert!(!pruner.is_running());
}

/// Test stopping the pruner aborts its task
#[rstest]
#[tokio::test]
async fn test_pruner_stop() {
	// Arrange
	let kernel = kernel_with_settings(fast_pruning());
	let pruner = kernel.start_pruner();

	// Act
	pruner.stop();
	tokio::time::sleep(Duration::from_millis(50)).await;

	// Assert
	assert!(!pruner.is_running());
}

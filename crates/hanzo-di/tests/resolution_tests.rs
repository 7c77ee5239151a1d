//! Tests for binding selection, constructor selection and parameters

use hanzo_di::{ActivationError, Binding, Instance, Kernel, KernelSettings, Parameter, ServiceType};
use hanzo_test::components::*;
use hanzo_test::{armed_kernel, kernel, kernel_with_settings};
use rstest::*;
use std::sync::Arc;

/// Test transient bindings produce a fresh instance per resolution
#[rstest]
fn test_transient_binding_creates_new_instances(kernel: Arc<Kernel>) {
	// Arrange
	kernel.bind(Binding::builder(weapon_service()).to(sword_service()).build());

	// Act
	let first = kernel.get(&weapon_service()).unwrap();
	let second = kernel.get(&weapon_service()).unwrap();

	// Assert
	assert!(first.is::<Sword>());
	assert_ne!(first, second);
}

/// Test singleton bindings share one instance per kernel
#[rstest]
fn test_singleton_binding_shares_instance(kernel: Arc<Kernel>) {
	// Arrange
	kernel.bind(
		Binding::builder(weapon_service())
			.to(sword_service())
			.in_singleton_scope()
			.build(),
	);

	// Act
	let first = kernel.get(&weapon_service()).unwrap();
	let second = kernel.get(&weapon_service()).unwrap();

	// Assert
	assert_eq!(first, second);
	assert_eq!(kernel.cache().len(), 1);
}

/// Test constants resolve to the very instance that was bound
#[rstest]
fn test_constant_binding_returns_bound_instance(kernel: Arc<Kernel>) {
	// Arrange
	let shuriken = Instance::new(Shuriken);
	kernel.bind(
		Binding::builder(weapon_service())
			.to_constant(shuriken.clone())
			.build(),
	);

	// Act
	let resolved = kernel.get(&weapon_service()).unwrap();

	// Assert
	assert_eq!(resolved, shuriken);
}

/// Test factory bindings receive the context of the resolution
#[rstest]
fn test_method_binding_sees_requested_service(kernel: Arc<Kernel>) {
	// Arrange
	kernel.bind(
		Binding::builder(weapon_service())
			.to_method(|context| {
				assert_eq!(context.request().service(), &weapon_service());
				Ok(Some(Instance::new(Shuriken)))
			})
			.build(),
	);

	// Act
	let resolved = kernel.get(&weapon_service()).unwrap();

	// Assert
	assert!(resolved.is::<Shuriken>());
}

/// Test the constructor with the most resolvable parameters wins
#[rstest]
fn test_greediest_satisfiable_constructor_is_chosen(armed_kernel: Arc<Kernel>) {
	// Act
	let samurai = armed_kernel.get_as::<Samurai>(&samurai_service()).unwrap();

	// Assert
	let weapon = samurai.weapon().expect("weapon constructor should have been used");
	assert!(weapon.is::<Sword>());
}

/// Test constructors whose parameters cannot be resolved are skipped
#[rstest]
fn test_unsatisfiable_constructor_is_skipped(kernel: Arc<Kernel>) {
	// Act
	let samurai = kernel.get_as::<Samurai>(&samurai_service()).unwrap();

	// Assert
	assert!(samurai.weapon().is_none());
}

/// Test a marked constructor is used even when a bare one exists
#[rstest]
fn test_marked_constructor_is_preferred(armed_kernel: Arc<Kernel>) {
	// Act
	let ninja = armed_kernel.get_as::<Ninja>(&ninja_service()).unwrap();

	// Assert
	assert!(ninja.weapon.is::<Sword>());
}

/// Test a marked constructor with a missing dependency fails instead of falling back
#[rstest]
fn test_unsatisfiable_marked_constructor_fails(kernel: Arc<Kernel>) {
	// Act
	let result = kernel.get(&ninja_service());

	// Assert
	match result {
		Err(ActivationError::UnsatisfiedConstructor { implementation, message }) => {
			assert!(implementation.contains("Ninja"));
			assert!(message.contains("No constructor was available"));
			assert!(message.contains("1) Request for"));
		}
		other => panic!("Expected UnsatisfiedConstructor, got {:?}", other.map(|_| ())),
	}
}

/// Test constructor parameters override bindings
#[rstest]
fn test_request_parameter_overrides_binding(armed_kernel: Arc<Kernel>) {
	// Arrange
	let shuriken = Instance::new(Shuriken);
	let parameters = vec![Parameter::constructor_argument("weapon", shuriken.clone())];

	// Act
	let samurai = armed_kernel
		.get_with_parameters(&samurai_service(), parameters)
		.unwrap()
		.downcast::<Samurai>()
		.unwrap();

	// Assert
	assert_eq!(samurai.weapon(), Some(&shuriken));
}

/// Test a parameter makes an otherwise unresolvable constructor satisfiable
#[rstest]
fn test_parameter_satisfies_constructor(kernel: Arc<Kernel>) {
	// Arrange
	let parameters = vec![Parameter::constructor_argument("weapon", Instance::new(Shuriken))];

	// Act
	let samurai = kernel
		.get_with_parameters(&samurai_service(), parameters)
		.unwrap()
		.downcast::<Samurai>()
		.unwrap();

	// Assert
	assert!(samurai.weapon().is_some_and(|weapon| weapon.is::<Shuriken>()));
}

/// Test binding parameters apply to every resolution through the binding
#[rstest]
fn test_binding_parameter_is_applied(kernel: Arc<Kernel>) {
	// Arrange
	let shuriken = Instance::new(Shuriken);
	kernel.bind(
		Binding::builder(samurai_service())
			.with_parameter(Parameter::constructor_argument("weapon", shuriken.clone()))
			.build(),
	);

	// Act
	let samurai = kernel.get_as::<Samurai>(&samurai_service()).unwrap();

	// Assert
	assert_eq!(samurai.weapon(), Some(&shuriken));
}

/// Test named requests select the binding carrying that name
#[rstest]
fn test_named_binding_is_selected(kernel: Arc<Kernel>) {
	// Arrange
	kernel.bind(Binding::builder(weapon_service()).to(sword_service()).named("sword").build());
	kernel.bind(
		Binding::builder(weapon_service())
			.to(shuriken_service())
			.named("star")
			.build(),
	);

	// Act
	let star = kernel.get_named(&weapon_service(), "star").unwrap();
	let sword = kernel.get_named(&weapon_service(), "sword").unwrap();

	// Assert
	assert!(star.is::<Shuriken>());
	assert!(sword.is::<Sword>());
}

/// Test a name nobody bound is reported as a missing binding
#[rstest]
fn test_unknown_name_has_no_matching_binding(armed_kernel: Arc<Kernel>) {
	// Act
	let result = armed_kernel.get_named(&weapon_service(), "bow");

	// Assert
	assert!(matches!(result, Err(ActivationError::NoMatchingBindings { .. })));
}

/// Test conditional bindings are only used where their condition holds
#[rstest]
fn test_when_injected_into_targets_one_consumer(armed_kernel: Arc<Kernel>) {
	// Arrange
	armed_kernel.bind(
		Binding::builder(weapon_service())
			.to(shuriken_service())
			.when_injected_into(samurai_service())
			.build(),
	);

	// Act
	let samurai = armed_kernel.get_as::<Samurai>(&samurai_service()).unwrap();
	let ninja = armed_kernel.get_as::<Ninja>(&ninja_service()).unwrap();
	let root = armed_kernel.get(&weapon_service()).unwrap();

	// Assert
	assert!(samurai.weapon().is_some_and(|weapon| weapon.is::<Shuriken>()));
	assert!(ninja.weapon.is::<Sword>());
	assert!(root.is::<Sword>());
}

/// Test method injection resolves and passes the method's arguments
#[rstest]
fn test_method_injection_calls_method(kernel: Arc<Kernel>) {
	// Act
	let dojo = kernel.get_as::<Dojo>(&dojo_service()).unwrap();

	// Assert
	assert!(dojo.sensei().is_some_and(|sensei| sensei.is::<Samurai>()));
}

/// Test interfaces without a binding are not self-bindable
#[rstest]
fn test_unbound_interface_reports_missing_binding(kernel: Arc<Kernel>) {
	// Act
	let result = kernel.get(&weapon_service());

	// Assert
	match result {
		Err(ActivationError::NoMatchingBindings { service, message }) => {
			assert_eq!(service, weapon_service().to_string());
			assert!(message.starts_with("Error activating"));
			assert!(message.contains("Suggestions:"));
		}
		other => panic!("Expected NoMatchingBindings, got {:?}", other.map(|_| ())),
	}
}

/// Test optional resolution yields nothing instead of failing
#[rstest]
fn test_try_get_unbound_interface_is_none(kernel: Arc<Kernel>) {
	// Act
	let resolved = kernel.try_get(&weapon_service()).unwrap();

	// Assert
	assert!(resolved.is_none());
}

/// Test implicit self-binding can be turned off
#[rstest]
fn test_implicit_self_binding_disabled() {
	// Arrange
	let kernel = kernel_with_settings(KernelSettings::default().with_implicit_self_binding(false));

	// Act
	let result = kernel.get(&sword_service());

	// Assert
	assert!(matches!(result, Err(ActivationError::NoMatchingBindings { .. })));
}

/// Test types without a declared plan are not self-bound
#[rstest]
fn test_type_without_plan_is_not_self_bound(kernel: Arc<Kernel>) {
	// Act
	let result = kernel.get(&ServiceType::of::<String>());

	// Assert
	assert!(matches!(result, Err(ActivationError::NoMatchingBindings { .. })));
}

/// Test a null factory result is rejected unless null injection is allowed
#[rstest]
#[case(false, true)]
#[case(true, false)]
fn test_null_injection_setting(#[case] allow: bool, #[case] expect_error: bool) {
	// Arrange
	let kernel = kernel_with_settings(KernelSettings::default().with_null_injection(allow));
	kernel.bind(Binding::builder(weapon_service()).to_method(|_| Ok(None)).build());

	// Act
	let result = kernel.resolve_single(kernel.request(weapon_service()));

	// Assert
	if expect_error {
		assert!(matches!(result, Err(ActivationError::ProviderReturnedNull { .. })));
	} else {
		assert!(result.unwrap().is_none());
	}
}

/// Test get reports a null resolution through the kernel's formatter
#[rstest]
fn test_get_on_null_uses_formatter() {
	// Arrange
	let kernel = kernel_with_settings(KernelSettings::default().with_null_injection(true));
	kernel.bind(Binding::builder(weapon_service()).to_method(|_| Ok(None)).build());

	// Act
	let result = kernel.get(&weapon_service());

	// Assert
	match result {
		Err(ActivationError::ProviderReturnedNull { message, .. }) => {
			assert_eq!(message, kernel.formatter().no_instance_resolved(&weapon_service()));
			assert!(message.contains("Resolution produced no instance."));
		}
		other => panic!("Expected ProviderReturnedNull, got {:?}", other),
	}
}

/// Test a null constructor argument reaches the constructor when allowed
#[rstest]
fn test_null_injected_into_constructor() {
	// Arrange
	let kernel = kernel_with_settings(KernelSettings::default().with_null_injection(true));
	kernel.bind(Binding::builder(weapon_service()).to_method(|_| Ok(None)).build());

	// Act
	let samurai = kernel.get_as::<Samurai>(&samurai_service()).unwrap();

	// Assert
	assert!(samurai.weapon().is_none());
}

/// Test errors raised by user factories propagate unchanged
#[rstest]
fn test_factory_error_propagates(kernel: Arc<Kernel>) {
	// Arrange
	kernel.bind(
		Binding::builder(weapon_service())
			.to_method(|_| Err(ActivationError::custom(std::io::Error::other("forge is cold"))))
			.build(),
	);

	// Act
	let error = kernel.get(&weapon_service()).unwrap_err();

	// Assert
	assert!(matches!(error, ActivationError::Custom(_)));
	assert_eq!(error.to_string(), "forge is cold");
}

/// Test unbinding removes every binding of a service
#[rstest]
fn test_unbind_removes_bindings(armed_kernel: Arc<Kernel>) {
	// Act
	let removed = armed_kernel.unbind(&weapon_service());

	// Assert
	assert_eq!(removed, 1);
	assert!(armed_kernel.try_get(&weapon_service()).unwrap().is_none());
}

/// Test a disposed kernel refuses further resolution
#[rstest]
fn test_disposed_kernel_refuses_resolution(armed_kernel: Arc<Kernel>) {
	// Arrange
	armed_kernel.dispose();

	// Act
	let result = armed_kernel.get(&weapon_service());

	// Assert
	assert!(matches!(result, Err(ActivationError::KernelDisposed)));
	assert!(matches!(armed_kernel.begin_block(), Err(ActivationError::KernelDisposed)));
}

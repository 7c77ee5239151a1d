//! rstest fixtures
//!
//! Fixtures are designed to be used with rstest's `#[rstest]` attribute.

use crate::components::*;
use crate::logging::init_test_logging;
use hanzo_di::{
	ActivationError, Binding, Instance, Kernel, KernelSettings, Plan, PlanRegistry, ServiceType, Target,
};
use rstest::fixture;
use std::sync::Arc;

/// Plans of every sample component.
pub fn sample_plans() -> PlanRegistry {
	let registry = PlanRegistry::new();

	registry.register(
		Plan::builder(sword_service())
			.constructor(vec![], |_| Ok(Instance::new(Sword::default())))
			.build(),
	);
	registry.register(
		Plan::builder(shuriken_service())
			.constructor(vec![], |_| Ok(Instance::new(Shuriken)))
			.build(),
	);
	registry.register(
		Plan::builder(samurai_service())
			.constructor(vec![], |_| Ok(Instance::new(Samurai::new(None))))
			.constructor(
				vec![Target::constructor_argument("weapon", weapon_service())],
				|args| Ok(Instance::new(Samurai::new(args.instance(0).cloned()))),
			)
			.build(),
	);
	registry.register(
		Plan::builder(ninja_service())
			.constructor(vec![], |_| {
				Err(ActivationError::custom(std::io::Error::other(
					"the bare constructor must not be chosen over the marked one",
				)))
			})
			.marked_constructor(
				vec![Target::constructor_argument("weapon", weapon_service())],
				|args| {
					let weapon = args
						.instance(0)
						.cloned()
						.ok_or(ActivationError::MissingArgument(0))?;
					Ok(Instance::new(Ninja { weapon }))
				},
			)
			.build(),
	);
	registry.register(
		Plan::builder(dojo_service())
			.constructor(vec![], |_| Ok(Instance::new(Dojo::default())))
			.method_of::<Dojo, _>(
				"train",
				vec![Target::method_argument("sensei", samurai_service())],
				|dojo, args| {
					if let Some(sensei) = args.instance(0) {
						dojo.train(sensei.clone());
					}
					Ok(())
				},
			)
			.build(),
	);
	registry.register(
		Plan::builder(lantern_service())
			.constructor(vec![], |_| Ok(Instance::new(Lantern::default())))
			.build(),
	);
	registry.register(
		Plan::builder(yin_service())
			.constructor(vec![], |_| Ok(Instance::new(Yin::default())))
			.property_of::<Yin, _>(Target::property("peer", yang_service()), |yin, peer| {
				if let Some(peer) = peer {
					let _ = yin.peer.set(peer);
				}
				Ok(())
			})
			.build(),
	);
	registry.register(
		Plan::builder(yang_service())
			.constructor(vec![], |_| Ok(Instance::new(Yang::default())))
			.property_of::<Yang, _>(Target::property("peer", yin_service()), |yang, peer| {
				if let Some(peer) = peer {
					let _ = yang.peer.set(peer);
				}
				Ok(())
			})
			.build(),
	);
	registry.register(
		Plan::builder(chicken_service())
			.constructor(
				vec![Target::constructor_argument("egg", egg_service())],
				|args| {
					let egg = args.instance(0).cloned().ok_or(ActivationError::MissingArgument(0))?;
					Ok(Instance::new(Chicken { egg }))
				},
			)
			.build(),
	);
	registry.register(
		Plan::builder(egg_service())
			.constructor(
				vec![Target::constructor_argument("chicken", chicken_service())],
				|args| {
					let chicken = args.instance(0).cloned().ok_or(ActivationError::MissingArgument(0))?;
					Ok(Instance::new(Egg { chicken }))
				},
			)
			.build(),
	);
	registry.register(
		Plan::builder(repository_service())
			.constructor(vec![], |args| {
				let closed = repository_service().make_generic(args.generic_arguments().to_vec())?;
				Ok(Instance::new(Repository::new(closed)))
			})
			.build(),
	);

	registry
}

#[fixture]
pub fn plans() -> Arc<PlanRegistry> {
	Arc::new(sample_plans())
}

/// Kernel with every sample plan and no explicit binding
#[fixture]
pub fn kernel(plans: Arc<PlanRegistry>) -> Arc<Kernel> {
	init_test_logging();
	match Kernel::builder().plans(plans).build() {
		Ok(kernel) => kernel,
		Err(error) => panic!("Failed to build test kernel: {}", error),
	}
}

/// Kernel built with `settings` and every sample plan
pub fn kernel_with_settings(settings: KernelSettings) -> Arc<Kernel> {
	init_test_logging();
	match Kernel::builder().plans(plans()).settings(settings).build() {
		Ok(kernel) => kernel,
		Err(error) => panic!("Failed to build test kernel: {}", error),
	}
}

/// Kernel where `IWeapon` resolves to a transient `Sword`
#[fixture]
pub fn armed_kernel(kernel: Arc<Kernel>) -> Arc<Kernel> {
	kernel.bind(Binding::builder(weapon_service()).to(sword_service()).build());
	kernel
}

/// Closed `IRepository<T>` for element type `T`.
pub fn repository_of(element: ServiceType) -> ServiceType {
	match repository_contract().make_generic(vec![element]) {
		Ok(closed) => closed,
		Err(error) => panic!("IRepository takes one type argument: {}", error),
	}
}

//! # Hanzo Dependency Resolution
//!
//! Binding selection, scoped instance caching and activation for hanzo.
//!
//! ## Features
//!
//! - **Bindings**: services bound to themselves, to other types, to constants,
//!   factories or providers, optionally named or conditional
//! - **Precedence**: conditional beats unconditional, closed beats open-generic,
//!   explicit beats implicit; ties are reported as ambiguous
//! - **Generics**: open-template bindings serve closed requests, with inferred
//!   type arguments
//! - **Scopes**: transient, singleton, per-thread, per-block or any object,
//!   held weakly and pruned once dropped
//! - **Pipeline**: property and method injection, initialize, start/stop,
//!   binding actions and disposal, each run at most once per instance
//! - **Pruner** (`pruner` feature): periodic cache pruning on a Tokio task
//!
//! ## Example
//!
//! ```rust
//! use hanzo_di::{
//!     ActivationResult, Binding, Component, Disposable, Instance, Kernel, Plan, PlanRegistry,
//!     ServiceType, Target,
//! };
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! trait Weapon: Send + Sync {
//!     fn hit(&self) -> &'static str;
//! }
//!
//! #[derive(Default)]
//! struct Sword {
//!     sheathed: AtomicBool,
//! }
//!
//! impl Weapon for Sword {
//!     fn hit(&self) -> &'static str {
//!         "chopped"
//!     }
//! }
//!
//! impl Disposable for Sword {
//!     fn dispose(&self) -> ActivationResult<()> {
//!         self.sheathed.store(true, Ordering::SeqCst);
//!         Ok(())
//!     }
//! }
//!
//! impl Component for Sword {
//!     fn as_disposable(&self) -> Option<&dyn Disposable> {
//!         Some(self)
//!     }
//! }
//!
//! struct Samurai {
//!     weapon: Arc<Sword>,
//! }
//!
//! impl Component for Samurai {}
//!
//! let weapon = ServiceType::interface::<dyn Weapon>();
//! let sword = ServiceType::of::<Sword>().with_interfaces([weapon.clone()]);
//! let samurai = ServiceType::of::<Samurai>();
//!
//! let plans = Arc::new(PlanRegistry::new());
//! plans.register(
//!     Plan::builder(sword.clone())
//!         .constructor(vec![], |_| Ok(Instance::new(Sword::default())))
//!         .build(),
//! );
//! plans.register(
//!     Plan::builder(samurai.clone())
//!         .constructor(vec![Target::constructor_argument("weapon", weapon.clone())], |args| {
//!             Ok(Instance::new(Samurai { weapon: args.get::<Sword>(0)? }))
//!         })
//!         .build(),
//! );
//!
//! let kernel = Kernel::builder().plans(plans).build().unwrap();
//! kernel.bind(Binding::builder(weapon).to(sword).in_singleton_scope().build());
//!
//! let warrior = kernel.get_as::<Samurai>(&samurai).unwrap();
//! assert_eq!(warrior.weapon.hit(), "chopped");
//!
//! kernel.dispose();
//! assert!(warrior.weapon.sheathed.load(Ordering::SeqCst));
//! ```

mod binding;
mod cache;
mod context;
mod error;
mod formatter;
mod generics;
mod instance;
mod kernel;
mod metadata;
mod parameter;
pub mod pipeline;
mod planning;
mod precedence;
mod provider;
#[cfg(feature = "pruner")]
mod pruner;
mod request;
mod scope;
mod service;
mod settings;

pub use binding::{
	Binding, BindingBuilder, BindingId, BindingTarget, Condition, LifecycleAction, ProviderCallback,
	ScopeCallback, ScopeKind,
};
pub use cache::Cache;
pub use context::{Context, ContextBuilder};
pub use error::{ActivationError, ActivationResult, BoxError};
pub use formatter::{DefaultExceptionFormatter, ExceptionFormatter, format_activation_path};
pub use generics::{GenericInference, infer_generic_arguments};
pub use instance::{
	Component, Disposable, Initializable, Instance, InstanceReference, InteropProxy, Startable, Value,
};
pub use kernel::{ActivationBlock, BlockScope, Kernel, KernelBuilder};
pub use metadata::BindingMetadata;
pub use parameter::{Parameter, ParameterKind};
pub use pipeline::{ActivationCache, ActivationStrategy, Pipeline};
pub use planning::{
	Arguments, ConstructorDirective, Directive, MethodDirective, Plan, PlanBuilder, PlanRegistry, Planner,
	PropertyDirective, Target,
};
pub use precedence::BindingPrecedenceComparer;
pub use provider::{CallbackProvider, ConstantProvider, Provider, StandardProvider};
#[cfg(feature = "pruner")]
pub use pruner::CachePruner;
pub use request::{Constraint, Request, ScopeOverride};
pub use scope::{ScopeKey, ThreadScope, current_thread_scope};
pub use service::{ServiceType, TypeKind};
pub use settings::{KernelSettings, SettingsError};

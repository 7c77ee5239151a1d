//! # Hanzo
//!
//! An object-graph construction engine: declare how services are bound,
//! and the kernel selects a binding, constructs the instance, injects its
//! dependencies, caches it in its scope and runs it through an activation
//! pipeline.
//!
//! ## Feature Flags
//!
//! - `pruner` (default) - Background cache pruning on a tokio task
//!
//! ## Quick Example
//!
//! ```rust
//! use hanzo::prelude::*;
//! use std::sync::Arc;
//!
//! struct Shuriken;
//! impl Component for Shuriken {}
//!
//! let shuriken = ServiceType::of::<Shuriken>();
//! let plans = Arc::new(PlanRegistry::new());
//! plans.register(
//!     Plan::builder(shuriken.clone())
//!         .constructor(vec![], |_| Ok(Instance::new(Shuriken)))
//!         .build(),
//! );
//!
//! let kernel = Kernel::builder().plans(plans).build().unwrap();
//! let block = kernel.begin_block().unwrap();
//! let thrown = block.get(&shuriken).unwrap();
//! assert_eq!(thrown, block.get(&shuriken).unwrap());
//! assert_ne!(thrown, kernel.get(&shuriken).unwrap());
//! ```

/// Resolution engine
pub mod di {
	pub use hanzo_di::*;
}

// Re-export the activation pipeline
pub use hanzo_di::pipeline;

// Re-export kernel and resolution roots
pub use hanzo_di::{ActivationBlock, Kernel, KernelBuilder, KernelSettings, SettingsError};

// Re-export bindings
pub use hanzo_di::{Binding, BindingBuilder, BindingTarget, ScopeKind};

// Re-export errors
pub use hanzo_di::{ActivationError, ActivationResult};

// Re-export instances and lifecycle hooks
pub use hanzo_di::{Component, Disposable, Initializable, Instance, InteropProxy, Startable, Value};

// Re-export planning
pub use hanzo_di::{Arguments, Plan, PlanBuilder, PlanRegistry, Planner, Target};

// Re-export requests, parameters and scopes
pub use hanzo_di::{Parameter, ParameterKind, Request, ScopeKey, ServiceType};

#[cfg(feature = "pruner")]
pub use hanzo_di::CachePruner;

/// Prelude module for convenient imports
pub mod prelude {
	pub use crate::{
		ActivationBlock, ActivationError, ActivationResult, Arguments, Binding, Component, Disposable,
		Initializable, Instance, Kernel, KernelSettings, Parameter, Plan, PlanRegistry, Request,
		ScopeKey, ServiceType, Startable, Target, Value,
	};

	#[cfg(feature = "pruner")]
	pub use crate::CachePruner;
}

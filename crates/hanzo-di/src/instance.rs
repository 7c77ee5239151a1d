//! Type-erased instances and their lifecycle capabilities
//!
//! Every object the engine materializes implements [`Component`]. Lifecycle
//! behaviour is opt-in: a component that wants to be initialized, started or
//! disposed overrides the matching `as_*` hook and returns itself.
//!
//! ```
//! use hanzo_di::{ActivationResult, Component, Disposable, Instance};
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! #[derive(Default)]
//! struct Connection {
//!     closed: AtomicBool,
//! }
//!
//! impl Disposable for Connection {
//!     fn dispose(&self) -> ActivationResult<()> {
//!         self.closed.store(true, Ordering::SeqCst);
//!         Ok(())
//!     }
//! }
//!
//! impl Component for Connection {
//!     fn as_disposable(&self) -> Option<&dyn Disposable> {
//!         Some(self)
//!     }
//! }
//!
//! let instance = Instance::new(Connection::default());
//! assert!(instance.component().as_disposable().is_some());
//! ```

use crate::error::{ActivationError, ActivationResult};
use crate::service::ServiceType;
use downcast_rs::{DowncastSync, impl_downcast};
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, PoisonError, RwLock, Weak};

/// Upper bound on proxy indirections followed by [`InstanceReference::find`]
const MAX_PROXY_DEPTH: usize = 16;

/// Base trait of every resolvable object.
pub trait Component: DowncastSync {
	/// Exposes the initialize hook run once on activation.
	fn as_initializable(&self) -> Option<&dyn Initializable> {
		None
	}

	/// Exposes the start/stop hooks.
	fn as_startable(&self) -> Option<&dyn Startable> {
		None
	}

	/// Exposes the dispose hook run on deactivation.
	fn as_disposable(&self) -> Option<&dyn Disposable> {
		None
	}

	/// Exposes the object this component stands in for.
	fn as_proxy(&self) -> Option<&dyn InteropProxy> {
		None
	}

	/// Runtime type used to look up this component's plan.
	fn component_type(&self) -> ServiceType {
		ServiceType::of::<Self>()
	}
}

impl_downcast!(sync Component);

/// Components with a one-shot initialization step
pub trait Initializable: Send + Sync {
	fn initialize(&self) -> ActivationResult<()>;
}

/// Components that run between activation and deactivation
pub trait Startable: Send + Sync {
	fn start(&self) -> ActivationResult<()>;
	fn stop(&self) -> ActivationResult<()>;
}

/// Components owning resources released on deactivation
pub trait Disposable: Send + Sync {
	fn dispose(&self) -> ActivationResult<()>;
}

/// Components that forward to another instance
pub trait InteropProxy: Send + Sync {
	/// The instance behind this proxy, if it is still reachable.
	fn target(&self) -> Option<Instance>;
}

/// Plain data injected as a component (constructor arguments, constants).
///
/// ```
/// use hanzo_di::{Instance, Value};
///
/// let damage = Instance::new(Value(12u32));
/// assert_eq!(**damage.downcast::<Value<u32>>().unwrap(), 12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Value<T>(pub T);

impl<T: Send + Sync + 'static> Component for Value<T> {}

impl<T> Deref for Value<T> {
	type Target = T;

	fn deref(&self) -> &T {
		&self.0
	}
}

/// Shared handle to a materialized component.
///
/// Equality is reference identity.
#[derive(Clone)]
pub struct Instance(Arc<dyn Component>);

impl Instance {
	pub fn new<T: Component>(value: T) -> Self {
		Self(Arc::new(value))
	}

	pub fn from_arc<T: Component>(value: Arc<T>) -> Self {
		Self(value)
	}

	pub fn from_dyn(value: Arc<dyn Component>) -> Self {
		Self(value)
	}

	pub fn component(&self) -> &dyn Component {
		self.0.as_ref()
	}

	pub fn is<T: Component>(&self) -> bool {
		self.0.as_ref().is::<T>()
	}

	/// Typed view of this instance.
	pub fn downcast<T: Component>(&self) -> ActivationResult<Arc<T>> {
		self.try_downcast::<T>().ok_or_else(|| ActivationError::InvalidCast {
			expected: std::any::type_name::<T>(),
			actual: self.concrete_type().to_string(),
		})
	}

	pub fn try_downcast<T: Component>(&self) -> Option<Arc<T>> {
		self.0.clone().downcast_arc::<T>().ok()
	}

	/// Runtime type of the wrapped component.
	pub fn concrete_type(&self) -> ServiceType {
		self.0.component_type()
	}

	/// Reference identity.
	pub fn ptr_eq(&self, other: &Instance) -> bool {
		std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
	}

	/// Address of the wrapped allocation, stable while the instance lives.
	pub fn address(&self) -> usize {
		Arc::as_ptr(&self.0) as *const () as usize
	}

	pub(crate) fn downgrade(&self) -> Weak<dyn Component> {
		Arc::downgrade(&self.0)
	}
}

impl PartialEq for Instance {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl Eq for Instance {}

impl fmt::Debug for Instance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Instance({} @ {:#x})", self.concrete_type(), self.address())
	}
}

/// Mutable holder carrying an instance through the activation pipeline.
///
/// Strategies may swap the held instance; the cache keeps the reference, so
/// a replacement is visible to later lookups.
pub struct InstanceReference {
	instance: RwLock<Instance>,
}

impl InstanceReference {
	pub fn new(instance: Instance) -> Self {
		Self {
			instance: RwLock::new(instance),
		}
	}

	/// Currently held instance.
	pub fn instance(&self) -> Instance {
		self.instance
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	/// Replaces the held instance.
	pub fn replace(&self, instance: Instance) {
		*self.instance.write().unwrap_or_else(PoisonError::into_inner) = instance;
	}

	/// Applies `probe` to the held instance and then to every proxy target
	/// behind it, returning the first hit.
	pub fn find<R, F>(&self, mut probe: F) -> Option<R>
	where
		F: FnMut(&dyn Component) -> Option<R>,
	{
		let mut current = self.instance();
		for _ in 0..MAX_PROXY_DEPTH {
			if let Some(found) = probe(current.component()) {
				return Some(found);
			}
			let next = current.component().as_proxy().and_then(InteropProxy::target)?;
			current = next;
		}
		None
	}

	/// Whether the held instance, or anything it proxies, is a `T`.
	pub fn is<T: Component>(&self) -> bool {
		self.find(|component| component.is::<T>().then_some(())).is_some()
	}
}

impl fmt::Debug for InstanceReference {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InstanceReference")
			.field("instance", &self.instance())
			.finish()
	}
}

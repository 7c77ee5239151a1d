//! Sample components and their service types

use hanzo_di::{
	ActivationResult, Component, Disposable, Initializable, Instance, InteropProxy, ServiceType, Startable,
};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Something a warrior can fight with
pub trait Weapon: Send + Sync {
	fn hit(&self, target: &str) -> String;
}

pub fn weapon_service() -> ServiceType {
	ServiceType::interface::<dyn Weapon>()
}

/// Disposable weapon counting how often it was disposed
#[derive(Debug, Default)]
pub struct Sword {
	disposals: AtomicUsize,
}

impl Sword {
	pub fn disposals(&self) -> usize {
		self.disposals.load(Ordering::SeqCst)
	}
}

impl Weapon for Sword {
	fn hit(&self, target: &str) -> String {
		format!("Chopped {} clean in half", target)
	}
}

impl Disposable for Sword {
	fn dispose(&self) -> ActivationResult<()> {
		self.disposals.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

impl Component for Sword {
	fn as_disposable(&self) -> Option<&dyn Disposable> {
		Some(self)
	}
}

pub fn sword_service() -> ServiceType {
	ServiceType::of::<Sword>().with_interfaces([weapon_service()])
}

#[derive(Debug, Default)]
pub struct Shuriken;

impl Weapon for Shuriken {
	fn hit(&self, target: &str) -> String {
		format!("Pierced {}'s armor", target)
	}
}

impl Component for Shuriken {}

pub fn shuriken_service() -> ServiceType {
	ServiceType::of::<Shuriken>().with_interfaces([weapon_service()])
}

/// Warrior with a weapon-taking constructor and a bare one
#[derive(Debug)]
pub struct Samurai {
	weapon: Option<Instance>,
}

impl Samurai {
	pub fn new(weapon: Option<Instance>) -> Self {
		Self { weapon }
	}

	pub fn weapon(&self) -> Option<&Instance> {
		self.weapon.as_ref()
	}
}

impl Component for Samurai {}

pub fn samurai_service() -> ServiceType {
	ServiceType::of::<Samurai>()
}

/// Warrior whose only constructor is marked and needs a weapon
#[derive(Debug)]
pub struct Ninja {
	pub weapon: Instance,
}

impl Component for Ninja {}

pub fn ninja_service() -> ServiceType {
	ServiceType::of::<Ninja>()
}

/// Training hall receiving its sensei through an injection method
#[derive(Debug, Default)]
pub struct Dojo {
	sensei: OnceLock<Instance>,
}

impl Dojo {
	pub fn sensei(&self) -> Option<&Instance> {
		self.sensei.get()
	}

	pub fn train(&self, sensei: Instance) {
		let _ = self.sensei.set(sensei);
	}
}

impl Component for Dojo {}

pub fn dojo_service() -> ServiceType {
	ServiceType::of::<Dojo>()
}

/// Counts every lifecycle hook the pipeline runs on it
#[derive(Debug, Default)]
pub struct Lantern {
	pub initialized: AtomicUsize,
	pub started: AtomicUsize,
	pub stopped: AtomicUsize,
	pub disposed: AtomicUsize,
}

impl Lantern {
	pub fn counts(&self) -> [usize; 4] {
		[
			self.initialized.load(Ordering::SeqCst),
			self.started.load(Ordering::SeqCst),
			self.stopped.load(Ordering::SeqCst),
			self.disposed.load(Ordering::SeqCst),
		]
	}
}

impl Initializable for Lantern {
	fn initialize(&self) -> ActivationResult<()> {
		self.initialized.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

impl Startable for Lantern {
	fn start(&self) -> ActivationResult<()> {
		self.started.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}

	fn stop(&self) -> ActivationResult<()> {
		self.stopped.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

impl Disposable for Lantern {
	fn dispose(&self) -> ActivationResult<()> {
		self.disposed.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

impl Component for Lantern {
	fn as_initializable(&self) -> Option<&dyn Initializable> {
		Some(self)
	}

	fn as_startable(&self) -> Option<&dyn Startable> {
		Some(self)
	}

	fn as_disposable(&self) -> Option<&dyn Disposable> {
		Some(self)
	}
}

pub fn lantern_service() -> ServiceType {
	ServiceType::of::<Lantern>()
}

/// Stand-in forwarding to another component
#[derive(Debug)]
pub struct Decoy {
	pub target: Instance,
}

impl InteropProxy for Decoy {
	fn target(&self) -> Option<Instance> {
		Some(self.target.clone())
	}
}

impl Component for Decoy {
	fn as_proxy(&self) -> Option<&dyn InteropProxy> {
		Some(self)
	}
}

/// One half of a pair wired to each other through properties
#[derive(Debug, Default)]
pub struct Yin {
	pub peer: OnceLock<Instance>,
}

impl Component for Yin {}

/// Other half of the property-wired pair
#[derive(Debug, Default)]
pub struct Yang {
	pub peer: OnceLock<Instance>,
}

impl Component for Yang {}

pub fn yin_service() -> ServiceType {
	ServiceType::of::<Yin>()
}

pub fn yang_service() -> ServiceType {
	ServiceType::of::<Yang>()
}

/// One half of a pair wired to each other through constructors
#[derive(Debug)]
pub struct Chicken {
	pub egg: Instance,
}

impl Component for Chicken {}

/// Other half of the constructor-wired pair
#[derive(Debug)]
pub struct Egg {
	pub chicken: Instance,
}

impl Component for Egg {}

pub fn chicken_service() -> ServiceType {
	ServiceType::of::<Chicken>()
}

pub fn egg_service() -> ServiceType {
	ServiceType::of::<Egg>()
}

/// Open generic contract `IRepository<T>`
pub fn repository_contract() -> ServiceType {
	ServiceType::open_interface("IRepository", 1)
}

/// Open generic implementation `Repository<T>` of [`repository_contract`]
pub fn repository_service() -> ServiceType {
	ServiceType::open_concrete("Repository", 1).with_interfaces([repository_contract()])
}

/// Instance of the closed `Repository<T>` it was constructed for
#[derive(Debug)]
pub struct Repository {
	closed: ServiceType,
}

impl Repository {
	pub fn new(closed: ServiceType) -> Self {
		Self { closed }
	}

	/// Element type `T`.
	pub fn element(&self) -> Option<&ServiceType> {
		self.closed.generic_arguments().first()
	}
}

impl Component for Repository {
	fn component_type(&self) -> ServiceType {
		self.closed.clone()
	}
}

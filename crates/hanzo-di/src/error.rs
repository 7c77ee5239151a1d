//! Activation errors

use crate::settings::SettingsError;

/// Boxed error produced by user code (providers, actions, lifecycle hooks)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type used throughout the resolution engine
pub type ActivationResult<T> = Result<T, ActivationError>;

/// Errors raised while selecting bindings and activating instances.
///
/// Every variant except [`ActivationError::MissingCollaborator`] and
/// [`ActivationError::Settings`] is terminal for the current resolve call.
/// The engine never wraps an error it did not raise itself: failures coming
/// from user code travel through [`ActivationError::Custom`] untouched.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
	/// No binding (explicit or implicit) matches the request
	#[error("{message}")]
	NoMatchingBindings {
		/// Requested service
		service: String,
		/// Formatted diagnostic including the activation path
		message: String,
	},

	/// More than one binding shares the top precedence tier
	#[error("{message}")]
	AmbiguousBindings {
		/// Requested service
		service: String,
		/// Descriptions of every tied binding
		candidates: Vec<String>,
		/// Formatted diagnostic including the activation path
		message: String,
	},

	/// A provider returned no instance while null injection is disallowed
	#[error("{message}")]
	ProviderReturnedNull {
		/// Requested service
		service: String,
		/// Formatted diagnostic including the activation path
		message: String,
	},

	/// A binding was entered twice on the same resolution chain
	#[error("{message}")]
	CircularDependency {
		/// Cycle path (format: A -> B -> A)
		path: String,
		/// Formatted diagnostic including the activation path
		message: String,
	},

	/// No declared constructor can be satisfied, or the marked one cannot
	#[error("{message}")]
	UnsatisfiedConstructor {
		/// Implementation type being constructed
		implementation: String,
		/// Formatted diagnostic including the activation path
		message: String,
	},

	/// Maximum resolution depth exceeded
	#[error(
		"Maximum resolution depth exceeded: {0}\nThis likely indicates an extremely deep or circular dependency chain."
	)]
	MaxDepthExceeded(usize),

	/// A resolved instance could not be viewed as the requested Rust type
	#[error("Cannot cast instance of {actual} to {expected}")]
	InvalidCast {
		/// Requested Rust type
		expected: &'static str,
		/// Concrete type of the instance
		actual: String,
	},

	/// An injector received fewer arguments than it reads
	#[error("Missing injection argument at position {0}")]
	MissingArgument(usize),

	/// Closing an open generic with the wrong number of arguments
	#[error("Generic type {definition} expects {expected} type arguments but {actual} were supplied")]
	GenericArity {
		/// Open template name
		definition: String,
		/// Template arity
		expected: usize,
		/// Supplied argument count
		actual: usize,
	},

	/// The owning kernel has been disposed
	#[error("The kernel has been disposed; no further resolution is possible")]
	KernelDisposed,

	/// A required collaborator was not supplied to a builder
	#[error("Missing required collaborator: {0}")]
	MissingCollaborator(&'static str),

	/// Invalid kernel settings
	#[error(transparent)]
	Settings(#[from] SettingsError),

	/// Error raised by user code, propagated unchanged
	#[error(transparent)]
	Custom(BoxError),
}

impl ActivationError {
	/// Wraps an arbitrary user error so it can leave a provider, action or hook.
	///
	/// # Examples
	///
	/// ```
	/// use hanzo_di::ActivationError;
	///
	/// let error = ActivationError::custom(std::io::Error::other("disk full"));
	/// assert_eq!(error.to_string(), "disk full");
	/// ```
	pub fn custom<E>(error: E) -> Self
	where
		E: Into<BoxError>,
	{
		Self::Custom(error.into())
	}

	/// Returns `true` for the circular-dependency variant.
	pub fn is_circular_dependency(&self) -> bool {
		matches!(self, Self::CircularDependency { .. })
	}
}

//! Kernel settings
//!
//! Settings can be built in code, loaded from a TOML or JSON file, or read
//! from `HANZO_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound accepted for `max_resolution_depth`
const DEPTH_LIMIT: usize = 10_000;

/// Behaviour switches of a [`Kernel`](crate::Kernel)
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelSettings {
	/// Whether providers may return no instance
	pub allow_null_injection: bool,

	/// Whether unbound concrete types with a plan are bound to themselves
	pub implicit_self_binding: bool,

	/// Whether the pipeline tracks activated instances so each one is
	/// activated and deactivated at most once
	pub activation_cache_enabled: bool,

	/// Deepest request chain accepted before resolution fails
	pub max_resolution_depth: usize,

	/// Period of the background cache pruner, in seconds
	pub cache_pruning_interval_secs: u64,
}

impl Default for KernelSettings {
	fn default() -> Self {
		Self {
			allow_null_injection: false,
			implicit_self_binding: true,
			activation_cache_enabled: true,
			max_resolution_depth: 100,
			cache_pruning_interval_secs: 30,
		}
	}
}

impl KernelSettings {
	/// Create new settings with defaults
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_null_injection(mut self, allow: bool) -> Self {
		self.allow_null_injection = allow;
		self
	}

	pub fn with_implicit_self_binding(mut self, enabled: bool) -> Self {
		self.implicit_self_binding = enabled;
		self
	}

	pub fn with_activation_cache(mut self, enabled: bool) -> Self {
		self.activation_cache_enabled = enabled;
		self
	}

	pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
		self.max_resolution_depth = depth;
		self
	}

	/// Sets the pruning period. The period is stored in whole seconds, so a
	/// zero or fractional `interval` is rejected.
	pub fn with_cache_pruning_interval(mut self, interval: Duration) -> Result<Self, SettingsError> {
		if interval.as_secs() == 0 || interval.subsec_nanos() != 0 {
			return Err(SettingsError::ValidationError(format!(
				"cache_pruning_interval must be a positive whole number of seconds, got {:?}",
				interval
			)));
		}
		self.cache_pruning_interval_secs = interval.as_secs();
		Ok(self)
	}

	pub fn cache_pruning_interval(&self) -> Duration {
		Duration::from_secs(self.cache_pruning_interval_secs)
	}

	/// Validate settings
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.max_resolution_depth == 0 {
			return Err(SettingsError::ValidationError(
				"max_resolution_depth must be at least 1".to_string(),
			));
		}

		if self.max_resolution_depth > DEPTH_LIMIT {
			return Err(SettingsError::ValidationError(format!(
				"max_resolution_depth must not exceed {}",
				DEPTH_LIMIT
			)));
		}

		if self.cache_pruning_interval_secs == 0 {
			return Err(SettingsError::ValidationError(
				"cache_pruning_interval_secs must be at least 1".to_string(),
			));
		}

		Ok(())
	}

	/// Load settings from environment variables
	///
	/// Unset variables keep their defaults.
	pub fn from_env() -> Result<Self, SettingsError> {
		let mut settings = Self::default();

		if let Ok(value) = std::env::var("HANZO_ALLOW_NULL_INJECTION") {
			settings.allow_null_injection = parse_flag("HANZO_ALLOW_NULL_INJECTION", &value)?;
		}

		if let Ok(value) = std::env::var("HANZO_IMPLICIT_SELF_BINDING") {
			settings.implicit_self_binding = parse_flag("HANZO_IMPLICIT_SELF_BINDING", &value)?;
		}

		if let Ok(value) = std::env::var("HANZO_ACTIVATION_CACHE_ENABLED") {
			settings.activation_cache_enabled = parse_flag("HANZO_ACTIVATION_CACHE_ENABLED", &value)?;
		}

		if let Ok(value) = std::env::var("HANZO_MAX_RESOLUTION_DEPTH") {
			settings.max_resolution_depth = value.trim().parse().map_err(|e| {
				SettingsError::ParseError(format!("HANZO_MAX_RESOLUTION_DEPTH: {}", e))
			})?;
		}

		if let Ok(value) = std::env::var("HANZO_CACHE_PRUNING_INTERVAL") {
			settings.cache_pruning_interval_secs = value.trim().parse().map_err(|e| {
				SettingsError::ParseError(format!("HANZO_CACHE_PRUNING_INTERVAL: {}", e))
			})?;
		}

		settings.validate()?;
		Ok(settings)
	}

	/// Load settings from a configuration file
	///
	/// The format follows the extension: `.toml` or `.json`.
	pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
		let path = path.into();
		let contents = std::fs::read_to_string(&path).map_err(|e| {
			SettingsError::FileError(format!("Failed to read {}: {}", path.display(), e))
		})?;

		let settings: KernelSettings = match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => toml::from_str(&contents)
				.map_err(|e| SettingsError::ParseError(format!("TOML parse error: {}", e)))?,
			Some("json") => serde_json::from_str(&contents)
				.map_err(|e| SettingsError::ParseError(format!("JSON parse error: {}", e)))?,
			_ => {
				return Err(SettingsError::UnsupportedFormat(
					"Supported formats: .toml, .json".to_string(),
				));
			}
		};

		settings.validate()?;
		Ok(settings)
	}
}

fn parse_flag(key: &str, value: &str) -> Result<bool, SettingsError> {
	match value.trim().to_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		other => Err(SettingsError::ParseError(format!(
			"{}: expected a boolean, got {:?}",
			key, other
		))),
	}
}

/// Settings error
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("File error: {0}")]
	FileError(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Unsupported format: {0}")]
	UnsupportedFormat(String),
}

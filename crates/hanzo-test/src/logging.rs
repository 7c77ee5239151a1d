//! Test logging utilities
//!
//! Provides utilities for initializing logging in test environments.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Initialize logging for tests (call once)
///
/// Uses `tracing-subscriber` with the test writer. The filter comes from
/// `RUST_LOG` and defaults to `hanzo_di=debug`.
///
/// # Examples
///
/// ```
/// use hanzo_test::logging::init_test_logging;
///
/// init_test_logging();
/// init_test_logging();
/// ```
pub fn init_test_logging() {
	INIT.call_once(|| {
		let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hanzo_di=debug"));
		let _ = tracing_subscriber::fmt()
			.with_env_filter(filter)
			.with_test_writer()
			.try_init();
	});
}

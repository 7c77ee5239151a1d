//! Test fixtures for hanzo
//!
//! Sample components (warriors, weapons, lifecycle probes, cyclic pairs, a
//! generic repository), their plans, rstest fixtures building kernels over
//! them, and one-time logging setup.

pub mod components;
pub mod fixtures;
pub mod logging;

pub use fixtures::{armed_kernel, kernel, kernel_with_settings, plans, repository_of, sample_plans};
pub use logging::init_test_logging;

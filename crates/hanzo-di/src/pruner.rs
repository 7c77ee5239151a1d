//! Background cache pruning

use crate::cache::Cache;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Periodically prunes a [`Cache`] on a Tokio task.
///
/// The task holds the cache weakly and ends on its own once the cache is
/// gone. Dropping the pruner stops it.
#[derive(Debug)]
pub struct CachePruner {
	handle: JoinHandle<()>,
}

impl CachePruner {
	/// Spawns the pruning task; must be called within a Tokio runtime.
	pub fn start(cache: &Arc<Cache>, period: Duration) -> Self {
		let cache: Weak<Cache> = Arc::downgrade(cache);
		let handle = tokio::spawn(async move {
			let mut interval = tokio::time::interval(period);
			interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
			// The first tick completes immediately.
			interval.tick().await;

			loop {
				interval.tick().await;
				let Some(cache) = cache.upgrade() else {
					tracing::debug!("cache dropped, pruner exiting");
					break;
				};
				let pruned = cache.prune();
				if pruned > 0 {
					tracing::debug!(pruned, "background prune");
				}
			}
		});
		Self { handle }
	}

	pub fn is_running(&self) -> bool {
		!self.handle.is_finished()
	}

	pub fn stop(&self) {
		self.handle.abort();
	}
}

impl Drop for CachePruner {
	fn drop(&mut self) {
		self.handle.abort();
	}
}

//! Waiting for a rendering surface.
//!
//! The UI mounts containers on its own schedule, so the engine cannot
//! assume a surface exists when a display starts. [`wait_for_surface`] is a
//! one-shot future that resolves once the container is mounted. It retries
//! with a fixed delay and is cancelled by dropping it (or aborting the task
//! that awaits it) when the display is torn down first.

use std::sync::Arc;
use std::time::Duration;

use super::surface::{SharedSurface, SurfaceRegistry};
use crate::error::ScopeError;

/// Default delay between readiness checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Resolve to the container's surface once it has been mounted.
pub async fn wait_for_surface(
    registry: Arc<SurfaceRegistry>,
    id: String,
    poll_interval: Duration,
) -> SharedSurface {
    let mut attempts: u32 = 0;
    loop {
        match registry.create_surface(&id) {
            Ok(surface) => {
                tracing::info!(container = %id, attempts, "rendering surface ready");
                return surface;
            }
            Err(ScopeError::SurfaceNotReady(_)) => {
                attempts += 1;
                tracing::debug!(container = %id, attempts, "surface not ready, retrying");
                tokio::time::sleep(poll_interval).await;
            }
            Err(e) => {
                tracing::warn!(container = %id, error = %e, "unexpected surface error, retrying");
                tokio::time::sleep(poll_interval).await;
            }
        }
    }
}

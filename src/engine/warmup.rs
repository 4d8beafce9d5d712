use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::registry::AnchorRegistry;
use crate::error::SessionError;
use crate::platform::{TargetSet, TrackingEngine, VideoStream};

/// Load the target set, configure registered anchors and run the calibration pass.
///
/// Steps run strictly in order; the registry lock is never held across an await.
/// A session stopped while the targets load leaves the registry untouched.
pub async fn prime_engine(
    engine: &Arc<dyn TrackingEngine>,
    video: &Arc<dyn VideoStream>,
    target_src: &str,
    registry: &Mutex<AnchorRegistry>,
    cancel: &CancellationToken,
) -> Result<TargetSet, SessionError> {
    let targets = engine
        .add_targets(target_src)
        .await
        .map_err(|error| SessionError::TargetLoad {
            source_url: target_src.to_string(),
            error,
        })?;
    info!(
        "loaded {} target(s) from {}",
        targets.dimensions.len(),
        target_src
    );

    let configured = {
        let mut registry = registry.lock();
        // Checked under the lock: stop cancels before it resets the registry.
        if cancel.is_cancelled() {
            return Err(SessionError::Stopped);
        }
        registry.load_targets(targets.dimensions.clone())
    };
    debug!("{} anchor(s) configured from target geometry", configured);

    engine
        .dummy_run(Arc::clone(video))
        .await
        .map_err(SessionError::Engine)?;
    debug!("calibration pass complete");

    Ok(targets)
}

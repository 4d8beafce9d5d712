// Resize reactor: recompute the camera projection whenever the viewport changes.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::geometry::{
    mat4_from_column_major, resolve_viewport, ContainerSize, GeometryError, ProjectionParams,
    VideoDimensions,
};
use crate::platform::{PerspectiveCamera, TrackingEngine, VideoStream, ViewportHandle};

pub struct ResizeReactor {
    viewport: ViewportHandle,
    camera: Arc<dyn PerspectiveCamera>,
    video: Arc<dyn VideoStream>,
    engine: Arc<dyn TrackingEngine>,
    video_size: VideoDimensions,
}

impl ResizeReactor {
    pub fn new(
        viewport: ViewportHandle,
        camera: Arc<dyn PerspectiveCamera>,
        video: Arc<dyn VideoStream>,
        engine: Arc<dyn TrackingEngine>,
        video_size: VideoDimensions,
    ) -> Self {
        Self {
            viewport,
            camera,
            video,
            engine,
            video_size,
        }
    }

    /// Resolve against the current container size and raw projection, then
    /// apply to the camera and the video overlay.
    pub fn apply(&self) -> Result<ProjectionParams, GeometryError> {
        let proj = mat4_from_column_major(&self.engine.projection_matrix());
        let params = resolve_viewport(self.video_size, self.viewport.size(), &proj)?;
        self.camera.apply_projection(&params);
        self.video.set_overlay(&params.overlay);
        debug!("video overlay {}", params.overlay.to_css());
        Ok(params)
    }

    /// Recompute on every notification until cancelled. No debouncing.
    pub fn spawn(
        self: Arc<Self>,
        mut notifications: mpsc::UnboundedReceiver<ContainerSize>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    notified = notifications.recv() => {
                        let Some(size) = notified else { break };
                        debug!("viewport resized to {}x{}", size.width, size.height);
                        if let Err(e) = self.apply() {
                            warn!("skipping viewport update: {}", e);
                        }
                    }
                }
            }
            debug!("resize reactor stopped");
        })
    }
}

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::{CameraConstraints, UiSettings};
use crate::geometry::{Mat4, OverlayBox, ProjectionParams, Real, TargetGeometry, VideoDimensions};

/// Camera capture entry point of the host platform.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Whether the platform can capture from a camera at all.
    fn supports_camera(&self) -> bool;

    /// Open a camera stream and attach it to a new on-screen video surface.
    ///
    /// The surface is expected to autoplay muted and inline, absolutely
    /// positioned behind the scene. Permission denial is an error.
    async fn open_camera(&self, constraints: CameraConstraints) -> Result<Arc<dyn VideoStream>>;
}

/// A live camera stream bound to its video surface.
#[async_trait]
pub trait VideoStream: Send + Sync {
    /// Resolves once the intrinsic video size is known.
    async fn loaded_metadata(&self) -> Result<VideoDimensions>;
    fn play(&self);
    fn pause(&self);
    /// Position and size the video surface inside the container.
    fn set_overlay(&self, overlay: &OverlayBox);
    /// Stop every media track of the stream.
    fn stop_tracks(&self);
    /// Detach the video surface from the container.
    fn remove_surface(&self);
}

/// Construction parameters of a tracking engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineParams {
    pub input_width: u32,
    pub input_height: u32,
    pub max_track: usize,
    pub filter_min_cf: f64,
    pub filter_beta: f64,
    pub miss_tolerance: u32,
    pub warmup_tolerance: u32,
}

/// Events emitted by a running tracking engine, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A video frame went through the detector.
    FrameProcessed,
    /// New pose for a target; `None` when tracking of that target was lost.
    PoseUpdated {
        target_index: usize,
        world_matrix: Option<Mat4>,
    },
}

pub type EngineEventSender = mpsc::UnboundedSender<EngineEvent>;

/// Result of loading a target set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetSet {
    /// Geometry per target index.
    pub dimensions: Vec<TargetGeometry>,
}

pub trait TrackingEngineFactory: Send + Sync {
    /// Build an engine that reports through `events`.
    fn create(
        &self,
        params: EngineParams,
        events: EngineEventSender,
    ) -> Result<Arc<dyn TrackingEngine>>;
}

/// Image-target detector and pose estimator driven by the session.
#[async_trait]
pub trait TrackingEngine: Send + Sync {
    /// Load a compiled target set from `source`.
    async fn add_targets(&self, source: &str) -> Result<TargetSet>;
    /// One warm-up pass against a live frame before continuous processing.
    async fn dummy_run(&self, video: Arc<dyn VideoStream>) -> Result<()>;
    /// Start submitting frames of `video`; events flow until stopped.
    fn process_video(&self, video: Arc<dyn VideoStream>);
    /// Stop submitting new frames. A frame already in flight may still report.
    fn stop_process_video(&self);
    /// Raw 4×4 projection, column-major.
    fn projection_matrix(&self) -> [Real; 16];
    /// Target the engine should prioritize, `None` for no preference.
    fn set_interested_target(&self, target_index: Option<usize>);
}

/// The scene's perspective camera.
pub trait PerspectiveCamera: Send + Sync {
    /// Apply fov, aspect and clip planes, then refresh the projection matrix.
    fn apply_projection(&self, params: &ProjectionParams);
}

/// A renderable object following one target.
///
/// Called from the session's dispatcher; implementations must not call back
/// into the session.
pub trait Anchor: Send + Sync {
    /// Called once per session with the geometry of the bound target.
    fn setup_marker(&self, geometry: &TargetGeometry);
    /// Called on every pose update of the bound target.
    fn update_world_matrix(&self, world_matrix: Option<&Mat4>);
}

/// On-screen loading, scanning and error indicators.
pub trait StatusUi: Send + Sync {
    fn configure(&self, _settings: &UiSettings) {}
    fn show_loading(&self);
    fn hide_loading(&self);
    fn show_scanning(&self);
    fn hide_scanning(&self);
    fn show_compatibility_warning(&self);
}

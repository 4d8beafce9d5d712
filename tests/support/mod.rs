// In-memory collaborators recording every call the session makes.

#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use ar_session_engine::config::{CameraConstraints, UiSettings};
use ar_session_engine::geometry::{
    Mat4, OverlayBox, ProjectionParams, TargetGeometry, VideoDimensions,
};
use ar_session_engine::platform::{
    Anchor, EngineEvent, EngineEventSender, EngineParams, MediaDevices, PerspectiveCamera,
    StatusUi, TargetSet, TrackingEngine, TrackingEngineFactory, VideoStream, ViewportHandle,
};
use ar_session_engine::{ArSystem, Collaborators, SessionConfig};

pub const TARGET_SRC: &str = "targets.mind";

/// Column-major perspective projection with the given focal scales.
pub fn perspective(fx: f64, fy: f64, near: f64, far: f64) -> [f64; 16] {
    let a = -(far + near) / (far - near);
    let b = -2.0 * far * near / (far - near);
    [
        fx, 0.0, 0.0, 0.0, //
        0.0, fy, 0.0, 0.0, //
        0.0, 0.0, a, -1.0, //
        0.0, 0.0, b, 0.0,
    ]
}

pub fn pose(tx: f64) -> Mat4 {
    let mut m = Mat4::identity();
    m[(0, 3)] = tx;
    m
}

/// Let spawned dispatcher and reactor tasks drain their queues.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VideoCall {
    Play,
    Pause,
    Overlay(OverlayBox),
    StopTracks,
    RemoveSurface,
}

pub struct FakeVideo {
    size: VideoDimensions,
    metadata_fails: bool,
    pub calls: Mutex<Vec<VideoCall>>,
}

impl FakeVideo {
    pub fn count(&self, call: &VideoCall) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    pub fn last_overlay(&self) -> Option<OverlayBox> {
        self.calls.lock().iter().rev().find_map(|c| match c {
            VideoCall::Overlay(o) => Some(*o),
            _ => None,
        })
    }
}

#[async_trait]
impl VideoStream for FakeVideo {
    async fn loaded_metadata(&self) -> Result<VideoDimensions> {
        if self.metadata_fails {
            return Err(anyhow!("stream ended before metadata"));
        }
        Ok(self.size)
    }

    fn play(&self) {
        self.calls.lock().push(VideoCall::Play);
    }

    fn pause(&self) {
        self.calls.lock().push(VideoCall::Pause);
    }

    fn set_overlay(&self, overlay: &OverlayBox) {
        self.calls.lock().push(VideoCall::Overlay(*overlay));
    }

    fn stop_tracks(&self) {
        self.calls.lock().push(VideoCall::StopTracks);
    }

    fn remove_surface(&self) {
        self.calls.lock().push(VideoCall::RemoveSurface);
    }
}

pub struct FakeMedia {
    supported: bool,
    deny: bool,
    pub video: Arc<FakeVideo>,
    pub opened: Mutex<Vec<CameraConstraints>>,
}

#[async_trait]
impl MediaDevices for FakeMedia {
    fn supports_camera(&self) -> bool {
        self.supported
    }

    async fn open_camera(&self, constraints: CameraConstraints) -> Result<Arc<dyn VideoStream>> {
        self.opened.lock().push(constraints);
        if self.deny {
            return Err(anyhow!("NotAllowedError: permission denied"));
        }
        Ok(self.video.clone() as Arc<dyn VideoStream>)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    AddTargets(String),
    DummyRun,
    ProcessVideo,
    StopProcessVideo,
    Interested(Option<usize>),
}

pub struct FakeEngine {
    projection: [f64; 16],
    targets: Vec<TargetGeometry>,
    fail_targets: bool,
    targets_gate: Option<Arc<Notify>>,
    pub calls: Mutex<Vec<EngineCall>>,
}

impl FakeEngine {
    pub fn count(&self, call: &EngineCall) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }
}

#[async_trait]
impl TrackingEngine for FakeEngine {
    async fn add_targets(&self, source: &str) -> Result<TargetSet> {
        self.calls.lock().push(EngineCall::AddTargets(source.to_string()));
        if let Some(gate) = &self.targets_gate {
            gate.notified().await;
        }
        if self.fail_targets {
            return Err(anyhow!("404 fetching {}", source));
        }
        Ok(TargetSet {
            dimensions: self.targets.clone(),
        })
    }

    async fn dummy_run(&self, _video: Arc<dyn VideoStream>) -> Result<()> {
        self.calls.lock().push(EngineCall::DummyRun);
        Ok(())
    }

    fn process_video(&self, _video: Arc<dyn VideoStream>) {
        self.calls.lock().push(EngineCall::ProcessVideo);
    }

    fn stop_process_video(&self) {
        self.calls.lock().push(EngineCall::StopProcessVideo);
    }

    fn projection_matrix(&self) -> [f64; 16] {
        self.projection
    }

    fn set_interested_target(&self, target_index: Option<usize>) {
        self.calls.lock().push(EngineCall::Interested(target_index));
    }
}

pub struct FakeEngineFactory {
    /// Projection of the n-th engine built; the last one repeats.
    pub projections: Vec<[f64; 16]>,
    pub targets: Vec<TargetGeometry>,
    pub fail_targets: bool,
    pub targets_gate: Option<Arc<Notify>>,
    pub params: Mutex<Vec<EngineParams>>,
    pub engine: Mutex<Option<Arc<FakeEngine>>>,
    pub sender: Mutex<Option<EngineEventSender>>,
}

impl TrackingEngineFactory for FakeEngineFactory {
    fn create(
        &self,
        params: EngineParams,
        events: EngineEventSender,
    ) -> Result<Arc<dyn TrackingEngine>> {
        let built = {
            let mut all = self.params.lock();
            all.push(params);
            all.len() - 1
        };
        let projection = self.projections[built.min(self.projections.len() - 1)];
        let engine = Arc::new(FakeEngine {
            projection,
            targets: self.targets.clone(),
            fail_targets: self.fail_targets,
            targets_gate: self.targets_gate.clone(),
            calls: Mutex::new(Vec::new()),
        });
        *self.engine.lock() = Some(engine.clone());
        *self.sender.lock() = Some(events);
        Ok(engine as Arc<dyn TrackingEngine>)
    }
}

#[derive(Default)]
pub struct FakeCamera {
    pub applied: Mutex<Vec<ProjectionParams>>,
}

impl PerspectiveCamera for FakeCamera {
    fn apply_projection(&self, params: &ProjectionParams) {
        self.applied.lock().push(*params);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiCall {
    Configure(UiSettings),
    ShowLoading,
    HideLoading,
    ShowScanning,
    HideScanning,
    ShowCompatibility,
}

#[derive(Default)]
pub struct FakeUi {
    pub calls: Mutex<Vec<UiCall>>,
}

impl FakeUi {
    pub fn count(&self, call: &UiCall) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }
}

impl StatusUi for FakeUi {
    fn configure(&self, settings: &UiSettings) {
        self.calls.lock().push(UiCall::Configure(settings.clone()));
    }

    fn show_loading(&self) {
        self.calls.lock().push(UiCall::ShowLoading);
    }

    fn hide_loading(&self) {
        self.calls.lock().push(UiCall::HideLoading);
    }

    fn show_scanning(&self) {
        self.calls.lock().push(UiCall::ShowScanning);
    }

    fn hide_scanning(&self) {
        self.calls.lock().push(UiCall::HideScanning);
    }

    fn show_compatibility_warning(&self) {
        self.calls.lock().push(UiCall::ShowCompatibility);
    }
}

#[derive(Default)]
pub struct FakeAnchor {
    pub setups: Mutex<Vec<TargetGeometry>>,
    pub updates: Mutex<Vec<Option<Mat4>>>,
}

impl Anchor for FakeAnchor {
    fn setup_marker(&self, geometry: &TargetGeometry) {
        self.setups.lock().push(*geometry);
    }

    fn update_world_matrix(&self, world_matrix: Option<&Mat4>) {
        self.updates.lock().push(world_matrix.copied());
    }
}

/// Knobs for building a [`Harness`].
pub struct HarnessBuilder {
    pub camera_supported: bool,
    pub deny_camera: bool,
    pub metadata_fails: bool,
    pub fail_targets: bool,
    pub video: VideoDimensions,
    pub container: (f64, f64),
    pub projections: Vec<[f64; 16]>,
    pub targets: Vec<TargetGeometry>,
    /// When set, `add_targets` waits for a notification before answering.
    pub targets_gate: Option<Arc<Notify>>,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            camera_supported: true,
            deny_camera: false,
            metadata_fails: false,
            fail_targets: false,
            video: VideoDimensions::new(1280, 720),
            container: (800.0, 600.0),
            projections: vec![perspective(2.0, 2.0, 10.0, 100000.0)],
            targets: vec![
                TargetGeometry::new(1.0, 0.75),
                TargetGeometry::new(1.0, 1.5),
                TargetGeometry::new(1.0, 1.0),
            ],
            targets_gate: None,
        }
    }
}

impl HarnessBuilder {
    pub fn build(self) -> Harness {
        let video = Arc::new(FakeVideo {
            size: self.video,
            metadata_fails: self.metadata_fails,
            calls: Mutex::new(Vec::new()),
        });
        let media = Arc::new(FakeMedia {
            supported: self.camera_supported,
            deny: self.deny_camera,
            video: video.clone(),
            opened: Mutex::new(Vec::new()),
        });
        let engines = Arc::new(FakeEngineFactory {
            projections: self.projections,
            targets: self.targets,
            fail_targets: self.fail_targets,
            targets_gate: self.targets_gate,
            params: Mutex::new(Vec::new()),
            engine: Mutex::new(None),
            sender: Mutex::new(None),
        });
        let camera = Arc::new(FakeCamera::default());
        let ui = Arc::new(FakeUi::default());
        let viewport = ViewportHandle::new(self.container.0, self.container.1);

        let system = ArSystem::new(Collaborators {
            media: media.clone(),
            engines: engines.clone(),
            camera: camera.clone(),
            ui: ui.clone(),
            viewport: viewport.clone(),
        });

        Harness {
            system,
            media,
            video,
            engines,
            camera,
            ui,
            viewport,
        }
    }
}

pub struct Harness {
    pub system: ArSystem,
    pub media: Arc<FakeMedia>,
    pub video: Arc<FakeVideo>,
    pub engines: Arc<FakeEngineFactory>,
    pub camera: Arc<FakeCamera>,
    pub ui: Arc<FakeUi>,
    pub viewport: ViewportHandle,
}

impl Harness {
    pub fn new() -> Self {
        HarnessBuilder::default().build()
    }

    /// A harness whose system has been set up with a default config.
    pub fn configured() -> Self {
        let harness = Self::new();
        harness.system.setup(SessionConfig::new(TARGET_SRC));
        harness
    }

    pub fn engine(&self) -> Arc<FakeEngine> {
        self.engines
            .engine
            .lock()
            .clone()
            .expect("tracking engine was never created")
    }

    /// Emit an event as the engine's worker would.
    pub fn emit(&self, event: EngineEvent) {
        if let Some(tx) = self.engines.sender.lock().as_ref() {
            // The dispatcher may already be gone after stop.
            let _ = tx.send(event);
        }
    }

    pub fn emit_pose(&self, target_index: usize, world_matrix: Option<Mat4>) {
        self.emit(EngineEvent::PoseUpdated {
            target_index,
            world_matrix,
        });
    }

    pub fn anchor(&self, target_index: usize) -> Arc<FakeAnchor> {
        let anchor = Arc::new(FakeAnchor::default());
        self.system.register_anchor(anchor.clone(), target_index);
        anchor
    }
}

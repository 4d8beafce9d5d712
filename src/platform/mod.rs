// Collaborator seams: media devices, tracking engine, scene camera, anchors,
// status UI and the viewport the session renders into.

pub mod traits;
pub mod viewport;

pub use traits::{
    Anchor, EngineEvent, EngineEventSender, EngineParams, MediaDevices, PerspectiveCamera,
    StatusUi, TargetSet, TrackingEngine, TrackingEngineFactory, VideoStream,
};
pub use viewport::ViewportHandle;

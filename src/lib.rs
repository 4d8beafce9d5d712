//! Session orchestration for camera-driven image-tracking AR.
//!
//! [`ArSystem`] acquires the camera, boots a tracking engine against it,
//! routes tracked poses to registered anchors and keeps the scene camera's
//! projection in step with the video and the viewport. Every platform object
//! it drives is reached through the traits in [`platform`].

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod platform;

pub use config::{SessionConfig, UiIndicator, UiSettings};
pub use engine::events::{ErrorCode, LifecycleEvent};
pub use engine::session::{Collaborators, SessionState};
pub use engine::system::ArSystem;
pub use error::SessionError;

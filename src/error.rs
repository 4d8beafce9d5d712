use thiserror::Error;

use crate::engine::session::SessionState;
use crate::geometry::GeometryError;

/// Failures surfaced by the session lifecycle API.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session started before setup() supplied a configuration")]
    NotConfigured,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("camera capture is not supported on this platform")]
    VideoUnsupported,
    #[error("video acquisition failed: {0}")]
    VideoAcquisition(#[source] anyhow::Error),
    #[error("failed to load targets from {source_url}: {error}")]
    TargetLoad {
        source_url: String,
        #[source]
        error: anyhow::Error,
    },
    #[error("tracking engine failure: {0}")]
    Engine(#[source] anyhow::Error),
    #[error("{op} is not allowed while the session is {state:?}")]
    InvalidState { op: &'static str, state: SessionState },
    #[error("session stopped before it was ready")]
    Stopped,
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

impl SessionError {
    /// Configuration problems abort `start` before any resource is touched.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SessionError::NotConfigured | SessionError::InvalidConfig(_)
        )
    }

    /// Camera problems the host is expected to answer with a compatibility notice.
    pub fn is_video_acquisition(&self) -> bool {
        matches!(
            self,
            SessionError::VideoUnsupported | SessionError::VideoAcquisition(_)
        )
    }
}

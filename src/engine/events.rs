use serde::Serialize;

/// Error codes carried by [`LifecycleEvent::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Camera capture unsupported, denied or failed.
    VideoFail,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::VideoFail => "VIDEO_FAIL",
        }
    }
}

/// Events the session announces to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum LifecycleEvent {
    /// Engine initialized and frame processing started.
    #[serde(rename = "arReady")]
    Ready,
    #[serde(rename = "arError")]
    Error { error: ErrorCode },
}

impl LifecycleEvent {
    /// Host-side event name.
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::Ready => "arReady",
            LifecycleEvent::Error { .. } => "arError",
        }
    }
}

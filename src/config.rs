use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Default number of targets the engine may track at the same time.
pub const DEFAULT_MAX_TRACK: usize = 1;

/// Frames a tracked target may go undetected before it is reported lost.
pub const DEFAULT_MISS_TOLERANCE: u32 = 5;

/// Frames a target must be detected before it is reported found.
pub const DEFAULT_WARMUP_TOLERANCE: u32 = 5;

/// One-euro filter minimum cutoff frequency.
pub const DEFAULT_FILTER_MIN_CF: f64 = 0.001;

/// One-euro filter speed coefficient.
pub const DEFAULT_FILTER_BETA: f64 = 1000.0;

/// Camera facing requested from the media devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera.
    Environment,
    /// Front camera.
    User,
}

/// Constraints passed to the media devices when opening the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraConstraints {
    pub audio: bool,
    pub facing: FacingMode,
}

/// Video only, rear camera preferred.
pub const CAMERA_CONSTRAINTS: CameraConstraints = CameraConstraints {
    audio: false,
    facing: FacingMode::Environment,
};

/// How one status indicator should be presented.
///
/// Parsed from the host string: `"yes"` selects the built-in indicator,
/// `"no"` suppresses it, anything else names a custom host element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UiIndicator {
    #[default]
    Default,
    Hidden,
    Custom(String),
}

impl UiIndicator {
    pub fn is_hidden(&self) -> bool {
        matches!(self, UiIndicator::Hidden)
    }
}

impl From<String> for UiIndicator {
    fn from(value: String) -> Self {
        match value.trim() {
            "" | "yes" => UiIndicator::Default,
            "no" => UiIndicator::Hidden,
            other => UiIndicator::Custom(other.to_string()),
        }
    }
}

impl From<&str> for UiIndicator {
    fn from(value: &str) -> Self {
        UiIndicator::from(value.to_string())
    }
}

impl From<UiIndicator> for String {
    fn from(value: UiIndicator) -> Self {
        value.to_string()
    }
}

impl fmt::Display for UiIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiIndicator::Default => f.write_str("yes"),
            UiIndicator::Hidden => f.write_str("no"),
            UiIndicator::Custom(selector) => f.write_str(selector),
        }
    }
}

/// Indicator settings handed to the status UI at setup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiSettings {
    pub loading: UiIndicator,
    pub scanning: UiIndicator,
    pub error: UiIndicator,
}

/// Everything `setup` supplies to a session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Location of the compiled target set, interpreted by the tracking engine.
    #[serde(alias = "imageTargetSrc")]
    pub image_target_src: String,
    /// Maximum number of targets tracked simultaneously.
    #[serde(alias = "maxTrack")]
    pub max_track: usize,
    /// Collect frame statistics for an on-screen counter.
    #[serde(alias = "showStats", alias = "statsDisplay")]
    pub show_stats: bool,
    #[serde(alias = "uiLoading")]
    pub ui_loading: UiIndicator,
    #[serde(alias = "uiScanning")]
    pub ui_scanning: UiIndicator,
    #[serde(alias = "uiError")]
    pub ui_error: UiIndicator,
    #[serde(alias = "missTolerance")]
    pub miss_tolerance: u32,
    #[serde(alias = "warmupTolerance")]
    pub warmup_tolerance: u32,
    #[serde(alias = "filterMinCF")]
    pub filter_min_cf: f64,
    #[serde(alias = "filterBeta")]
    pub filter_beta: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            image_target_src: String::new(),
            max_track: DEFAULT_MAX_TRACK,
            show_stats: false,
            ui_loading: UiIndicator::Default,
            ui_scanning: UiIndicator::Default,
            ui_error: UiIndicator::Default,
            miss_tolerance: DEFAULT_MISS_TOLERANCE,
            warmup_tolerance: DEFAULT_WARMUP_TOLERANCE,
            filter_min_cf: DEFAULT_FILTER_MIN_CF,
            filter_beta: DEFAULT_FILTER_BETA,
        }
    }
}

impl SessionConfig {
    /// Config for the given target source with every other field defaulted.
    pub fn new(image_target_src: impl Into<String>) -> Self {
        Self {
            image_target_src: image_target_src.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON document; missing keys take their defaults. Keys may be
    /// snake_case or the host's camelCase attribute names.
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        serde_json::from_str(json).map_err(|e| SessionError::InvalidConfig(e.to_string()))
    }

    pub fn ui_settings(&self) -> UiSettings {
        UiSettings {
            loading: self.ui_loading.clone(),
            scanning: self.ui_scanning.clone(),
            error: self.ui_error.clone(),
        }
    }

    /// Reject configurations that cannot start a session.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.image_target_src.trim().is_empty() {
            return Err(SessionError::InvalidConfig(
                "image_target_src is empty".to_string(),
            ));
        }
        if self.max_track == 0 {
            return Err(SessionError::InvalidConfig(
                "max_track must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("filter_min_cf", self.filter_min_cf),
            ("filter_beta", self.filter_beta),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SessionError::InvalidConfig(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

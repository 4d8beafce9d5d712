// Viewport geometry: fitting the camera video into its container and deriving
// the scene camera's projection from the tracking engine's intrinsics.

use nalgebra::Matrix4;
use thiserror::Error;

pub mod viewport;

pub use viewport::{resolve_viewport, OverlayBox, ProjectionParams};

/// Scalar type for all geometry.
pub type Real = f64;

/// 4×4 matrix used for raw projections and world transforms.
pub type Mat4 = Matrix4<Real>;

/// Build a [`Mat4`] from 16 column-major values as reported by the engine.
pub fn mat4_from_column_major(values: &[Real; 16]) -> Mat4 {
    Mat4::from_column_slice(values)
}

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("{what} dimensions must be positive and finite, got {width}x{height}")]
    InvalidDimensions {
        what: &'static str,
        width: Real,
        height: Real,
    },
    #[error("projection matrix is degenerate: {0}")]
    DegenerateProjection(&'static str),
}

/// Intrinsic size of the camera video in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoDimensions {
    pub width: u32,
    pub height: u32,
}

impl VideoDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn ratio(&self) -> Real {
        self.width as Real / self.height as Real
    }
}

/// Client size of the element hosting the video and the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerSize {
    pub width: Real,
    pub height: Real,
}

impl ContainerSize {
    pub fn new(width: Real, height: Real) -> Self {
        Self { width, height }
    }

    pub fn ratio(&self) -> Real {
        self.width / self.height
    }
}

/// Target geometry reported by the engine once a target set is loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetGeometry {
    /// Target image width in target units.
    pub width: Real,
    /// Target image height in target units.
    pub height: Real,
}

impl TargetGeometry {
    pub fn new(width: Real, height: Real) -> Self {
        Self { width, height }
    }
}

use tracing::debug;

use super::{ContainerSize, GeometryError, Mat4, Real, VideoDimensions};

/// CSS box placing the video so its visible part is centered in the container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayBox {
    pub left: Real,
    pub top: Real,
    pub width: Real,
    pub height: Real,
}

impl OverlayBox {
    /// Inline style for an absolutely positioned video element.
    pub fn to_css(&self) -> String {
        format!(
            "top:{}px;left:{}px;width:{}px;height:{}px",
            self.top, self.left, self.width, self.height
        )
    }
}

/// Perspective camera parameters plus the video overlay placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionParams {
    /// Vertical field of view in degrees.
    pub fov: Real,
    pub aspect: Real,
    pub near: Real,
    pub far: Real,
    /// (r - l) / (t - b) of the raw projection. Informational only.
    pub ratio: Real,
    pub overlay: OverlayBox,
}

fn check_dimensions(what: &'static str, width: Real, height: Real) -> Result<(), GeometryError> {
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Ok(())
    } else {
        Err(GeometryError::InvalidDimensions {
            what,
            width,
            height,
        })
    }
}

/// Fit the video into the container and derive the camera projection.
///
/// The video is scaled to cover the container: the axis that fits is pinned to
/// the container, the other overflows and is centered. The vertical field of
/// view is widened or narrowed by the overflow so tracked content keeps its
/// proportions on screen. `proj` is the engine's raw projection.
pub fn resolve_viewport(
    video: VideoDimensions,
    container: ContainerSize,
    proj: &Mat4,
) -> Result<ProjectionParams, GeometryError> {
    check_dimensions("video", video.width as Real, video.height as Real)?;
    check_dimensions("container", container.width, container.height)?;

    let video_ratio = video.ratio();
    let container_ratio = container.ratio();

    let (vw, vh) = if video_ratio > container_ratio {
        let vh = container.height;
        (vh * video_ratio, vh)
    } else {
        let vw = container.width;
        (vw, vw / video_ratio)
    };

    let sx = proj[(0, 0)];
    let sy = proj[(1, 1)];
    let depth = proj[(2, 2)];
    let offset = proj[(2, 3)];
    if sy == 0.0 || sx == 0.0 {
        return Err(GeometryError::DegenerateProjection("zero focal scale"));
    }
    if depth == 1.0 || depth == -1.0 {
        return Err(GeometryError::DegenerateProjection("infinite clip plane"));
    }

    let fov = 2.0 * (1.0 / sy / vh * container.height).atan() * 180.0 / std::f64::consts::PI;
    let near = offset / (depth - 1.0);
    let far = offset / (depth + 1.0);
    let ratio = sy / sx;

    let params = ProjectionParams {
        fov,
        aspect: container_ratio,
        near,
        far,
        ratio,
        overlay: OverlayBox {
            left: (container.width - vw) / 2.0,
            top: (container.height - vh) / 2.0,
            width: vw,
            height: vh,
        },
    };

    debug!(
        "resolved viewport video={}x{} container={}x{} fov={:.3} near={:.3} far={:.3} ratio={:.3}",
        video.width, video.height, container.width, container.height, fov, near, far, ratio
    );

    Ok(params)
}

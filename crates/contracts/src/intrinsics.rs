//! Camera intrinsics

use std::fmt;
use std::sync::Arc;

/// Intrinsic projection model attached to frames by the source.
///
/// Image points are in pixels, unit-plane points are in normalized camera
/// coordinates (z = 1).
pub trait CameraProjection: Send + Sync {
    /// Unproject a pixel onto the camera's unit plane
    fn map_image_point_to_camera_unit_plane(&self, uv: [f32; 2]) -> Option<[f32; 2]>;

    /// Project a unit-plane point back into the image
    fn map_camera_space_to_image_point(&self, xy: [f32; 2]) -> Option<[f32; 2]>;
}

/// Distortion-free pinhole model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeProjection {
    pub focal_length: [f32; 2],
    pub principal_point: [f32; 2],
}

impl CameraProjection for PinholeProjection {
    fn map_image_point_to_camera_unit_plane(&self, uv: [f32; 2]) -> Option<[f32; 2]> {
        let [fx, fy] = self.focal_length;
        if fx == 0.0 || fy == 0.0 {
            return None;
        }
        Some([
            (uv[0] - self.principal_point[0]) / fx,
            (uv[1] - self.principal_point[1]) / fy,
        ])
    }

    fn map_camera_space_to_image_point(&self, xy: [f32; 2]) -> Option<[f32; 2]> {
        Some([
            xy[0] * self.focal_length[0] + self.principal_point[0],
            xy[1] * self.focal_length[1] + self.principal_point[1],
        ])
    }
}

/// Intrinsics handle plus the effective (unpacked) image size it applies to
#[derive(Clone)]
pub struct CameraIntrinsics {
    projection: Arc<dyn CameraProjection>,
    image_width: u32,
    image_height: u32,
}

impl CameraIntrinsics {
    pub fn new(projection: Arc<dyn CameraProjection>, image_width: u32, image_height: u32) -> Self {
        Self {
            projection,
            image_width,
            image_height,
        }
    }

    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn projection(&self) -> &Arc<dyn CameraProjection> {
        &self.projection
    }

    pub fn map_image_point_to_camera_unit_plane(&self, uv: [f32; 2]) -> Option<[f32; 2]> {
        self.projection.map_image_point_to_camera_unit_plane(uv)
    }

    pub fn map_camera_space_to_image_point(&self, xy: [f32; 2]) -> Option<[f32; 2]> {
        self.projection.map_camera_space_to_image_point(xy)
    }
}

impl fmt::Debug for CameraIntrinsics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraIntrinsics")
            .field("image_width", &self.image_width)
            .field("image_height", &self.image_height)
            .finish_non_exhaustive()
    }
}

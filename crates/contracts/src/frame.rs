//! SensorFrame - ingestion output
//!
//! Normalized, immutable record produced once per accepted frame and shared
//! (`Arc<SensorFrame>`) between the sink and the latest-frame cache.

use crate::{CameraIntrinsics, Float4x4, SensorType, SoftwareBitmap, UniversalTime};

/// Sensor frame
///
/// Fields are private and only set through [`SensorFrameBuilder`], so a frame is
/// complete before anyone can hold a reference to it.
#[derive(Debug, Clone)]
pub struct SensorFrame {
    sensor_type: SensorType,
    timestamp: UniversalTime,
    image: SoftwareBitmap,
    frame_to_origin: Option<Float4x4>,
    camera_view_transform: Option<Float4x4>,
    camera_intrinsics: Option<CameraIntrinsics>,
}

impl SensorFrame {
    pub fn builder(
        sensor_type: SensorType,
        timestamp: UniversalTime,
        image: SoftwareBitmap,
    ) -> SensorFrameBuilder {
        SensorFrameBuilder {
            frame: SensorFrame {
                sensor_type,
                timestamp,
                image,
                frame_to_origin: None,
                camera_view_transform: None,
                camera_intrinsics: None,
            },
        }
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    /// Absolute time of exposure
    pub fn timestamp(&self) -> UniversalTime {
        self.timestamp
    }

    pub fn image(&self) -> &SoftwareBitmap {
        &self.image
    }

    /// Frame-to-origin transform, or [`Float4x4::ZERO`] when no pose was available
    pub fn frame_to_origin(&self) -> Float4x4 {
        self.frame_to_origin.unwrap_or(Float4x4::ZERO)
    }

    pub fn has_frame_to_origin(&self) -> bool {
        self.frame_to_origin.is_some()
    }

    /// Camera view transform, or [`Float4x4::ZERO`] when the source did not attach one
    pub fn camera_view_transform(&self) -> Float4x4 {
        self.camera_view_transform.unwrap_or(Float4x4::ZERO)
    }

    pub fn has_camera_view_transform(&self) -> bool {
        self.camera_view_transform.is_some()
    }

    pub fn camera_intrinsics(&self) -> Option<&CameraIntrinsics> {
        self.camera_intrinsics.as_ref()
    }
}

/// Builder for [`SensorFrame`]
#[derive(Debug)]
pub struct SensorFrameBuilder {
    frame: SensorFrame,
}

impl SensorFrameBuilder {
    pub fn frame_to_origin(mut self, transform: Option<Float4x4>) -> Self {
        self.frame.frame_to_origin = transform;
        self
    }

    pub fn camera_view_transform(mut self, transform: Option<Float4x4>) -> Self {
        self.frame.camera_view_transform = transform;
        self
    }

    pub fn camera_intrinsics(mut self, intrinsics: Option<CameraIntrinsics>) -> Self {
        self.frame.camera_intrinsics = intrinsics;
        self
    }

    pub fn build(self) -> SensorFrame {
        self.frame
    }
}

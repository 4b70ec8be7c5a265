//! Sample metadata lookup
//!
//! The three property keys ingestion understands, and how each is extracted
//! from a frame's property bag.

use std::fmt;
use std::sync::Arc;

use contracts::{
    CameraProjection, Float4x4, FrameProperties, PropertyValue, SpatialCoordinateSystem,
};
use tracing::debug;
use uuid::Uuid;

/// Coordinate system the camera was in at exposure time
pub const CAMERA_COORDINATE_SYSTEM: Uuid = Uuid::from_fields(
    0x9d13c82f,
    0x2199,
    0x4e67,
    &[0x91, 0xcd, 0xd1, 0xa4, 0x18, 0x1f, 0x25, 0x34],
);

/// Camera view transform blob; the first 64 bytes hold a row-major `Float4x4`
pub const CAMERA_VIEW_TRANSFORM: Uuid = Uuid::from_fields(
    0x4e251fa4,
    0x830f,
    0x4770,
    &[0x85, 0x9a, 0x4b, 0x8d, 0x99, 0xaa, 0x80, 0x9b],
);

/// Intrinsics handle attached by the sensor streaming transform
pub const SENSOR_STREAMING_CAMERA_INTRINSICS: Uuid = Uuid::from_fields(
    0x8a2e4f6c,
    0x3b1d,
    0x4c75,
    &[0x9e, 0x60, 0x2f, 0x7a, 0xd4, 0x13, 0x5b, 0xc8],
);

/// Recognized metadata keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameMetadataKey {
    CameraCoordinateSystem,
    CameraViewTransform,
    CameraIntrinsics,
}

impl FrameMetadataKey {
    pub const ALL: [FrameMetadataKey; 3] = [
        FrameMetadataKey::CameraCoordinateSystem,
        FrameMetadataKey::CameraViewTransform,
        FrameMetadataKey::CameraIntrinsics,
    ];

    pub const fn guid(self) -> Uuid {
        match self {
            FrameMetadataKey::CameraCoordinateSystem => CAMERA_COORDINATE_SYSTEM,
            FrameMetadataKey::CameraViewTransform => CAMERA_VIEW_TRANSFORM,
            FrameMetadataKey::CameraIntrinsics => SENSOR_STREAMING_CAMERA_INTRINSICS,
        }
    }

    fn extractor(self) -> Extractor {
        match self {
            FrameMetadataKey::CameraCoordinateSystem => extract_coordinate_system,
            FrameMetadataKey::CameraViewTransform => extract_camera_view_transform,
            FrameMetadataKey::CameraIntrinsics => extract_camera_intrinsics,
        }
    }
}

/// Stores the typed value into `FrameMetadata`; returns `false` when the
/// property holds a value of the wrong shape
type Extractor = fn(&mut FrameMetadata, &PropertyValue) -> bool;

fn extract_coordinate_system(metadata: &mut FrameMetadata, value: &PropertyValue) -> bool {
    match value {
        PropertyValue::CoordinateSystem(cs) => {
            metadata.coordinate_system = Some(cs.clone());
            true
        }
        _ => false,
    }
}

fn extract_camera_view_transform(metadata: &mut FrameMetadata, value: &PropertyValue) -> bool {
    match value {
        PropertyValue::Bytes(bytes) => {
            metadata.camera_view_transform = bytes
                .get(..Float4x4::SIZE)
                .and_then(Float4x4::from_ne_bytes);
            metadata.camera_view_transform.is_some()
        }
        _ => false,
    }
}

fn extract_camera_intrinsics(metadata: &mut FrameMetadata, value: &PropertyValue) -> bool {
    match value {
        PropertyValue::CameraIntrinsics(projection) => {
            metadata.camera_intrinsics = Some(projection.clone());
            true
        }
        _ => false,
    }
}

/// Recognized metadata of one frame
#[derive(Clone, Default)]
pub struct FrameMetadata {
    coordinate_system: Option<Arc<dyn SpatialCoordinateSystem>>,
    camera_view_transform: Option<Float4x4>,
    camera_intrinsics: Option<Arc<dyn CameraProjection>>,
}

impl FrameMetadata {
    /// Pull every recognized key out of the property bag. Unknown keys are
    /// ignored; recognized keys with malformed values are treated as absent.
    pub fn extract(properties: &FrameProperties) -> Self {
        let mut metadata = FrameMetadata::default();

        for key in FrameMetadataKey::ALL {
            let Some(value) = properties.lookup(&key.guid()) else {
                continue;
            };
            if !(key.extractor())(&mut metadata, value) {
                debug!(key = ?key, value = ?value, "ignoring malformed frame metadata");
            }
        }

        metadata
    }

    pub fn coordinate_system(&self) -> Option<&Arc<dyn SpatialCoordinateSystem>> {
        self.coordinate_system.as_ref()
    }

    /// Transform from the frame's coordinate system into `origin`, when both the
    /// coordinate system is attached and the perception subsystem can relate them
    pub fn frame_to_origin(&self, origin: &dyn SpatialCoordinateSystem) -> Option<Float4x4> {
        self.coordinate_system
            .as_ref()
            .and_then(|cs| cs.try_get_transform_to(origin))
    }

    pub fn camera_view_transform(&self) -> Option<Float4x4> {
        self.camera_view_transform
    }

    pub fn camera_intrinsics(&self) -> Option<&Arc<dyn CameraProjection>> {
        self.camera_intrinsics.as_ref()
    }
}

impl fmt::Debug for FrameMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameMetadata")
            .field(
                "coordinate_system",
                &self.coordinate_system.as_ref().map(|cs| cs.id()),
            )
            .field("camera_view_transform", &self.camera_view_transform)
            .field("camera_intrinsics", &self.camera_intrinsics.is_some())
            .finish()
    }
}

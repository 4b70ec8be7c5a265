//! SensorType - logical camera identifiers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical camera/sensor a frame reader context is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    /// Color photo/video camera
    PhotoVideo,
    ShortThrowToFDepth,
    ShortThrowToFReflectivity,
    LongThrowToFDepth,
    LongThrowToFReflectivity,
    /// Grayscale tracking cameras
    VisibleLightLeftLeft,
    VisibleLightLeftFront,
    VisibleLightRightFront,
    VisibleLightRightRight,
}

impl SensorType {
    /// All sensor types, in declaration order
    pub const ALL: [SensorType; 9] = [
        SensorType::PhotoVideo,
        SensorType::ShortThrowToFDepth,
        SensorType::ShortThrowToFReflectivity,
        SensorType::LongThrowToFDepth,
        SensorType::LongThrowToFReflectivity,
        SensorType::VisibleLightLeftLeft,
        SensorType::VisibleLightLeftFront,
        SensorType::VisibleLightRightFront,
        SensorType::VisibleLightRightRight,
    ];

    /// Stable snake_case name, used for logs, metric labels and file names
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::PhotoVideo => "photo_video",
            SensorType::ShortThrowToFDepth => "short_throw_to_f_depth",
            SensorType::ShortThrowToFReflectivity => "short_throw_to_f_reflectivity",
            SensorType::LongThrowToFDepth => "long_throw_to_f_depth",
            SensorType::LongThrowToFReflectivity => "long_throw_to_f_reflectivity",
            SensorType::VisibleLightLeftLeft => "visible_light_left_left",
            SensorType::VisibleLightLeftFront => "visible_light_left_front",
            SensorType::VisibleLightRightFront => "visible_light_right_front",
            SensorType::VisibleLightRightRight => "visible_light_right_right",
        }
    }

    /// Whether this is one of the grayscale tracking cameras
    pub fn is_visible_light(&self) -> bool {
        matches!(
            self,
            SensorType::VisibleLightLeftLeft
                | SensorType::VisibleLightLeftFront
                | SensorType::VisibleLightRightFront
                | SensorType::VisibleLightRightRight
        )
    }

    /// Tracking cameras pack four pixels per reported column, so the bitmap
    /// width they report is a quarter of the real image width.
    pub fn reports_packed_width(&self) -> bool {
        self.is_visible_light()
    }

    /// Multiplier from reported bitmap width to effective image width
    pub fn width_unpack_factor(&self) -> u32 {
        if self.reports_packed_width() {
            4
        } else {
            1
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

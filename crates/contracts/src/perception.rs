//! Spatial perception collaborators
//!
//! The tracking subsystem itself lives outside this workspace. Frame ingestion only
//! needs to (1) turn an absolute time into a perception timestamp and (2) express
//! a frame's coordinate system relative to the shared origin.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::{ContractError, Float4x4, UniversalTime};

/// A coordinate system known to the perception subsystem
pub trait SpatialCoordinateSystem: Send + Sync {
    /// Stable identity of the coordinate system
    fn id(&self) -> Uuid;

    /// Transform taking points in `self` to points in `target`, if the
    /// relationship between the two is currently known
    fn try_get_transform_to(&self, target: &dyn SpatialCoordinateSystem) -> Option<Float4x4>;
}

/// Supplies the origin reference frame all transforms are resolved into
pub trait OriginFrameProvider: Send + Sync {
    fn origin_coordinate_system(&self) -> Arc<dyn SpatialCoordinateSystem>;
}

/// Opaque token used to query spatial pose at a historical moment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerceptionTimestamp {
    target_time: UniversalTime,
    prediction_amount: Duration,
}

impl PerceptionTimestamp {
    pub fn new(target_time: UniversalTime, prediction_amount: Duration) -> Self {
        Self {
            target_time,
            prediction_amount,
        }
    }

    pub fn target_time(&self) -> UniversalTime {
        self.target_time
    }

    pub fn prediction_amount(&self) -> Duration {
        self.prediction_amount
    }
}

/// Resolves absolute times into perception timestamps
pub trait PerceptionTimestampResolver: Send + Sync {
    /// # Errors
    /// Returns [`ContractError::PerceptionTimestamp`] when the target time is
    /// outside the pose history the perception subsystem retains.
    fn from_historical_target_time(
        &self,
        target_time: UniversalTime,
    ) -> Result<PerceptionTimestamp, ContractError>;
}

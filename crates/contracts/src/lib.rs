//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Frame sources report exposure time as device-relative ticks (`HundredsOfNanoseconds`)
//! - Every `SensorFrame` carries absolute `UniversalTime` (100 ns ticks since 1601-01-01 UTC)
//!
//! ## Transform Model
//! - `Float4x4` is row-major; the all-zero matrix means "no transform available"
//! - `SensorFrame` additionally exposes explicit `has_*` flags for each transform

mod bitmap;
mod config;
mod error;
mod frame;
mod frame_source;
mod intrinsics;
mod math;
mod media_frame;
mod perception;
mod sensor_type;
mod sink;
mod time;

pub use bitmap::*;
pub use config::*;
pub use error::*;
pub use frame::*;
pub use frame_source::{FrameArrivedCallback, FrameSource};
pub use intrinsics::*;
pub use math::Float4x4;
pub use media_frame::*;
pub use perception::*;
pub use sensor_type::SensorType;
pub use sink::*;
pub use time::*;

//! Time model
//!
//! Two tick domains, both in 100 ns units:
//! - `HundredsOfNanoseconds`: device-relative (e.g. since system boot), as reported by the frame source
//! - `UniversalTime`: absolute, counted from 1601-01-01 UTC, as accepted by the perception APIs

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Ticks per second in both domains
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks between 1601-01-01 and 1970-01-01
pub const UNIX_EPOCH_TICKS: i64 = 116_444_736_000_000_000;

/// Device-relative tick count
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct HundredsOfNanoseconds(pub i64);

impl HundredsOfNanoseconds {
    #[inline]
    pub fn count(&self) -> i64 {
        self.0
    }

    /// Saturates at `i64::MAX` ticks
    pub fn from_duration(duration: Duration) -> Self {
        let ticks = duration.as_nanos() / 100;
        Self(i64::try_from(ticks).unwrap_or(i64::MAX))
    }
}

impl From<Duration> for HundredsOfNanoseconds {
    fn from(duration: Duration) -> Self {
        Self::from_duration(duration)
    }
}

/// Absolute tick count since 1601-01-01 UTC
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct UniversalTime(pub i64);

impl UniversalTime {
    /// Current wall-clock time
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(since) => Self(UNIX_EPOCH_TICKS.saturating_add(
                HundredsOfNanoseconds::from_duration(since).count(),
            )),
            Err(before) => Self(UNIX_EPOCH_TICKS.saturating_sub(
                HundredsOfNanoseconds::from_duration(before.duration()).count(),
            )),
        }
    }

    /// `None` when the tick count falls outside what `SystemTime` can express
    pub fn to_system_time(&self) -> Option<SystemTime> {
        let since_unix = self.0.checked_sub(UNIX_EPOCH_TICKS)?;
        let magnitude = since_unix.unsigned_abs();
        let ticks_per_second = TICKS_PER_SECOND as u64;
        let offset = Duration::new(
            magnitude / ticks_per_second,
            ((magnitude % ticks_per_second) * 100) as u32,
        );
        if since_unix >= 0 {
            UNIX_EPOCH.checked_add(offset)
        } else {
            UNIX_EPOCH.checked_sub(offset)
        }
    }

    #[inline]
    pub fn ticks(&self) -> i64 {
        self.0
    }
}

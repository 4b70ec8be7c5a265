//! Relative → absolute time conversion

use contracts::{HundredsOfNanoseconds, UniversalTime};

/// Converts device-relative ticks into absolute universal ticks.
///
/// The offset between the two domains is fixed when the converter is created,
/// so every conversion for the lifetime of the owning context is consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeConverter {
    offset: HundredsOfNanoseconds,
}

impl TimeConverter {
    /// Converter with an explicit offset (absolute = relative + offset)
    pub fn with_offset(offset: HundredsOfNanoseconds) -> Self {
        Self { offset }
    }

    /// Derive the offset from a pair of readings taken at the same instant
    pub fn from_reference(relative_now: HundredsOfNanoseconds, absolute_now: UniversalTime) -> Self {
        Self::with_offset(HundredsOfNanoseconds(
            absolute_now.ticks().saturating_sub(relative_now.count()),
        ))
    }

    /// Pair the source's current relative time with the wall clock
    pub fn attach(relative_now: HundredsOfNanoseconds) -> Self {
        Self::from_reference(relative_now, UniversalTime::now())
    }

    pub fn offset(&self) -> HundredsOfNanoseconds {
        self.offset
    }

    #[inline]
    pub fn relative_ticks_to_absolute_ticks(&self, relative: HundredsOfNanoseconds) -> UniversalTime {
        UniversalTime(relative.count().saturating_add(self.offset.count()))
    }
}

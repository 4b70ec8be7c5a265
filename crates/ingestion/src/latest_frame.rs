//! Single-slot latest frame cache

use std::sync::Arc;

use contracts::SensorFrame;
use parking_lot::Mutex;

/// Holds the most recent [`SensorFrame`] of one context.
///
/// The lock only covers the load/store of the `Arc`; the frame replaced by
/// `set` is released after the lock is dropped.
#[derive(Debug, Default)]
pub struct LatestFrameCache {
    slot: Mutex<Option<Arc<SensorFrame>>>,
}

impl LatestFrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored frame
    pub fn set(&self, frame: Arc<SensorFrame>) {
        let _previous = {
            let mut slot = self.slot.lock();
            slot.replace(frame)
        };
    }

    /// Most recent frame, or `None` before the first successful arrival
    pub fn get(&self) -> Option<Arc<SensorFrame>> {
        self.slot.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::{BitmapPixelFormat, Float4x4, SensorType, SoftwareBitmap, UniversalTime};
    use rand::Rng;
    use std::thread;

    /// Every field derives from `seq`, so a torn read would be visible as a mismatch
    fn frame(seq: u32, pixels: usize) -> Arc<SensorFrame> {
        let value = (seq % 251) as u8;
        let image = SoftwareBitmap::new(
            BitmapPixelFormat::Gray8,
            pixels as u32,
            1,
            Bytes::from(vec![value; pixels]),
        );
        let f = seq as f32;
        Arc::new(
            SensorFrame::builder(SensorType::PhotoVideo, UniversalTime(seq as i64), image)
                .frame_to_origin(Some(Float4x4::translation(f, f, f)))
                .camera_view_transform(Some(Float4x4::translation(-f, -f, -f)))
                .build(),
        )
    }

    fn assert_consistent(frame: &SensorFrame) {
        let seq = frame.timestamp().ticks() as u32;
        let f = seq as f32;
        let value = (seq % 251) as u8;
        assert!(frame.image().data().iter().all(|b| *b == value));
        assert_eq!(frame.frame_to_origin(), Float4x4::translation(f, f, f));
        assert_eq!(frame.camera_view_transform(), Float4x4::translation(-f, -f, -f));
    }

    #[test]
    fn test_empty_before_first_set() {
        let cache = LatestFrameCache::new();
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_returns_last_set() {
        let cache = LatestFrameCache::new();
        for seq in 1..=5 {
            cache.set(frame(seq, 4));
        }
        assert_eq!(cache.get().unwrap().timestamp(), UniversalTime(5));
    }

    #[test]
    fn test_concurrent_set_get_never_tears() {
        let cache = Arc::new(LatestFrameCache::new());
        let writes = 2_000u32;

        let writer = {
            let cache = cache.clone();
            thread::spawn(move || {
                let mut rng = rand::rng();
                for seq in 1..=writes {
                    cache.set(frame(seq, rng.random_range(1..64)));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                thread::spawn(move || {
                    let mut last_seen = 0;
                    for _ in 0..writes {
                        if let Some(frame) = cache.get() {
                            assert_consistent(&frame);
                            let seq = frame.timestamp().ticks();
                            // single writer => monotonic observations
                            assert!(seq >= last_seen);
                            last_seen = seq;
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(cache.get().unwrap().timestamp(), UniversalTime(writes as i64));
    }
}

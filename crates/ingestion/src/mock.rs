//! Mock frame source and spatial perception
//!
//! Drives ingestion without a device:
//! - [`MockFrameReader`]: reader backed by a recycled pixel buffer pool
//! - [`MockFrameSource`]: background thread pushing frames at a fixed rate
//! - [`MockSpatialPerception`]: origin coordinate system and switchable timestamp resolution

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{
    BitmapPixelFormat, ContractError, Float4x4, FrameArrivedCallback, FrameProperties,
    FrameSource, HundredsOfNanoseconds, MediaFrameReader, MediaFrameReference,
    OriginFrameProvider, PerceptionTimestamp, PerceptionTimestampResolver, PropertyValue,
    SensorType, SharedPixelBuffer, SourceBitmap, SpatialCoordinateSystem, UniversalTime,
    VideoMediaFrame,
};
use parking_lot::Mutex;
use tracing::{debug, trace};
use uuid::Uuid;

/// A frame waiting to be pushed
#[derive(Debug, Clone)]
pub struct MockFrame {
    pub system_relative_time: HundredsOfNanoseconds,
    pub pixel_format: BitmapPixelFormat,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub pixels: Vec<u8>,
    pub properties: FrameProperties,
}

impl MockFrame {
    pub fn new(
        system_relative_time: HundredsOfNanoseconds,
        pixel_format: BitmapPixelFormat,
        pixel_width: u32,
        pixel_height: u32,
        pixels: Vec<u8>,
    ) -> Self {
        Self {
            system_relative_time,
            pixel_format,
            pixel_width,
            pixel_height,
            pixels,
            properties: FrameProperties::new(),
        }
    }

    /// Attach a metadata property
    pub fn with_property(mut self, key: Uuid, value: PropertyValue) -> Self {
        self.properties.insert(key, value);
        self
    }
}

#[derive(Debug, Default)]
struct ReaderState {
    started: bool,
    pool: Vec<SharedPixelBuffer>,
    next_slot: usize,
    pending: Option<MediaFrameReference>,
}

/// Reader backed by a fixed-size pool of recycled pixel buffers.
///
/// Once the pool is full every push overwrites the oldest buffer in place, so a
/// consumer that keeps a [`SourceBitmap`] around sees its pixels change.
/// Only the newest un-acquired frame is kept.
#[derive(Debug)]
pub struct MockFrameReader {
    pool_capacity: usize,
    state: Mutex<ReaderState>,
}

impl MockFrameReader {
    pub fn new(pool_capacity: usize) -> Self {
        Self {
            pool_capacity: pool_capacity.max(1),
            state: Mutex::new(ReaderState::default()),
        }
    }

    pub fn start(&self) {
        self.state.lock().started = true;
    }

    /// Stop the reader; pending frames are discarded
    pub fn stop(&self) {
        let mut state = self.state.lock();
        state.started = false;
        state.pending = None;
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    /// Publish a frame, recycling a pool buffer for its pixels
    pub fn push_frame(&self, frame: MockFrame) {
        let mut state = self.state.lock();

        let slot = state.next_slot % self.pool_capacity;
        state.next_slot = state.next_slot.wrapping_add(1);
        let buffer = match state.pool.get(slot) {
            Some(buffer) => {
                buffer.overwrite(&frame.pixels);
                buffer.clone()
            }
            None => {
                let buffer = SharedPixelBuffer::new(frame.pixels);
                state.pool.push(buffer.clone());
                buffer
            }
        };

        state.pending = Some(MediaFrameReference {
            system_relative_time: frame.system_relative_time,
            video_media_frame: Some(VideoMediaFrame {
                software_bitmap: Some(SourceBitmap {
                    pixel_format: frame.pixel_format,
                    pixel_width: frame.pixel_width,
                    pixel_height: frame.pixel_height,
                    buffer,
                }),
            }),
            properties: frame.properties,
        });
    }

    /// Publish an arbitrary reference, bypassing the pool
    pub fn push_reference(&self, reference: MediaFrameReference) {
        self.state.lock().pending = Some(reference);
    }

    /// Pool buffer at `index`, once it has been allocated
    pub fn buffer(&self, index: usize) -> Option<SharedPixelBuffer> {
        self.state.lock().pool.get(index).cloned()
    }
}

impl MediaFrameReader for MockFrameReader {
    fn try_acquire_latest_frame(&self) -> Option<MediaFrameReference> {
        let mut state = self.state.lock();
        if !state.started {
            return None;
        }
        state.pending.take()
    }
}

/// Mock frame source configuration
#[derive(Debug, Clone)]
pub struct MockFrameSourceConfig {
    /// Send frequency (Hz)
    pub frequency_hz: f64,
    /// Reported width
    pub image_width: u32,
    pub image_height: u32,
    pub pixel_format: BitmapPixelFormat,
    /// Pixel buffer pool size
    pub pool_capacity: usize,
}

impl Default for MockFrameSourceConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 30.0,
            image_width: 64,
            image_height: 48,
            pixel_format: BitmapPixelFormat::Gray8,
            pool_capacity: 4,
        }
    }
}

/// Mock frame source
///
/// Implements [`FrameSource`]: a background thread pushes frames into its own
/// [`MockFrameReader`] at the configured rate and fires the arrival callback once per frame.
pub struct MockFrameSource {
    sensor_type: SensorType,
    config: MockFrameSourceConfig,
    properties: FrameProperties,
    reader: Arc<MockFrameReader>,
    clock_origin: Instant,
    listening: Arc<AtomicBool>,
    /// Producer thread of the current run; held while starting and joining
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MockFrameSource {
    pub fn new(sensor_type: SensorType, config: MockFrameSourceConfig) -> Self {
        let reader = Arc::new(MockFrameReader::new(config.pool_capacity));
        Self {
            sensor_type,
            config,
            properties: FrameProperties::new(),
            reader,
            clock_origin: Instant::now(),
            listening: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    pub fn with_defaults(sensor_type: SensorType) -> Self {
        Self::new(sensor_type, MockFrameSourceConfig::default())
    }

    /// Properties attached to every generated frame
    pub fn with_frame_properties(mut self, properties: FrameProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Current reading of the device-relative clock
    pub fn relative_now(&self) -> HundredsOfNanoseconds {
        HundredsOfNanoseconds::from_duration(self.clock_origin.elapsed())
    }

    pub fn reader(&self) -> Arc<MockFrameReader> {
        self.reader.clone()
    }

    fn generate_frame(
        config: &MockFrameSourceConfig,
        properties: &FrameProperties,
        relative_time: HundredsOfNanoseconds,
        frame_id: u64,
    ) -> MockFrame {
        let len = config
            .pixel_format
            .buffer_len(config.image_width, config.image_height);
        MockFrame {
            system_relative_time: relative_time,
            pixel_format: config.pixel_format,
            pixel_width: config.image_width,
            pixel_height: config.image_height,
            pixels: vec![(frame_id % 256) as u8; len],
            properties: properties.clone(),
        }
    }
}

impl FrameSource for MockFrameSource {
    fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    fn listen(&self, callback: FrameArrivedCallback) {
        let mut worker = self.worker.lock();
        // already listening
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let sensor_type = self.sensor_type;
        let config = self.config.clone();
        let properties = self.properties.clone();
        let reader = self.reader.clone();
        let listening = self.listening.clone();
        let clock_origin = self.clock_origin;

        let interval = Duration::from_secs_f64(1.0 / config.frequency_hz.max(f64::EPSILON));
        reader.start();

        *worker = Some(thread::spawn(move || {
            let mut frame_id: u64 = 0;

            debug!(
                sensor = %sensor_type,
                frequency_hz = config.frequency_hz,
                "mock frame source started"
            );

            while listening.load(Ordering::Relaxed) {
                frame_id += 1;
                let relative_time = HundredsOfNanoseconds::from_duration(clock_origin.elapsed());

                reader.push_frame(Self::generate_frame(
                    &config,
                    &properties,
                    relative_time,
                    frame_id,
                ));
                callback(reader.as_ref());

                trace!(
                    sensor = %sensor_type,
                    frame_id,
                    relative_ticks = relative_time.count(),
                    "mock frame pushed"
                );

                thread::sleep(interval);
            }

            debug!(sensor = %sensor_type, "mock frame source stopped");
        }));
    }

    fn stop(&self) {
        let mut worker = self.worker.lock();
        self.listening.store(false, Ordering::SeqCst);

        // the producer must be gone before a later listen() can start another one
        if let Some(handle) = worker.take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
        self.reader.stop();
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

impl Drop for MockFrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Coordinate system with a fixed set of known transforms
#[derive(Debug)]
pub struct MockCoordinateSystem {
    id: Uuid,
    links: HashMap<Uuid, Float4x4>,
}

impl MockCoordinateSystem {
    fn new(links: HashMap<Uuid, Float4x4>) -> Self {
        Self {
            id: Uuid::new_v4(),
            links,
        }
    }
}

impl SpatialCoordinateSystem for MockCoordinateSystem {
    fn id(&self) -> Uuid {
        self.id
    }

    fn try_get_transform_to(&self, target: &dyn SpatialCoordinateSystem) -> Option<Float4x4> {
        let target_id = target.id();
        if target_id == self.id {
            return Some(Float4x4::IDENTITY);
        }
        self.links.get(&target_id).copied()
    }
}

/// Spatial perception stand-in
///
/// Owns an origin coordinate system and hands out camera coordinate systems
/// that are either related to it by a fixed transform or not related at all.
#[derive(Debug)]
pub struct MockSpatialPerception {
    origin: Arc<MockCoordinateSystem>,
    timestamp_failure: AtomicBool,
}

impl MockSpatialPerception {
    pub fn new() -> Self {
        Self {
            origin: Arc::new(MockCoordinateSystem::new(HashMap::new())),
            timestamp_failure: AtomicBool::new(false),
        }
    }

    /// Coordinate system whose transform to the origin is `to_origin`
    pub fn camera_coordinate_system(&self, to_origin: Float4x4) -> Arc<dyn SpatialCoordinateSystem> {
        let links = HashMap::from([(self.origin.id(), to_origin)]);
        Arc::new(MockCoordinateSystem::new(links))
    }

    /// Coordinate system with no known relationship to the origin (tracking lost)
    pub fn detached_coordinate_system(&self) -> Arc<dyn SpatialCoordinateSystem> {
        Arc::new(MockCoordinateSystem::new(HashMap::new()))
    }

    /// Make subsequent timestamp resolutions fail
    pub fn set_timestamp_failure(&self, fail: bool) {
        self.timestamp_failure.store(fail, Ordering::SeqCst);
    }
}

impl Default for MockSpatialPerception {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginFrameProvider for MockSpatialPerception {
    fn origin_coordinate_system(&self) -> Arc<dyn SpatialCoordinateSystem> {
        self.origin.clone()
    }
}

impl PerceptionTimestampResolver for MockSpatialPerception {
    fn from_historical_target_time(
        &self,
        target_time: UniversalTime,
    ) -> Result<PerceptionTimestamp, ContractError> {
        if self.timestamp_failure.load(Ordering::SeqCst) {
            return Err(ContractError::perception_timestamp(
                target_time.ticks(),
                "target time outside retained pose history",
            ));
        }
        Ok(PerceptionTimestamp::new(target_time, Duration::ZERO))
    }
}

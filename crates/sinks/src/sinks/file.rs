//! FileSink - records frames to disk
//!
//! Layout under `base_path`:
//! - `<sensor_type>/<timestamp>.png` (`.bin` for NV12) per frame
//! - `<sensor_type>.csv`, one row per frame: timestamp, image file, the 16
//!   frame-to-origin values and the 16 camera-view values (row-major)

use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use contracts::{BitmapPixelFormat, SensorFrame, SensorFrameSink, SensorType, SoftwareBitmap};
use parking_lot::Mutex;
use tracing::{debug, error, trace};

use crate::error::SinkError;
use crate::metrics::SinkMetrics;

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Base output directory
    pub base_path: PathBuf,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(name: &str, params: &HashMap<String, String>) -> Result<Self, SinkError> {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .ok_or_else(|| SinkError::MissingParam {
                name: name.to_string(),
                param: "base_path",
            })?;

        Ok(Self { base_path })
    }
}

#[derive(Default)]
struct RecorderState {
    created_dirs: HashSet<PathBuf>,
    trace_files: HashMap<SensorType, BufWriter<File>>,
}

/// Sink that records frames to disk files
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    state: Mutex<RecorderState>,
    metrics: Arc<SinkMetrics>,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;

        let name = name.into();
        Ok(Self {
            metrics: Arc::new(SinkMetrics::new(name.clone())),
            name,
            config,
            state: Mutex::new(RecorderState::default()),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, SinkError> {
        let name = name.into();
        let config = FileSinkConfig::from_params(&name, params)?;
        Self::new(name, config).map_err(SinkError::from)
    }

    pub fn base_path(&self) -> &Path {
        &self.config.base_path
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Flush buffered CSV rows
    pub fn flush(&self) -> std::io::Result<()> {
        let mut state = self.state.lock();
        for writer in state.trace_files.values_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn write_frame_to_disk(&self, frame: &SensorFrame) -> std::io::Result<()> {
        let mut state = self.state.lock();

        let sensor_dir = self.config.base_path.join(frame.sensor_type().as_str());
        if !state.created_dirs.contains(&sensor_dir) {
            fs::create_dir_all(&sensor_dir)?;
            state.created_dirs.insert(sensor_dir.clone());
        }

        let image = frame.image();
        let extension = match image.pixel_format() {
            BitmapPixelFormat::Nv12 => "bin",
            _ => "png",
        };
        let filename = format!("{}.{}", frame.timestamp().ticks(), extension);
        Self::save_image(&sensor_dir.join(&filename), image)?;

        let image_file = format!("{}/{}", frame.sensor_type().as_str(), filename);
        let writer = match state.trace_files.entry(frame.sensor_type()) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                let path = self
                    .config
                    .base_path
                    .join(format!("{}.csv", frame.sensor_type().as_str()));
                entry.insert(Self::open_trace_file(&path)?)
            }
        };
        Self::write_trace_row(writer, frame, &image_file)?;
        writer.flush()?;

        trace!(sink = %self.name, file = %image_file, "frame recorded");
        Ok(())
    }

    fn open_trace_file(path: &Path) -> std::io::Result<BufWriter<File>> {
        let is_new = !path.exists();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        if is_new {
            writeln!(writer, "{}", Self::trace_header())?;
        }
        Ok(writer)
    }

    fn trace_header() -> String {
        let mut columns = vec!["timestamp".to_string(), "image_file".to_string()];
        for prefix in ["frame_to_origin", "camera_view"] {
            for row in 1..=4 {
                for col in 1..=4 {
                    columns.push(format!("{prefix}_m{row}{col}"));
                }
            }
        }
        columns.join(",")
    }

    fn write_trace_row(
        writer: &mut impl Write,
        frame: &SensorFrame,
        image_file: &str,
    ) -> std::io::Result<()> {
        write!(writer, "{},{}", frame.timestamp().ticks(), image_file)?;
        let frame_to_origin = frame.frame_to_origin();
        let camera_view = frame.camera_view_transform();
        for value in frame_to_origin.elements().chain(camera_view.elements()) {
            write!(writer, ",{value}")?;
        }
        writeln!(writer)
    }

    fn save_image(path: &Path, image: &SoftwareBitmap) -> std::io::Result<()> {
        let (width, height) = (image.pixel_width(), image.pixel_height());
        let data = image.data();
        match image.pixel_format() {
            BitmapPixelFormat::Rgba8 => {
                image::save_buffer(path, data, width, height, image::ColorType::Rgba8)
                    .map_err(std::io::Error::other)
            }
            BitmapPixelFormat::Bgra8 => {
                // Convert BGRA to RGBA
                let mut rgba_data = data.to_vec();
                for chunk in rgba_data.chunks_exact_mut(4) {
                    chunk.swap(0, 2);
                }
                image::save_buffer(path, &rgba_data, width, height, image::ColorType::Rgba8)
                    .map_err(std::io::Error::other)
            }
            BitmapPixelFormat::Gray8 => {
                image::save_buffer(path, data, width, height, image::ColorType::L8)
                    .map_err(std::io::Error::other)
            }
            BitmapPixelFormat::Gray16 => {
                image::save_buffer(path, data, width, height, image::ColorType::L16)
                    .map_err(std::io::Error::other)
            }
            BitmapPixelFormat::Nv12 => fs::write(path, data),
        }
    }
}

impl SensorFrameSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, frame: Arc<SensorFrame>) {
        match self.write_frame_to_disk(&frame) {
            Ok(()) => self.metrics.record_delivered(),
            Err(e) => {
                self.metrics.record_failed();
                error!(
                    sink = %self.name,
                    sensor_type = %frame.sensor_type(),
                    timestamp = frame.timestamp().ticks(),
                    error = %e,
                    "Write failed"
                );
            }
        }
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            error!(sink = %self.name, error = %e, "Flush failed on close");
        }
        debug!(sink = %self.name, "FileSink closed");
    }
}

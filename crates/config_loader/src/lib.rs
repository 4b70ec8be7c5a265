//! # Config Loader
//!
//! Builds a validated `StreamingConfig` from a `.toml` or `.json` file.
//!
//! Loading runs in three stages: deserialize (unknown keys are rejected),
//! apply `key=value` overrides in the order given, then validate the result.
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), contracts::ContractError> {
//! let config = ConfigLoader::new()
//!     .with_overrides(["sensors.photo_video.enabled=false", "observability.log_level=debug"])?
//!     .load(Path::new("streaming.toml"))?;
//! for sensor in config.enabled_sensors() {
//!     println!("stream: {sensor}");
//! }
//! # Ok(())
//! # }
//! ```

mod format;
mod overrides;
mod validator;

pub use contracts::StreamingConfig;
pub use format::ConfigFormat;
pub use overrides::ConfigOverride;

use contracts::ContractError;
use std::path::Path;
use tracing::{debug, instrument};

/// Loads `StreamingConfig` and applies overrides before validation
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    overrides: Vec<ConfigOverride>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one `key=value` override
    pub fn with_override(mut self, spec: &str) -> Result<Self, ContractError> {
        self.overrides.push(spec.parse()?);
        Ok(self)
    }

    /// Add several overrides, applied in iteration order
    pub fn with_overrides<I, S>(self, specs: I) -> Result<Self, ContractError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        specs
            .into_iter()
            .try_fold(self, |loader, spec| loader.with_override(spec.as_ref()))
    }

    pub fn overrides(&self) -> &[ConfigOverride] {
        &self.overrides
    }

    /// Load from a file, format chosen by extension
    #[instrument(name = "config_load", skip(self, path), fields(path = %path.display()))]
    pub fn load(&self, path: &Path) -> Result<StreamingConfig, ContractError> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        self.parse(&content, format)
    }

    /// Load from in-memory content
    pub fn parse(&self, content: &str, format: ConfigFormat) -> Result<StreamingConfig, ContractError> {
        let mut config = format.deserialize(content)?;
        for item in &self.overrides {
            item.apply(&mut config)?;
        }
        validator::validate(&config)?;

        debug!(
            %format,
            sensors = config.sensors.len(),
            sinks = config.sinks.len(),
            overrides = self.overrides.len(),
            "configuration loaded"
        );
        Ok(config)
    }
}

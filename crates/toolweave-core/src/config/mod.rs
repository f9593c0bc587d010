//! Configuration
//!
//! Thresholds and remote connections come from YAML files; every field has a
//! default so partial files are valid.

mod error;
mod settings;
mod file;

pub use error::{ConfigError, ConfigResult};
pub use settings::{CacheSettings, OrchestratorSettings, ResolverSettings, ToolweaveConfig};
pub use file::{ConfigFile, ConfigLevel, FileConfigLoader, FileConfigProvider};

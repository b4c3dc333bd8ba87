//! Configuration System using Figment
//!
//! Settings are layered, later sources overriding earlier ones:
//! 1. Built-in defaults
//! 2. A TOML file (`config/sweeper.toml` unless another path is given)
//! 3. Environment variables prefixed with `SWEEPER_`, nested keys split on `__`
//!
//! # Example
//! ```no_run
//! use sweeper::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Ring capacity: {}", settings.layout.capacity);
//! # Ok::<(), sweeper::error::SweepError>(())
//! ```

use crate::dump::WritePolicy;
use crate::error::{AppResult, SweepError};
use crate::sweep::RingLayout;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the optional configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/sweeper.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Ring geometry shared by capture and decode
    #[serde(default)]
    pub layout: RingLayout,
    /// Capture loop behaviour
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Driver-exposed files for the mapped-memory source
    #[serde(default)]
    pub mapped: MappedConfig,
    /// Socket settings for the datagram source
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format (pretty, compact, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Include source file and line in log lines
    #[serde(default)]
    pub log_source_location: bool,
    /// Colour pretty-format output
    #[serde(default = "default_log_ansi")]
    pub log_ansi: bool,
}

/// Capture loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Pause between snapshots of the mapped region
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,
    /// What to do when appending to the log fails
    #[serde(default)]
    pub write_policy: WritePolicy,
    /// Stop after this many snapshots (unbounded if unset)
    #[serde(default)]
    pub max_snapshots: Option<u64>,
}

/// Mapped-memory source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappedConfig {
    /// File holding the `"<address> <size>"` metadata line
    #[serde(default = "default_meminfo_path")]
    pub meminfo_path: PathBuf,
    /// Device node to map
    #[serde(default = "default_mmap_path")]
    pub mmap_path: PathBuf,
}

/// Datagram source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Local address to receive snapshots on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Receive timeout, also the cancellation latency of a datagram capture
    #[serde(default = "default_recv_timeout", with = "humantime_serde")]
    pub recv_timeout: Duration,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

fn default_log_ansi() -> bool {
    true
}

fn default_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_meminfo_path() -> PathBuf {
    PathBuf::from("/proc/sweep_dumps/meminfo")
}

fn default_mmap_path() -> PathBuf {
    PathBuf::from("/proc/sweep_dumps/mmap")
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5220))
}

fn default_recv_timeout() -> Duration {
    Duration::from_secs(1)
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            log_source_location: false,
            log_ansi: default_log_ansi(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            write_policy: WritePolicy::default(),
            max_snapshots: None,
        }
    }
}

impl Default for MappedConfig {
    fn default() -> Self {
        Self {
            meminfo_path: default_meminfo_path(),
            mmap_path: default_mmap_path(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            recv_timeout: default_recv_timeout(),
        }
    }
}

impl Settings {
    /// Load from the default file location (if present) and the environment
    pub fn load() -> AppResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load from a specific file path (if present) and the environment
    ///
    /// Example: `SWEEPER_CAPTURE__WRITE_POLICY=best_effort`
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let settings: Settings = Self::figment(path.as_ref()).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("SWEEPER_").split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> AppResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(SweepError::Config(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.application.log_format.as_str()) {
            return Err(SweepError::Config(format!(
                "Invalid log_format '{}'. Must be one of: {}",
                self.application.log_format,
                valid_formats.join(", ")
            )));
        }

        self.layout.validate()?;

        // A zero timeout would put the socket in blocking mode forever
        if self.network.recv_timeout.is_zero() {
            return Err(SweepError::Config(
                "network.recv_timeout must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

//! # permafs-config
//!
//! Configuration management for permafs.
//!
//! Loads configuration from:
//! 1. `~/.permafs/config.toml` (global)
//! 2. `.permafs/config.toml` (project-local, overrides global)
//! 3. Environment variables (highest priority)

pub mod logging;
pub mod testing;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub use logging::{init_logging, LogLevel};

pub const ENV_INDEX_SOCKET: &str = "PERMAFS_INDEX_SOCKET";
pub const ENV_ROOTS_LIMIT: &str = "PERMAFS_ROOTS_LIMIT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub index: IndexConfig,
    pub roots: RootsConfig,
    pub mount: MountConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from standard locations
    pub fn load() -> Result<Self, ConfigError> {
        let global = Self::global_config_path();
        Self::load_from(global.as_deref(), Some(Path::new(".permafs/config.toml")))
    }

    /// Load from explicit global and project files, then apply the environment.
    /// Missing files are skipped.
    pub fn load_from(global: Option<&Path>, project: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(global_path) = global.filter(|p| p.exists()) {
            debug!("Loading global config from {:?}", global_path);
            let contents = std::fs::read_to_string(global_path)?;
            config = toml::from_str(&contents)?;
        }

        if let Some(project_path) = project.filter(|p| p.exists()) {
            debug!("Loading project config from {:?}", project_path);
            let contents = std::fs::read_to_string(project_path)?;
            let project_config: PartialConfig = toml::from_str(&contents)?;
            config.merge(project_config);
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Global config path: ~/.permafs/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".permafs/config.toml"))
    }

    /// Merge a project config; only keys present in the project file win.
    fn merge(&mut self, other: PartialConfig) {
        if let Some(index) = other.index {
            if let Some(socket) = index.socket {
                self.index.socket = socket;
            }
            if let Some(timeout) = index.request_timeout_ms {
                self.index.request_timeout_ms = Some(timeout);
            }
        }
        if let Some(roots) = other.roots {
            if let Some(attribute) = roots.attribute {
                self.roots.attribute = attribute;
            }
            if let Some(limit) = roots.limit {
                self.roots.limit = limit;
            }
        }
        if let Some(mount) = other.mount {
            if let Some(fs_name) = mount.fs_name {
                self.mount.fs_name = fs_name;
            }
            if let Some(ttl) = mount.entry_ttl_ms {
                self.mount.entry_ttl_ms = ttl;
            }
            if let Some(allow_other) = mount.allow_other {
                self.mount.allow_other = allow_other;
            }
        }
        if let Some(logging) = other.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(socket) = lookup(ENV_INDEX_SOCKET) {
            self.index.socket = PathBuf::from(socket);
        }
        if let Some(limit) = lookup(ENV_ROOTS_LIMIT) {
            if let Ok(n) = limit.parse() {
                self.roots.limit = n;
            }
        }
    }

    /// Generate default config TOML string
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }
}

/// Index daemon connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Unix socket of the index daemon
    pub socket: PathBuf,
    /// Per-request timeout; unset waits for the index
    pub request_timeout_ms: Option<u64>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            socket: PathBuf::from("/tmp/permafs-index.sock"),
            request_timeout_ms: None,
        }
    }
}

/// Root discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RootsConfig {
    /// Attribute marking a permanode as a root
    pub attribute: String,
    /// Maximum number of roots listed
    pub limit: usize,
}

impl Default for RootsConfig {
    fn default() -> Self {
        Self {
            attribute: "camliRoot".to_string(),
            limit: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MountConfig {
    pub fs_name: String,
    /// How long the kernel may cache entries and attributes
    pub entry_ttl_ms: u64,
    pub allow_other: bool,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            fs_name: "permafs".to_string(),
            entry_ttl_ms: 0,
            allow_other: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    index: Option<PartialIndex>,
    roots: Option<PartialRoots>,
    mount: Option<PartialMount>,
    logging: Option<PartialLogging>,
}

#[derive(Debug, Deserialize)]
struct PartialIndex {
    socket: Option<PathBuf>,
    request_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PartialRoots {
    attribute: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct PartialMount {
    fs_name: Option<String>,
    entry_ttl_ms: Option<u64>,
    allow_other: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct PartialLogging {
    level: Option<LogLevel>,
}

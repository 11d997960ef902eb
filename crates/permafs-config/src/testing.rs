//! Test environment abstraction for isolated testing.
//!
//! Provides `TestEnvironment` to manage:
//! - Isolated index socket paths
//! - Global and project config files
//! - Mountpoint directories
//!
//! # Usage
//!
//! ```ignore
//! use permafs_config::testing::TestEnvironment;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let env = TestEnvironment::new().unwrap();
//!     // env.socket_path, env.mountpoint are isolated
//!     // No index daemon is started - tests control lifecycle
//! }
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;

use crate::{Config, ConfigError, IndexConfig};

/// Atomic counter for unique test IDs
static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Isolated test environment with unique paths
pub struct TestEnvironment {
    /// Temporary directory (dropped on cleanup)
    _temp_dir: TempDir,
    /// Unique index socket path for this test
    pub socket_path: PathBuf,
    /// Stand-in for `~/.permafs`
    pub home_dir: PathBuf,
    /// Stand-in for the project `.permafs`
    pub project_dir: PathBuf,
    /// Empty directory to mount on
    pub mountpoint: PathBuf,
    /// Unique test ID
    pub test_id: u32,
}

impl TestEnvironment {
    /// Create a new isolated test environment
    pub fn new() -> anyhow::Result<Self> {
        let test_id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        let home_dir = root.join("home/.permafs");
        let project_dir = root.join("project/.permafs");
        let mountpoint = root.join("mnt");

        std::fs::create_dir_all(&home_dir)?;
        std::fs::create_dir_all(&project_dir)?;
        std::fs::create_dir_all(&mountpoint)?;

        let socket_path = root.join(format!("permafs-test-{}.sock", test_id));

        Ok(Self {
            _temp_dir: temp_dir,
            socket_path,
            home_dir,
            project_dir,
            mountpoint,
            test_id,
        })
    }

    pub fn global_config_path(&self) -> PathBuf {
        self.home_dir.join("config.toml")
    }

    pub fn project_config_path(&self) -> PathBuf {
        self.project_dir.join("config.toml")
    }

    /// Write the global config file
    pub fn write_global_config(&self, contents: &str) -> anyhow::Result<PathBuf> {
        let path = self.global_config_path();
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Write the project config file
    pub fn write_project_config(&self, contents: &str) -> anyhow::Result<PathBuf> {
        let path = self.project_config_path();
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Load config from this environment's files, pointed at its socket
    /// unless a file says otherwise.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let global = self.global_config_path();
        let project = self.project_config_path();
        let mut config = Config::load_from(Some(&global), Some(&project))?;
        if config.index.socket == IndexConfig::default().socket {
            config.index.socket = self.socket_path.clone();
        }
        Ok(config)
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}

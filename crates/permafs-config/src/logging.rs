//! Structured logging utilities for permafs components.
//!
//! Provides consistent logging with component prefixes and structured fields.
//!
//! # Usage
//!
//! ```ignore
//! use permafs_config::{log_vfs_debug, log_index_warn};
//! use tracing::field::display;
//!
//! log_vfs_debug!("Lookup", name = "foo");
//! log_index_warn!("Describe failed", error = display(&e));
//! ```

use serde::{Deserialize, Serialize};

/// Component identifiers for log filtering
pub struct Component;

impl Component {
    pub const VFS: &'static str = "VFS";
    pub const INDEX: &'static str = "INDEX";
    pub const BRIDGE: &'static str = "BRIDGE";
}

/// Log levels for runtime configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

// === VFS logging macros ===

#[macro_export]
macro_rules! log_vfs_warn {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(component = $crate::logging::Component::VFS, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_vfs_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = $crate::logging::Component::VFS, $($key = $value,)* $msg)
    };
}

// === INDEX logging macros ===

#[macro_export]
macro_rules! log_index_warn {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(component = $crate::logging::Component::INDEX, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_index_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = $crate::logging::Component::INDEX, $($key = $value,)* $msg)
    };
}

// === BRIDGE logging macros ===

#[macro_export]
macro_rules! log_bridge_info {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(component = $crate::logging::Component::BRIDGE, $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_bridge_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = $crate::logging::Component::BRIDGE, $($key = $value,)* $msg)
    };
}

/// Initialize logging with the given level filter.
/// `PERMAFS_LOG`, then `RUST_LOG`, take precedence over `level`.
/// Call this once at application startup.
pub fn init_logging(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_env("PERMAFS_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

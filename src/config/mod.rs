//! Configuration management for foldwise.
//!
//! Configuration is optional: every component can be driven directly from
//! code. [`HarnessConfig`] exists for the common case of a driver that reads
//! file locations and validation settings from a `.toml` or `.json` file.

pub mod core;

pub use self::core::{DataConfig, ExportConfig, HarnessConfig, HarnessConfigBuilder, ValidationConfig};

/// Configuration file looked up by drivers when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "foldwise.toml";

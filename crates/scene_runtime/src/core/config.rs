//! # Unified Configuration System
//!
//! All runtime configuration structures in one place: registry soft limits,
//! cache capacity, and culling behavior, plus file load/save support.
//!
//! ## Design Goals
//!
//! - **Centralized**: one aggregate [`RuntimeConfig`] for the whole core
//! - **Serializable**: TOML and RON via the [`Config`] trait
//! - **Type Safe**: strong typing with validation and sensible defaults

use crate::resources::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration trait providing file load/save for serde-derived configs.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a `.toml` or `.ron` file.
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to a `.toml` or `.ron` file.
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// # Resource Registry Configuration
///
/// Advisory per-kind soft limits. A limit of zero means unlimited; exceeding
/// a limit logs a warning but never rejects the registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Soft limit applied to every kind without an explicit override (0 = unlimited)
    pub default_soft_limit: usize,
    /// Per-kind overrides, keyed by the kind's canonical name (see [`ResourceKind::name`])
    pub soft_limits: HashMap<String, usize>,
}

impl RegistryConfig {
    /// Create a configuration with no limits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_soft_limit: 0,
            soft_limits: HashMap::new(),
        }
    }

    /// Set the soft limit applied to kinds without an override.
    #[must_use]
    pub fn with_default_soft_limit(mut self, limit: usize) -> Self {
        self.default_soft_limit = limit;
        self
    }

    /// Override the soft limit for one resource kind.
    #[must_use]
    pub fn with_soft_limit(mut self, kind: ResourceKind, limit: usize) -> Self {
        self.soft_limits.insert(kind.name().to_string(), limit);
        self
    }

    /// Effective soft limit for a kind (0 = unlimited).
    #[must_use]
    pub fn soft_limit_for(&self, kind: ResourceKind) -> usize {
        self.soft_limits
            .get(kind.name())
            .copied()
            .unwrap_or(self.default_soft_limit)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Bounded Cache Configuration
///
/// Two independent capacity pressures (entry count and total bytes) plus an
/// optional time-to-live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of live entries
    pub max_entries: usize,
    /// Maximum total declared size in bytes
    pub max_size_bytes: usize,
    /// Entry time-to-live in milliseconds; 0 disables time-based expiry
    pub ttl_ms: u64,
}

impl CacheConfig {
    /// Create a configuration with the standard defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_entries: 100,
            max_size_bytes: 100 * 1024 * 1024, // 100 MiB
            ttl_ms: 0,
        }
    }

    /// Set the maximum entry count.
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Set the maximum total size in bytes.
    #[must_use]
    pub fn with_max_size_bytes(mut self, max_size_bytes: usize) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }

    /// Set the time-to-live in milliseconds (0 = never expires by time).
    #[must_use]
    pub fn with_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_entries == 0 {
            return Err("Cache max_entries must be at least 1".to_string());
        }
        if self.max_size_bytes == 0 {
            return Err("Cache max_size_bytes must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Viewport Culling Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CullingConfig {
    /// Margin added to every viewport edge before the visibility test, in
    /// world units; absorbs objects about to enter the frame
    pub cull_margin: f32,
    /// Whether the viewport test runs at all (disabled = everything enabled is visible)
    pub enable_culling: bool,
    /// Whether survivors are stable-sorted ascending by depth
    pub enable_depth_sort: bool,
    /// Edge length of one spatial-grid cell, in world units
    pub cell_size: f32,
}

impl CullingConfig {
    /// Create a configuration with the standard defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cull_margin: 50.0,
            enable_culling: true,
            enable_depth_sort: true,
            cell_size: 256.0,
        }
    }

    /// Set the viewport expansion margin.
    #[must_use]
    pub fn with_cull_margin(mut self, margin: f32) -> Self {
        self.cull_margin = margin;
        self
    }

    /// Enable or disable the viewport test.
    #[must_use]
    pub fn with_culling(mut self, enabled: bool) -> Self {
        self.enable_culling = enabled;
        self
    }

    /// Enable or disable depth sorting of survivors.
    #[must_use]
    pub fn with_depth_sort(mut self, enabled: bool) -> Self {
        self.enable_depth_sort = enabled;
        self
    }

    /// Set the spatial-grid cell size.
    #[must_use]
    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.cull_margin < 0.0 {
            return Err("Cull margin cannot be negative".to_string());
        }
        if self.cell_size <= 0.0 {
            return Err("Grid cell size must be positive".to_string());
        }
        Ok(())
    }
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Runtime Configuration
///
/// Top-level configuration encompassing all core subsystems. This is the
/// structure applications hand to [`SceneRuntime`](crate::SceneRuntime).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Resource registry limits
    pub registry: RegistryConfig,
    /// Cache capacity and expiry
    pub cache: CacheConfig,
    /// Viewport culling behavior
    pub culling: CullingConfig,
}

impl RuntimeConfig {
    /// Create a configuration with defaults for every subsystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the entire configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.cache.validate()?;
        self.culling.validate()?;
        Ok(())
    }
}

impl Config for RuntimeConfig {}

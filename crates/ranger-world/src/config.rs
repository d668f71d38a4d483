//! World configuration.
//!
//! Aggregates the terrain, texturing, scatter, and streaming parameters
//! into one document that can be loaded from and saved to a TOML file.

use std::fs;
use std::path::Path;

use ranger_common::{ConfigError, ConfigResult, TextureId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::streaming::StreamerConfig;
use crate::terrain::{GroundTexture, ScatterRuleConfig, TerrainConfig, TextureTable};

/// Configuration file name.
pub const CONFIG_FILE: &str = "ranger.toml";

/// Full world-generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Noise and sampling parameters
    pub terrain: TerrainConfig,
    /// Chunk streaming parameters
    pub streaming: StreamerConfig,
    /// Ordered ground-texture bands
    pub textures: TextureTable,
    /// Ground-cover scatter rules
    pub scatter: Vec<ScatterRuleConfig>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            terrain: TerrainConfig::default(),
            streaming: StreamerConfig::default(),
            textures: default_textures(),
            scatter: Vec::new(),
        }
    }
}

fn default_textures() -> TextureTable {
    let entries = vec![
        GroundTexture {
            name: "water".into(),
            texture: TextureId::new(0),
            height_min: 0.0,
            height_max: 0.3,
        },
        GroundTexture {
            name: "grass".into(),
            texture: TextureId::new(1),
            height_min: 0.4,
            height_max: 0.7,
        },
        GroundTexture {
            name: "rock".into(),
            texture: TextureId::new(2),
            height_min: 0.8,
            height_max: 1.0,
        },
    ];
    // The built-in table always validates.
    TextureTable::new(entries).unwrap_or_else(|_| unreachable!("default texture table is valid"))
}

impl WorldConfig {
    /// Loads configuration from a file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        info!("loaded world config from {}", path.display());
        Ok(config)
    }

    /// Loads configuration, falling back to defaults when the file is
    /// missing or invalid.
    #[must_use]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("world config not found, using defaults");
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("failed to load world config: {e}");
                Self::default()
            },
        }
    }

    /// Saves configuration to a file, creating parent directories.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, contents)?;
        info!("saved world config to {}", path.display());
        Ok(())
    }

    /// Validates every section.
    pub fn validate(&self) -> ConfigResult<()> {
        self.terrain.validate()?;
        self.streaming.validate()?;
        for rule in &self.scatter {
            rule.validate()?;
        }
        Ok(())
    }
}

//! Run configuration
//!
//! Read from the JSON file named by `LUNA_SETTINGS`, falling back to
//! defaults. Every section is optional; missing fields keep their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::{PhysicsError, PhysicsParams, TerrainError, TerrainParams};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid terrain settings: {0}")]
    Terrain(#[from] TerrainError),
    #[error("invalid physics settings: {0}")]
    Physics(#[from] PhysicsError),
    #[error("invalid settings: {0}")]
    Invalid(&'static str),
}

/// Window and swapchain preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    /// Present with vsync (Fifo) instead of the lowest-latency mode available
    pub vsync: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: WINDOW_WIDTH,
            height: WINDOW_HEIGHT,
            vsync: true,
        }
    }
}

/// Full run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// World seed; same seed gives the same terrain and stars
    pub seed: u64,
    /// Visible sky height (stars and spawn point)
    pub world_height: f32,
    pub star_count: usize,
    /// Frame slots allowed in flight at once
    pub frames_in_flight: usize,
    pub window: WindowSettings,
    pub terrain: TerrainParams,
    pub physics: PhysicsParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            world_height: WORLD_HEIGHT,
            star_count: STAR_COUNT,
            frames_in_flight: MAX_FRAMES_IN_FLIGHT,
            window: WindowSettings::default(),
            terrain: TerrainParams::default(),
            physics: PhysicsParams::default(),
        }
    }
}

impl Settings {
    /// Environment variable naming a settings file
    pub const ENV_VAR: &'static str = "LUNA_SETTINGS";

    /// Load from `LUNA_SETTINGS` if set, defaults otherwise
    pub fn load() -> Result<Self, SettingsError> {
        match std::env::var_os(Self::ENV_VAR) {
            Some(path) => {
                let settings = Self::from_file(&path)?;
                log::info!("Loaded settings from {}", Path::new(&path).display());
                Ok(settings)
            }
            None => {
                log::info!("Using default settings");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Parse and validate
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Every construction-time check, so bad configuration fails before the window opens
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.terrain.validate()?;
        self.physics.validate()?;
        if self.frames_in_flight == 0 {
            return Err(SettingsError::Invalid("frames_in_flight must be at least 1"));
        }
        if !self.world_height.is_finite() || self.world_height <= 0.0 {
            return Err(SettingsError::Invalid("world_height must be positive"));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(SettingsError::Invalid("window size must be non-zero"));
        }
        Ok(())
    }
}

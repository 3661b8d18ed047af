//! Viewer configuration loaded from an optional JSON file.

use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;
use crate::highlight::Material;
use crate::scene::PerspectiveCamera;

/// Viewer settings. Every field falls back to its default when omitted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub camera: PerspectiveCamera,
    #[serde(default = "Material::hover")]
    pub hover: Material,
    #[serde(default = "Material::select")]
    pub select: Material,
    pub grid: GridConfig,
    /// Viewport used by `--pick` when no size is given on the command line.
    pub viewport: ViewportSize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            camera: PerspectiveCamera::default(),
            hover: Material::hover(),
            select: Material::select(),
            grid: GridConfig::default(),
            viewport: ViewportSize::default(),
        }
    }
}

/// Ground grid helper.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub size: f32,
    pub divisions: u32,
    pub visible: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 50.0,
            divisions: 30,
            visible: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

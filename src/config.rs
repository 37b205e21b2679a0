use crate::color::Color;
use crate::display::LineAlgorithm;
use crate::kernels::Backend;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Where draw calls land before the upscale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Palette indices, converted to colors once per frame
    #[default]
    Indexed,
    /// Packed colors written directly
    Direct,
}

/// Renderer settings, loadable from JSON. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// 1, 2, 4 or 8; checked by `Renderer::new`
    pub upscale: u32,
    pub width: u32,
    pub height: u32,
    pub storage: StorageMode,
    pub backend: Backend,
    pub line_algorithm: LineAlgorithm,
    /// Palette index 0 and the clear color
    pub background: Color,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            upscale: 8,
            width: 100,
            height: 100,
            storage: StorageMode::Indexed,
            backend: Backend::Auto,
            line_algorithm: LineAlgorithm::Bresenham,
            background: Color::BLACK,
        }
    }
}

impl RendererConfig {
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }

    /// Load config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let json = fs::read_to_string(path).map_err(|e| e.to_string())?;
        Self::from_json(&json)
    }

    /// Save config to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = RendererConfig::from_json(r#"{ "upscale": 4, "storage": "direct" }"#).unwrap();
        assert_eq!(config.upscale, 4);
        assert_eq!(config.storage, StorageMode::Direct);
        assert_eq!(config.width, 100);
        assert_eq!(config.backend, Backend::Auto);
    }

    #[test]
    fn test_enum_spelling() {
        let config = RendererConfig::from_json(
            r#"{ "backend": "scalar", "line_algorithm": "parametric",
                 "background": { "r": 1, "g": 2, "b": 3, "a": 255 } }"#,
        )
        .unwrap();
        assert_eq!(config.backend, Backend::Scalar);
        assert_eq!(config.line_algorithm, LineAlgorithm::Parametric);
        assert_eq!(config.background, Color::rgb(1, 2, 3));
        assert!(RendererConfig::from_json(r#"{ "backend": "gpu" }"#).is_err());
    }

    #[test]
    fn test_save_load_file() {
        let path = std::env::temp_dir().join(format!("lumino-config-{}.json", std::process::id()));
        let config = RendererConfig {
            upscale: 2,
            width: 160,
            height: 120,
            ..RendererConfig::default()
        };
        config.save(&path).unwrap();
        let loaded = RendererConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        assert!(RendererConfig::load("/nonexistent/lumino.json").is_err());
    }
}

//! User settings persistence.
//!
//! Creation defaults (price, stock, background and product mode) survive
//! between sessions as JSON in the user's config directory.

use crate::error::Result;
use crate::product::{MaterializationMode, Pricing};
use crate::session::BackgroundSpec;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default price of a new product.
pub const DEFAULT_PRICE: f64 = 599.90;

/// Default stock of a new product.
pub const DEFAULT_STOCK: u32 = 100;

/// User-configurable settings persisted between sessions.
///
/// Stored as JSON under the platform config directory
/// (e.g. `~/.config/design-studio/settings.json` on Linux).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Price applied to newly created products.
    pub price: f64,
    /// Stock applied to newly created products.
    pub stock: u32,
    /// Background of a fresh session.
    pub background: BackgroundSpec,
    /// Product mode preselected in the create dialog.
    pub mode: MaterializationMode,
}

impl Settings {
    /// Returns the path to the settings file.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "design-studio", "design-studio").map(|dirs| {
            let config_dir = dirs.config_dir();
            if !config_dir.exists() {
                let _ = fs::create_dir_all(config_dir);
            }
            config_dir.join("settings.json")
        })
    }

    /// Loads settings from the user's config directory, falling back to
    /// defaults if the file is missing or malformed.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Loads settings from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed settings file, using defaults");
                Self::default()
            }
        }
    }

    /// Persists settings to the user's config directory.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    /// Persists settings to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn pricing(&self) -> Pricing {
        Pricing {
            price: self.price,
            stock: self.stock,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            price: DEFAULT_PRICE,
            stock: DEFAULT_STOCK,
            background: BackgroundSpec::WHITE,
            mode: MaterializationMode::Single,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            price: 249.5,
            stock: 12,
            background: BackgroundSpec::Transparent,
            mode: MaterializationMode::MultiBatch,
        };

        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);

        let json = fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"multi-batch\""));
        assert!(json.contains("\"transparent\""));
    }

    #[test]
    fn missing_or_malformed_files_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(Settings::load_from(&path), Settings::default());

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn partial_files_keep_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "stock": 5 }"#).unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.stock, 5);
        assert_eq!(settings.price, DEFAULT_PRICE);
        assert_eq!(settings.background, BackgroundSpec::WHITE);
        assert_eq!(settings.pricing(), Pricing { price: DEFAULT_PRICE, stock: 5 });
    }
}

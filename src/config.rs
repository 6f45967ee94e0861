//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! calendar-config.toml file. It covers the panel geometry, the photo folder,
//! rendering options and the panel's network settings.

use crate::dither::DitherMethod;
use crate::error::CalendarError;
use crate::protocol::MAX_CHUNK_CHARS;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name
pub const CONFIG_FILE: &str = "calendar-config.toml";

/// Application configuration loaded from calendar-config.toml
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Panel geometry
    pub panel: PanelConfig,
    /// Background photo source
    pub photos: PhotoConfig,
    /// Rendering options
    pub render: RenderConfig,
    /// Panel network settings
    pub device: DeviceConfig,
}

/// Panel geometry in pixels
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct PanelConfig {
    pub width: u32,
    pub height: u32,
    /// Space reserved above and left of the hour grid for labels
    pub margin: u32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct PhotoConfig {
    /// Folder holding the weekly background photos
    pub dir: PathBuf,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    pub dithering: DitherMethod,
    /// Mono font for event text and hour labels (e.g. "6x12")
    pub font: String,
    /// Mono font for the day headers
    pub header_font: String,
    /// Hour after which Friday switches to the photo view.
    /// Compared against the caller's clock, not the events' time zone.
    /// Values of 24 or more disable the cutoff.
    pub after_hours_cutoff: u32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// IP address or host name of the panel
    pub address: String,
    /// Maximum encoded characters per LOAD_ request
    pub chunk_chars: usize,
    /// Pixel level treated as background when packing bits
    pub background_value: u8,
    pub init_timeout_secs: u64,
    pub chunk_timeout_secs: u64,
    pub show_timeout_secs: u64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            width: 800,
            height: 480,
            margin: 50,
        }
    }
}

impl Default for PhotoConfig {
    fn default() -> Self {
        PhotoConfig {
            dir: PathBuf::from("./photos"),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            dithering: DitherMethod::Atkinson,
            font: "6x12".to_string(),
            header_font: "9x15-bold".to_string(),
            after_hours_cutoff: 18,
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            address: "192.168.1.159".to_string(),
            chunk_chars: 1000,
            background_value: 0,
            init_timeout_secs: 5,
            chunk_timeout_secs: 9,
            show_timeout_secs: 8,
        }
    }
}

impl DeviceConfig {
    pub fn init_timeout(&self) -> Duration {
        Duration::from_secs(self.init_timeout_secs)
    }

    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_secs(self.chunk_timeout_secs)
    }

    pub fn show_timeout(&self) -> Duration {
        Duration::from_secs(self.show_timeout_secs)
    }
}

impl Config {
    /// Load configuration from calendar-config.toml in the working directory
    pub fn load() -> Result<Self, CalendarError> {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path.
    ///
    /// A missing file yields the defaults; a malformed or out-of-range file
    /// is an error so nothing gets rendered with half-applied settings.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, CalendarError> {
        let path = path.as_ref();
        let config = match fs::read_to_string(path) {
            Ok(contents) => {
                let config = toml::from_str::<Config>(&contents)
                    .map_err(|e| CalendarError::Config(format!("{}: {}", path.display(), e)))?;
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(
                    "No config file at {}, using default configuration",
                    path.display()
                );
                Self::default()
            }
            Err(e) => {
                return Err(CalendarError::Config(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the renderer or the transfer cannot work with
    pub fn validate(&self) -> Result<(), CalendarError> {
        let panel = &self.panel;
        if panel.width == 0 || panel.height == 0 {
            return Err(CalendarError::Config(format!(
                "panel size {}x{} is empty",
                panel.width, panel.height
            )));
        }
        // The weekday photo is inset 10 px from the grid interior
        if panel.margin + 10 >= panel.width || panel.margin >= panel.height {
            return Err(CalendarError::Config(format!(
                "margin {} leaves no room for the grid on a {}x{} panel",
                panel.margin, panel.width, panel.height
            )));
        }
        if self.device.chunk_chars < 2 {
            return Err(CalendarError::Config(format!(
                "chunk_chars {} cannot hold a single encoded byte",
                self.device.chunk_chars
            )));
        }
        if self.device.chunk_chars > MAX_CHUNK_CHARS {
            return Err(CalendarError::Config(format!(
                "chunk_chars {} exceeds the panel limit of {}",
                self.device.chunk_chars, MAX_CHUNK_CHARS
            )));
        }
        if self.device.background_value > 1 {
            return Err(CalendarError::Config(format!(
                "background_value {} is not a 1-bit level",
                self.device.background_value
            )));
        }
        Ok(())
    }

    /// Save current configuration as pretty TOML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CalendarError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| CalendarError::Config(e.to_string()))?;
        fs::write(path.as_ref(), contents)
            .map_err(|e| CalendarError::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.panel.width, 800);
        assert_eq!(config.panel.height, 480);
        assert_eq!(config.render.dithering, DitherMethod::Atkinson);
        assert_eq!(config.render.after_hours_cutoff, 18);
        assert_eq!(config.device.chunk_chars, 1000);
        assert_eq!(config.device.background_value, 0);
        assert_eq!(config.device.init_timeout(), Duration::from_secs(5));
        assert_eq!(config.device.chunk_timeout(), Duration::from_secs(9));
        assert_eq!(config.device.show_timeout(), Duration::from_secs(8));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.device.address, parsed.device.address);
        assert_eq!(config.photos.dir, parsed.photos.dir);
        assert_eq!(config.render.font, parsed.render.font);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path").unwrap();
        assert_eq!(config.device.address, "192.168.1.159");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            "[render]\ndithering = \"floyd-steinberg\"\n\n[device]\naddress = \"10.0.0.7\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(file.path()).unwrap();
        assert_eq!(config.render.dithering, DitherMethod::FloydSteinberg);
        assert_eq!(config.device.address, "10.0.0.7");
        assert_eq!(config.device.chunk_chars, 1000);
        assert_eq!(config.panel.margin, 50);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "[panel\nwidth = ").unwrap();
        assert!(matches!(
            Config::load_from_path(file.path()),
            Err(CalendarError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_unusable_values() {
        let mut config = Config::default();
        config.device.chunk_chars = 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.panel.margin = 800;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.device.background_value = 3;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.device.chunk_chars = 1001;
        assert!(matches!(config.validate(), Err(CalendarError::Config(_))));
        config.device.chunk_chars = 70_000;
        assert!(config.validate().is_err());
        config.device.chunk_chars = 1000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_then_load() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.device.address = "panel.local".to_string();
        config.save(file.path()).unwrap();

        let loaded = Config::load_from_path(file.path()).unwrap();
        assert_eq!(loaded.device.address, "panel.local");
    }
}

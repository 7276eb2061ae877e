use serde::Deserialize;
use std::fs;

/// Top-level configuration for segclock
#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub surface: SurfaceConfig,
}

/// Clock behaviour
#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    /// Output to show the clock on (default: first enumerated output)
    pub monitor: Option<String>,

    /// Frame ticks per second (default: 30)
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Skip frames whose second is already on screen (default: true)
    #[serde(default = "default_true")]
    pub skip_unchanged: bool,

    /// Keep the compositor's idle screensaver/lock away while running
    #[serde(default = "default_true")]
    pub suspend_screensaver: bool,
}

/// Layer surface settings
#[derive(Debug, Deserialize, Clone)]
pub struct SurfaceConfig {
    /// Layer-shell namespace, shown by compositors as the window title
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

pub const MIN_FPS: u32 = 1;
pub const MAX_FPS: u32 = 240;

// Default value functions
fn default_fps() -> u32 {
    30
}
fn default_true() -> bool {
    true
}
fn default_namespace() -> String {
    "Timer".to_string()
}

impl GeneralConfig {
    /// Frame rate clamped to the supported range
    pub fn effective_fps(&self) -> u32 {
        self.fps.clamp(MIN_FPS, MAX_FPS)
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            monitor: None,
            fps: default_fps(),
            skip_unchanged: true,
            suspend_screensaver: true,
        }
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.general.monitor, None);
        assert_eq!(config.general.fps, 30);
        assert!(config.general.skip_unchanged);
        assert!(config.general.suspend_screensaver);
        assert_eq!(config.surface.namespace, "Timer");
    }

    #[test]
    fn explicit_values() {
        let config: Config = toml::from_str(
            r#"
            [general]
            monitor = "DP-1"
            fps = 5
            skip_unchanged = false
            suspend_screensaver = false

            [surface]
            namespace = "clock"
            "#,
        )
        .unwrap();
        assert_eq!(config.general.monitor.as_deref(), Some("DP-1"));
        assert_eq!(config.general.effective_fps(), 5);
        assert!(!config.general.skip_unchanged);
        assert!(!config.general.suspend_screensaver);
        assert_eq!(config.surface.namespace, "clock");
    }

    #[test]
    fn fps_is_clamped() {
        let config: Config = toml::from_str(
            r#"
            [general]
            fps = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.general.effective_fps(), MIN_FPS);

        let config: Config = toml::from_str(
            r#"
            [general]
            fps = 1000
            "#,
        )
        .unwrap();
        assert_eq!(config.general.effective_fps(), MAX_FPS);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::load("/nonexistent/segclock.toml").is_err());
    }
}

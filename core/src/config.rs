use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WatchError};
use crate::theme::Theme;

/// Runtime settings for a watch session, read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How long to wait for the player component to come up.
    pub component_timeout_ms: u64,
    /// How long to wait for playback to start once the component is up.
    pub startup_timeout_ms: u64,
    pub toast_duration_ms: u64,
    /// Display time for transport feedback (volume, mute, speed).
    pub short_toast_ms: u64,
    /// Delay before navigating to an external-player target that may have been blocked.
    pub launch_fallback_ms: u64,
    pub seek_step_secs: f64,
    /// Seek step used while Shift is held.
    pub fine_seek_step_secs: f64,
    pub volume_step: f64,
    pub theme: Theme,
    pub autoplay: bool,
    pub mpv_path: String,
    pub download_dir: Option<PathBuf>,
    pub speeds: Vec<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            component_timeout_ms: 10_000,
            startup_timeout_ms: 15_000,
            toast_duration_ms: 3_000,
            short_toast_ms: 1_500,
            launch_fallback_ms: 300,
            seek_step_secs: 10.0,
            fine_seek_step_secs: 5.0,
            volume_step: 0.1,
            theme: Theme::Dark,
            autoplay: true,
            mpv_path: "mpv".to_string(),
            download_dir: None,
            speeds: vec![0.5, 0.75, 1.0, 1.25, 1.5, 2.0],
        }
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/watchlink/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("watchlink").join("config.toml"))
    }

    /// Load from `path`, or from the default location when `None`.
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(p) => p,
            None => return Ok(Self::default()),
        };

        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path)?;
        let config = Self::from_toml(&text).map_err(|e| match e {
            WatchError::Config(msg) => WatchError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| WatchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| WatchError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.volume_step) || self.volume_step == 0.0 {
            return Err(WatchError::Config(format!("volume_step must be in (0, 1], got {}", self.volume_step)));
        }
        if self.seek_step_secs <= 0.0 || self.fine_seek_step_secs <= 0.0 {
            return Err(WatchError::Config("seek steps must be positive".into()));
        }
        if self.speeds.iter().any(|s| *s <= 0.0 || s.is_nan()) {
            return Err(WatchError::Config("speeds must be positive".into()));
        }
        Ok(())
    }

    pub fn component_timeout(&self) -> Duration {
        Duration::from_millis(self.component_timeout_ms)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    pub fn short_toast(&self) -> Duration {
        Duration::from_millis(self.short_toast_ms)
    }

    pub fn launch_fallback(&self) -> Duration {
        Duration::from_millis(self.launch_fallback_ms)
    }

    /// Configured download directory, else the system one, else the working directory.
    pub fn resolved_download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

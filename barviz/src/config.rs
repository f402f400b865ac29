use std::{
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use barviz_audio::{AnalyserConfig, DemoConfig};
use barviz_renderer::RenderConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

const MIN_FFT_SIZE: usize = 32;
const MAX_FFT_SIZE: usize = 32768;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Couldn't read the config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Couldn't write the config file '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    #[error("`fft_size` has to be a power of two between 32 and 32768 (got {0})")]
    InvalidFftSize(usize),

    #[error("The config needs at least one entry in `[[views]]`")]
    NoViews,
}

/// The `[capture]` table: how the microphone is read and analysed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Name of the input device. Uses the default input device if not set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    pub fft_size: usize,
    pub smoothing: f32,
    pub min_decibels: f32,
    /// Milliseconds between two demo frames.
    pub demo_interval_ms: u64,
    /// Values per demo frame.
    pub demo_len: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        let analyser = AnalyserConfig::default();
        let demo = DemoConfig::default();

        Self {
            device: None,
            fft_size: analyser.fft_size,
            smoothing: analyser.smoothing_time_constant,
            min_decibels: analyser.min_decibels,
            demo_interval_ms: demo.interval.as_millis() as u64,
            demo_len: demo.frame_len,
        }
    }
}

impl CaptureConfig {
    pub fn analyser_config(&self) -> AnalyserConfig {
        AnalyserConfig {
            fft_size: self.fft_size,
            smoothing_time_constant: self.smoothing.clamp(0., 1.),
            min_decibels: self.min_decibels,
        }
    }

    pub fn demo_config(&self) -> DemoConfig {
        DemoConfig {
            interval: Duration::from_millis(self.demo_interval_ms.max(1)),
            frame_len: self.demo_len,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub capture: CaptureConfig,
    /// Each entry is drawn as its own bar chart. They're stacked from top to bottom.
    pub views: Vec<RenderConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            views: vec![RenderConfig::default()],
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fft_size = self.capture.fft_size;
        if !fft_size.is_power_of_two() || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&fft_size) {
            return Err(ConfigError::InvalidFftSize(fft_size));
        }

        if self.views.is_empty() {
            return Err(ConfigError::NoViews);
        }

        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let string = toml::to_string(self)?;

        std::fs::write(path, string).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Size of the window which fits all views.
    pub fn window_size(&self) -> (u32, u32) {
        let width = self.views.iter().map(|view| view.width).max().unwrap_or(0);
        let height = self.views.iter().map(|view| view.height).sum();

        (width, height)
    }
}

/// Reads and validates the config file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config: AppConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    config.validate()?;
    Ok(config)
}

/// Same as [load] but writes the default config to `path` first if it doesn't exist yet.
pub fn load_or_create(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        info!("Creating default config at '{}'", path.display());

        let config = AppConfig::default();
        config.save(path)?;
        return Ok(config);
    }

    load(path)
}

/// Notices changes of the config file by comparing its modification time.
pub struct ConfigWatcher {
    path: PathBuf,
    last_mtime: Option<SystemTime>,
}

impl ConfigWatcher {
    pub fn new(path: PathBuf) -> Self {
        let last_mtime = mtime(&path);
        Self { path, last_mtime }
    }

    /// Reloads the config if the file changed since the last call.
    pub fn reload_if_modified(&mut self) -> Option<Result<AppConfig, ConfigError>> {
        let current_mtime = mtime(&self.path);

        if current_mtime == self.last_mtime {
            return None;
        }

        self.last_mtime = current_mtime;
        Some(load(&self.path))
    }
}

fn mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).ok().and_then(|m| m.modified().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn multiple_views() {
        let config: AppConfig = toml::from_str(
            r#"
            [capture]
            smoothing = 0.5

            [[views]]
            width = 1200
            height = 300
            bar_width = 20
            color = "orange"

            [[views]]
            demo_mode = true
            "#,
        )
        .unwrap();

        assert_eq!(config.capture.smoothing, 0.5);
        assert_eq!(config.capture.fft_size, 256);
        assert_eq!(config.views.len(), 2);
        assert!(config.views[1].demo_mode);
        assert_eq!(config.window_size(), (1200, 400));
    }

    #[test]
    fn fft_size_has_to_be_a_power_of_two() {
        let mut config = AppConfig::default();

        config.capture.fft_size = 100;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidFftSize(100))));

        config.capture.fft_size = 16;
        assert!(config.validate().is_err());

        config.capture.fft_size = 2048;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn views_are_required() {
        let config = AppConfig {
            views: Vec::new(),
            ..Default::default()
        };

        assert!(matches!(config.validate(), Err(ConfigError::NoViews)));
    }

    #[test]
    fn default_config_is_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let created = load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(load(&path).unwrap(), created);
    }

    #[test]
    fn invalid_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "views = 3").unwrap();

        assert!(matches!(load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn watcher_ignores_unchanged_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        AppConfig::default().save(&path).unwrap();

        let mut watcher = ConfigWatcher::new(path.clone());
        assert!(watcher.reload_if_modified().is_none());
    }

    #[test]
    fn watcher_reloads_modified_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        AppConfig::default().save(&path).unwrap();

        let mut watcher = ConfigWatcher::new(path.clone());

        std::fs::write(&path, "[capture]\nsmoothing = 0.5\n").unwrap();
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(5))
            .unwrap();

        let reloaded = watcher.reload_if_modified().unwrap().unwrap();
        assert_eq!(reloaded.capture.smoothing, 0.5);
        assert!(watcher.reload_if_modified().is_none());
    }
}

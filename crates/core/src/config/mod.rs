use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub stage: StageConfig,
    pub launch: LaunchConfig,
    pub trails: TrailConfig,
    /// Seed for particle placement. Random when unset.
    pub seed: Option<u64>,
}

impl AppConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

/// Size of the drawing surface in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 600.0,
        }
    }
}

/// Pacing and sizing of the per-period particle launches. Times are in
/// milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    pub max_particles_per_period: f64,
    pub fps: f64,
    pub window_ms: f64,
    pub base_flight_ms: f64,
    pub period_delay_ms: f64,
    pub spawn_radius: f64,
    pub gauge_width: f64,
    pub date_fade_ms: f64,
}

impl LaunchConfig {
    /// Particles launched per added or deleted line.
    pub fn density(&self) -> f64 {
        self.max_particles_per_period / self.fps / 1000.0
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            max_particles_per_period: 300.0,
            fps: 60.0,
            window_ms: 2000.0,
            base_flight_ms: 1000.0,
            period_delay_ms: 3500.0,
            spawn_radius: 1200.0,
            gauge_width: 1000.0,
            date_fade_ms: 3500.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    pub enabled: bool,
    pub alpha: f64,
    /// Alpha lost per frame.
    pub decay: f64,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            alpha: 0.5,
            decay: 0.005,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert!((config.launch.density() - 0.005).abs() < 1e-12);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            seed = 42

            [launch]
            period_delay_ms = 1000.0

            [trails]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, Some(42));
        assert_eq!(config.launch.period_delay_ms, 1000.0);
        assert_eq!(config.launch.window_ms, 2000.0);
        assert!(!config.trails.enabled);
        assert_eq!(config.trails.decay, 0.005);
        assert_eq!(config.stage.width, 1024.0);
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(AppConfig::from_toml_str("[stage]\nwidth = \"wide\"").is_err());
    }
}

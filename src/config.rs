//! Configuration for the presence monitor.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Main configuration for the monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Thresholds and windows used by the per-frame analysis
    pub analyzer: AnalyzerConfig,

    /// Path for exporting session summaries
    pub export_path: PathBuf,

    /// Path for storing transparency stats
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("presence-monitor");

        Self {
            analyzer: AnalyzerConfig::default(),
            export_path: data_dir.join("exports"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file, falling back to defaults
    /// when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content).map_err(ConfigError::Parse)?;
        config.analyzer.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("presence-monitor")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)?;
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }
}

/// Heuristic constants for the analysis pipeline.
///
/// None of these are calibrated against ground-truth head pose data. They are
/// kept configurable so a deployment can tune them for its camera setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Gain turning normalized nose offset into pseudo-degrees of yaw/pitch
    pub pose_gain: f64,
    /// Yaw and pitch must both be under this for good eye contact
    pub good_gaze_deg: f64,
    /// Yaw or pitch over this counts as looking away
    pub away_gaze_deg: f64,
    /// Torso tilt above this is slouching
    pub slouch_threshold_deg: f64,
    /// How long the subject may look away before being told to look back
    pub look_away_grace_secs: f64,
    /// How long the face may be missing before the subject counts as absent
    pub absence_grace_secs: f64,
    /// Frames averaged by each smoothing window
    pub window_capacity: usize,
    /// Feedback lines shown when metrics are rendered
    pub feedback_display_limit: usize,
    /// Eye openness ratio below which the eyes count as closed
    pub blink_ratio_threshold: f64,
    /// Span over which blinks are counted
    pub blink_window_secs: f64,
    /// Blinks per second above which the subject appears nervous
    pub nervous_blink_rate: f64,
    /// Frame time between periodic session summaries
    #[serde(with = "duration_serde")]
    pub summary_interval: Duration,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            pose_gain: 50.0,
            good_gaze_deg: 15.0,
            away_gaze_deg: 30.0,
            slouch_threshold_deg: 20.0,
            look_away_grace_secs: 2.0,
            absence_grace_secs: 3.0,
            window_capacity: 10,
            feedback_display_limit: 3,
            blink_ratio_threshold: 0.018,
            blink_window_secs: 5.0,
            nervous_blink_rate: 0.35,
            summary_interval: Duration::from_secs(10),
        }
    }
}

impl AnalyzerConfig {
    /// Reject settings the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_capacity == 0 {
            return Err(ConfigError::Invalid(
                "window_capacity must be at least 1".to_string(),
            ));
        }
        if self.pose_gain.is_nan() || self.pose_gain <= 0.0 {
            return Err(ConfigError::Invalid("pose_gain must be positive".to_string()));
        }
        if self.good_gaze_deg > self.away_gaze_deg {
            return Err(ConfigError::Invalid(format!(
                "good_gaze_deg ({}) exceeds away_gaze_deg ({})",
                self.good_gaze_deg, self.away_gaze_deg
            )));
        }
        if !(self.blink_window_secs.is_finite() && self.blink_window_secs > 0.0) {
            return Err(ConfigError::Invalid(
                "blink_window_secs must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("good_gaze_deg", self.good_gaze_deg),
            ("away_gaze_deg", self.away_gaze_deg),
            ("slouch_threshold_deg", self.slouch_threshold_deg),
            ("look_away_grace_secs", self.look_away_grace_secs),
            ("absence_grace_secs", self.absence_grace_secs),
            ("blink_ratio_threshold", self.blink_ratio_threshold),
            ("nervous_blink_rate", self.nervous_blink_rate),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(serde_json::Error),
    #[error("Serialize error: {0}")]
    Serialize(serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

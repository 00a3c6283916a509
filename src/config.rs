use crate::common::PointF3D;
use crate::error::AppError;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "REPCOUNT";
// Camera rate ceiling; also keeps the capture interval above zero.
pub const MAX_TARGET_FPS: u32 = 1000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub scheduler: SchedulerConfig,
    pub classifier: ClassifierConfig,
    pub smoothing: SmoothingConfig,
    pub counter: CounterConfig,
    pub samples: SampleSourceConfig,
    /// Classes that get a repetition counter, in reporting priority order.
    pub pose_classes: Vec<String>,
    /// Stream mode enables smoothing and repetition counting.
    pub stream_mode: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            classifier: ClassifierConfig::default(),
            smoothing: SmoothingConfig::default(),
            counter: CounterConfig::default(),
            samples: SampleSourceConfig::default(),
            pose_classes: vec!["pushups_down".to_string(), "squats_down".to_string()],
            stream_mode: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub buffer_count: usize,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Bits per pixel of the camera preview format (NV21 is 12).
    pub bits_per_pixel: u32,
    pub rotation_degrees: u32,
    pub target_fps: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            buffer_count: 4,
            frame_width: 640,
            frame_height: 480,
            bits_per_pixel: 12,
            rotation_degrees: 0,
            target_fps: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub max_distance_top_k: usize,
    pub mean_distance_top_k: usize,
    // Z is less accurate than X & Y, so it gets a lower weight.
    pub axes_weights: PointF3D,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_distance_top_k: 30,
            mean_distance_top_k: 10,
            axes_weights: PointF3D::new(1.0, 1.0, 0.2),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub window_size: usize,
    pub alpha: f32,
    pub reset_threshold_ms: u64,
}

impl SmoothingConfig {
    pub fn reset_threshold(&self) -> Duration {
        Duration::from_millis(self.reset_threshold_ms)
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            alpha: 0.2,
            reset_threshold_ms: 100,
        }
    }
}

/// Enter/exit thresholds as fractions of the classifier confidence range.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    pub enter_threshold: f32,
    pub exit_threshold: f32,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            enter_threshold: 0.9,
            exit_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SampleSourceConfig {
    pub path: PathBuf,
    pub separator: String,
}

impl Default for SampleSourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("pose/fitness_pose_samples.csv"),
            separator: ",".to_string(),
        }
    }
}

impl Configuration {
    /// Loads defaults, then the optional file, then `REPCOUNT__*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let configuration: Configuration = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let invalid = |message: &str| Err(AppError::InvalidConfiguration(message.to_string()));

        if self.scheduler.buffer_count == 0 {
            return invalid("Frame buffer count must be greater than 0");
        }
        if self.scheduler.frame_width == 0 || self.scheduler.frame_height == 0 {
            return invalid("Frame dimensions must be greater than 0");
        }
        if self.scheduler.target_fps == 0 || self.scheduler.target_fps > MAX_TARGET_FPS {
            return invalid("Target FPS must be between 1 and 1000");
        }
        if self.classifier.max_distance_top_k == 0 || self.classifier.mean_distance_top_k == 0 {
            return invalid("Classifier top-k values must be greater than 0");
        }
        if self.smoothing.window_size == 0 {
            return invalid("Smoothing window size must be greater than 0");
        }
        if !(self.smoothing.alpha > 0.0 && self.smoothing.alpha <= 1.0) {
            return invalid("Smoothing alpha must be in (0.0, 1.0]");
        }
        let CounterConfig {
            enter_threshold,
            exit_threshold,
        } = self.counter;
        if !(0.0..=1.0).contains(&enter_threshold) || !(0.0..=1.0).contains(&exit_threshold) {
            return invalid("Counter thresholds must be between 0.0 and 1.0");
        }
        if exit_threshold >= enter_threshold {
            return invalid("Counter exit threshold must be below the enter threshold");
        }
        if self.samples.separator.is_empty() {
            return invalid("Sample separator must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration_is_valid() {
        let configuration = Configuration::default();
        assert!(configuration.validate().is_ok());
        assert_eq!(configuration.smoothing.reset_threshold(), Duration::from_millis(100));
        assert_eq!(configuration.classifier.axes_weights.z, 0.2);
        assert_eq!(configuration.pose_classes, vec!["pushups_down", "squats_down"]);
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let mut configuration = Configuration::default();
        configuration.counter = CounterConfig {
            enter_threshold: 0.5,
            exit_threshold: 0.7,
        };
        assert!(matches!(
            configuration.validate(),
            Err(AppError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_alpha_and_sizes() {
        let mut configuration = Configuration::default();
        configuration.smoothing.alpha = 0.0;
        assert!(configuration.validate().is_err());

        let mut configuration = Configuration::default();
        configuration.classifier.mean_distance_top_k = 0;
        assert!(configuration.validate().is_err());

        let mut configuration = Configuration::default();
        configuration.scheduler.buffer_count = 0;
        assert!(configuration.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_target_fps() {
        let mut configuration = Configuration::default();
        configuration.scheduler.target_fps = MAX_TARGET_FPS;
        assert!(configuration.validate().is_ok());

        configuration.scheduler.target_fps = 2_000_000_000;
        assert!(matches!(
            configuration.validate(),
            Err(AppError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let configuration = Configuration::load(None).expect("defaults should load");
        assert_eq!(configuration.scheduler.buffer_count, 4);
        assert_eq!(configuration.smoothing.window_size, 10);
        assert!(configuration.stream_mode);
    }
}

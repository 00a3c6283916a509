use crate::config::SmoothingConfig;
use crate::pipeline::classification::classification_result::ClassificationResult;
use indexmap::IndexSet;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Runs EMA smoothing over a window of classification results.
pub struct EmaSmoothing {
    window_size: usize,
    alpha: f32,
    reset_threshold: Duration,
    // Most recent result first.
    window: VecDeque<ClassificationResult>,
    last_input: Option<Instant>,
}

impl EmaSmoothing {
    pub fn new(config: &SmoothingConfig) -> Self {
        Self {
            window_size: config.window_size,
            alpha: config.alpha,
            reset_threshold: config.reset_threshold(),
            window: VecDeque::with_capacity(config.window_size),
            last_input: None,
        }
    }

    pub fn smooth(&mut self, result: ClassificationResult) -> ClassificationResult {
        self.smooth_at(result, Instant::now())
    }

    pub fn smooth_at(&mut self, result: ClassificationResult, now: Instant) -> ClassificationResult {
        // Forget the window if the input is too far from the previous one in time.
        if let Some(last_input) = self.last_input {
            if now.saturating_duration_since(last_input) > self.reset_threshold {
                self.window.clear();
            }
        }
        self.last_input = Some(now);

        if self.window.len() == self.window_size {
            self.window.pop_back();
        }
        self.window.push_front(result);

        let all_classes: IndexSet<&str> = self
            .window
            .iter()
            .flat_map(|result| result.all_classes())
            .collect();

        let mut smoothed = ClassificationResult::new();
        for class_name in all_classes {
            let mut factor = 1.0f32;
            let mut top_sum = 0.0f32;
            let mut bottom_sum = 0.0f32;
            for result in &self.window {
                top_sum += factor * result.class_confidence(class_name);
                bottom_sum += factor;
                factor *= 1.0 - self.alpha;
            }
            smoothed.put_class_confidence(class_name, top_sum / bottom_sum);
        }
        smoothed
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }
}

impl Default for EmaSmoothing {
    fn default() -> Self {
        Self::new(&SmoothingConfig::default())
    }
}

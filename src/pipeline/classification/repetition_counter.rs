use crate::config::CounterConfig;
use crate::pipeline::classification::classification_result::ClassificationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterState {
    NotEntered,
    Entered,
}

/// Counts repetitions of one pose class.
///
/// A repetition is the class confidence rising to the enter threshold and
/// then falling to the exit threshold. Thresholds are fractions of the
/// classifier confidence range.
#[derive(Debug, Clone)]
pub struct RepetitionCounter {
    class_name: String,
    confidence_range: f32,
    enter_threshold: f32,
    exit_threshold: f32,
    state: CounterState,
    num_repeats: u32,
}

impl RepetitionCounter {
    pub fn new(class_name: impl Into<String>, confidence_range: usize, config: &CounterConfig) -> Self {
        Self {
            class_name: class_name.into(),
            confidence_range: confidence_range.max(1) as f32,
            enter_threshold: config.enter_threshold,
            exit_threshold: config.exit_threshold,
            state: CounterState::NotEntered,
            num_repeats: 0,
        }
    }

    /// Feeds one (smoothed) result and returns the repetition count.
    pub fn add_classification_result(&mut self, result: &ClassificationResult) -> u32 {
        let confidence = result.class_confidence(&self.class_name) / self.confidence_range;

        match self.state {
            CounterState::NotEntered if confidence >= self.enter_threshold => {
                self.state = CounterState::Entered;
            }
            CounterState::Entered if confidence <= self.exit_threshold => {
                self.state = CounterState::NotEntered;
                self.num_repeats += 1;
            }
            _ => {}
        }
        self.num_repeats
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn num_repeats(&self) -> u32 {
        self.num_repeats
    }

    pub fn state(&self) -> CounterState {
        self.state
    }
}

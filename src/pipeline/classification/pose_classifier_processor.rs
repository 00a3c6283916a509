use crate::common::PointF3D;
use crate::config::Configuration;
use crate::pipeline::classification::ema_smoothing::EmaSmoothing;
use crate::pipeline::classification::pose_classifier::PoseClassifier;
use crate::pipeline::classification::pose_sample::PoseSample;
use crate::pipeline::classification::repetition_counter::RepetitionCounter;

/// Smoothing and repetition state, only kept in stream mode.
struct StreamState {
    ema_smoothing: EmaSmoothing,
    rep_counters: Vec<RepetitionCounter>,
    last_rep_result: String,
}

/// Accepts a stream of poses for classification and repetition counting.
pub struct PoseClassifierProcessor {
    pose_classifier: PoseClassifier,
    stream: Option<StreamState>,
}

impl PoseClassifierProcessor {
    pub fn new(pose_samples: Vec<PoseSample>, configuration: &Configuration) -> Self {
        let pose_classifier = PoseClassifier::with_config(pose_samples, &configuration.classifier);
        let stream = configuration.stream_mode.then(|| StreamState {
            ema_smoothing: EmaSmoothing::new(&configuration.smoothing),
            rep_counters: configuration
                .pose_classes
                .iter()
                .map(|class_name| {
                    RepetitionCounter::new(
                        class_name.as_str(),
                        pose_classifier.confidence_range(),
                        &configuration.counter,
                    )
                })
                .collect(),
            last_rep_result: String::new(),
        });
        tracing::info!(
            "Pose classifier ready with {} samples, stream mode {}",
            pose_classifier.sample_count(),
            stream.is_some()
        );
        Self {
            pose_classifier,
            stream,
        }
    }

    /// Classifies one pose and returns up to two formatted lines:
    ///
    /// 0: `<class> : <n> reps` (stream mode only)
    /// 1: `<class> : <0.00-1.00> confidence` (only when a pose was found)
    pub fn pose_result(&mut self, landmarks: &[PointF3D]) -> Vec<String> {
        let mut lines = Vec::with_capacity(2);
        let mut classification = self.pose_classifier.classify(landmarks);
        let pose_found = !landmarks.is_empty();

        if let Some(stream) = self.stream.as_mut() {
            // Smoothing sees every frame, even without a pose, so old state decays.
            classification = stream.ema_smoothing.smooth(classification);

            if !pose_found {
                lines.push(stream.last_rep_result.clone());
                return lines;
            }

            for rep_counter in &mut stream.rep_counters {
                let reps_before = rep_counter.num_repeats();
                let reps_after = rep_counter.add_classification_result(&classification);
                if reps_after > reps_before {
                    tracing::info!("{} repetition {}", rep_counter.class_name(), reps_after);
                    stream.last_rep_result =
                        format!("{} : {} reps", rep_counter.class_name(), reps_after);
                    break;
                }
            }
            lines.push(stream.last_rep_result.clone());
        }

        if pose_found {
            if let Some(max_confidence_class) = classification.max_confidence_class() {
                let confidence = classification.class_confidence(max_confidence_class)
                    / self.pose_classifier.confidence_range() as f32;
                lines.push(format!(
                    "{} : {:.2} confidence",
                    max_confidence_class, confidence
                ));
            }
        }
        lines
    }

    pub fn repetition_counts(&self) -> Vec<(&str, u32)> {
        self.stream
            .iter()
            .flat_map(|stream| &stream.rep_counters)
            .map(|counter| (counter.class_name(), counter.num_repeats()))
            .collect()
    }

    pub fn confidence_range(&self) -> usize {
        self.pose_classifier.confidence_range()
    }
}

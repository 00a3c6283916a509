use crate::common::{PointF3D, Pose};
use crate::config::ClassifierConfig;
use crate::pipeline::classification::classification_result::ClassificationResult;
use crate::pipeline::classification::pose_embedding::pose_embedding;
use crate::pipeline::classification::pose_sample::PoseSample;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Classifies poses against labeled [`PoseSample`]s.
///
/// K-nearest neighbors with outlier filtering, in two stages:
///  * top-K samples by MAX per-vector distance, which drops samples that are
///    almost the same pose but with a few joints bent the other way;
///  * of those, top-K by MEAN distance.
///
/// Every surviving sample votes for its class. Poses are compared both as
/// given and mirrored horizontally, keeping the smaller distance.
pub struct PoseClassifier {
    pose_samples: Vec<PoseSample>,
    max_distance_top_k: usize,
    mean_distance_top_k: usize,
    axes_weights: PointF3D,
}

/// Heap entry ordered by distance, then by sample index so ties are stable.
#[derive(Debug, Clone, Copy)]
struct SampleDistance {
    distance: f32,
    sample: usize,
}

impl PartialEq for SampleDistance {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SampleDistance {}

impl PartialOrd for SampleDistance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SampleDistance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.sample.cmp(&other.sample))
    }
}

/// Keeps the `k` smallest entries: the heap top is the worst retained one.
fn push_bounded(heap: &mut BinaryHeap<SampleDistance>, entry: SampleDistance, k: usize) {
    heap.push(entry);
    if heap.len() > k {
        heap.pop();
    }
}

impl PoseClassifier {
    pub fn new(pose_samples: Vec<PoseSample>) -> Self {
        Self::with_config(pose_samples, &ClassifierConfig::default())
    }

    pub fn with_config(pose_samples: Vec<PoseSample>, config: &ClassifierConfig) -> Self {
        Self {
            pose_samples,
            max_distance_top_k: config.max_distance_top_k,
            mean_distance_top_k: config.mean_distance_top_k,
            axes_weights: config.axes_weights,
        }
    }

    /// Max range of confidence values.
    ///
    /// Confidence is the number of samples that survived both filters, so
    /// it can't exceed the smaller of the two top-K values.
    pub fn confidence_range(&self) -> usize {
        self.max_distance_top_k.min(self.mean_distance_top_k)
    }

    pub fn sample_count(&self) -> usize {
        self.pose_samples.len()
    }

    pub fn classify_pose(&self, pose: &Pose) -> ClassificationResult {
        self.classify(&pose.positions())
    }

    pub fn classify(&self, landmarks: &[PointF3D]) -> ClassificationResult {
        let mut result = ClassificationResult::new();
        if landmarks.is_empty() {
            return result;
        }

        let flipped_landmarks: Vec<PointF3D> = landmarks.iter().map(|p| p.mirrored()).collect();
        let (embedding, flipped_embedding) =
            match (pose_embedding(landmarks), pose_embedding(&flipped_landmarks)) {
                (Ok(embedding), Ok(flipped)) => (embedding, flipped),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::debug!("Pose can't be classified: {}", e);
                    return result;
                }
            };

        let mut max_distances = BinaryHeap::with_capacity(self.max_distance_top_k + 1);
        for (index, sample) in self.pose_samples.iter().enumerate() {
            let original = self.max_distance(&embedding, sample.embedding());
            let flipped = self.max_distance(&flipped_embedding, sample.embedding());
            push_bounded(
                &mut max_distances,
                SampleDistance {
                    distance: original.min(flipped),
                    sample: index,
                },
                self.max_distance_top_k,
            );
        }

        let denominator = (embedding.len() * 2) as f32;
        let mut mean_distances = BinaryHeap::with_capacity(self.mean_distance_top_k + 1);
        for retained in max_distances {
            let sample_embedding = self.pose_samples[retained.sample].embedding();
            let original = self.sum_distance(&embedding, sample_embedding);
            let flipped = self.sum_distance(&flipped_embedding, sample_embedding);
            push_bounded(
                &mut mean_distances,
                SampleDistance {
                    distance: original.min(flipped) / denominator,
                    sample: retained.sample,
                },
                self.mean_distance_top_k,
            );
        }

        for retained in mean_distances.into_sorted_vec() {
            result.increment_class_confidence(self.pose_samples[retained.sample].class_name());
        }
        result
    }

    fn max_distance(&self, embedding: &[PointF3D], sample: &[PointF3D]) -> f32 {
        embedding
            .iter()
            .zip(sample)
            .map(|(&e, &s)| (e - s).scale_axes(self.axes_weights).max_abs())
            .fold(0.0, f32::max)
    }

    fn sum_distance(&self, embedding: &[PointF3D], sample: &[PointF3D]) -> f32 {
        embedding
            .iter()
            .zip(sample)
            .map(|(&e, &s)| (e - s).scale_axes(self.axes_weights).sum_abs())
            .sum()
    }
}

pub mod classification_result;
pub mod ema_smoothing;
pub mod pose_classifier;
pub mod pose_classifier_processor;
pub mod pose_embedding;
pub mod pose_sample;
pub mod repetition_counter;

pub use classification_result::ClassificationResult;
pub use ema_smoothing::EmaSmoothing;
pub use pose_classifier::PoseClassifier;
pub use pose_classifier_processor::PoseClassifierProcessor;
pub use pose_embedding::{EMBEDDING_SIZE, pose_embedding};
pub use pose_sample::{PoseSample, load_pose_samples, load_pose_samples_from_path};
pub use repetition_counter::{CounterState, RepetitionCounter};

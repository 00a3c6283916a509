use crate::camera::FrameMetadata;
use crate::error::AppError;
use crate::pipeline::classification::PoseClassifierProcessor;
use crate::pipeline::landmark_source::LandmarkSource;
use crate::pipeline::result_sink::ResultSink;
use std::sync::Arc;

/// Processes one raw camera frame on the scheduler worker thread.
pub trait FrameProcessor: Send {
    fn process_frame(&mut self, data: &[u8], metadata: &FrameMetadata) -> Result<(), AppError>;
    fn name(&self) -> &'static str;

    /// Called when the processor is replaced or the pipeline shuts down.
    fn stop(&mut self) {}
}

/// Landmark detection followed by pose classification and repetition counting.
pub struct PosePipelineProcessor {
    landmark_source: Box<dyn LandmarkSource>,
    classifier: PoseClassifierProcessor,
    sink: Arc<dyn ResultSink>,
}

impl PosePipelineProcessor {
    pub fn new(
        landmark_source: Box<dyn LandmarkSource>,
        classifier: PoseClassifierProcessor,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            landmark_source,
            classifier,
            sink,
        }
    }

    pub fn classifier(&self) -> &PoseClassifierProcessor {
        &self.classifier
    }
}

impl FrameProcessor for PosePipelineProcessor {
    fn process_frame(&mut self, data: &[u8], metadata: &FrameMetadata) -> Result<(), AppError> {
        let pose = self.landmark_source.detect(data, metadata)?;
        let lines = self.classifier.pose_result(&pose.positions());
        self.sink.display(&lines);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "pose-classification"
    }

    fn stop(&mut self) {
        for (class_name, count) in self.classifier.repetition_counts() {
            tracing::info!("Final count for {}: {} reps", class_name, count);
        }
    }
}

pub mod classification;
pub mod frame_processor;
pub mod landmark_source;
pub mod processor_handle;
pub mod result_sink;

pub use frame_processor::{FrameProcessor, PosePipelineProcessor};
pub use landmark_source::{LandmarkSource, ReplayLandmarkSource};
pub use processor_handle::ProcessorHandle;
pub use result_sink::{LatestResultSink, ResultSink, TracingResultSink};

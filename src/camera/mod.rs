pub mod frame_buffer_pool;
pub mod frame_metadata;
pub mod frame_scheduler;

pub use frame_buffer_pool::{BufferId, FrameBuffer, FrameBufferPool};
pub use frame_metadata::{FrameMetadata, FrameMetadataBuilder};
pub use frame_scheduler::{FrameScheduler, SchedulerStats};

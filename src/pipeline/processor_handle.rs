use crate::pipeline::frame_processor::FrameProcessor;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared, lock-guarded frame processor.
///
/// The scheduler worker runs every frame under this lock, and mode switches
/// replace the processor under the same lock, so a frame is never processed
/// by a half-replaced processor.
#[derive(Clone)]
pub struct ProcessorHandle {
    inner: Arc<Mutex<Box<dyn FrameProcessor>>>,
}

impl ProcessorHandle {
    pub fn new(processor: Box<dyn FrameProcessor>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(processor)),
        }
    }

    pub fn with_processor<R>(&self, f: impl FnOnce(&mut dyn FrameProcessor) -> R) -> R {
        let mut guard = self.lock();
        f(guard.as_mut())
    }

    /// Swaps in a new processor, stopping the previous one.
    pub fn replace(&self, processor: Box<dyn FrameProcessor>) {
        let mut guard = self.lock();
        let previous = guard.name();
        guard.stop();
        *guard = processor;
        tracing::info!("Replaced frame processor {} with {}", previous, guard.name());
    }

    pub fn name(&self) -> &'static str {
        self.lock().name()
    }

    // A panic inside a processor poisons the lock; the processor itself is
    // still usable for the next frame.
    fn lock(&self) -> MutexGuard<'_, Box<dyn FrameProcessor>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

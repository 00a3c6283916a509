use crate::camera::frame_buffer_pool::{BufferId, FrameBuffer, FrameBufferPool};
use crate::camera::frame_metadata::FrameMetadata;
use crate::error::AppError;
use crate::pipeline::ProcessorHandle;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

const WORKER_THREAD_NAME: &str = "frame-processing";

/// Hands camera frames to a single processing thread, newest frame first.
///
/// While a frame is being processed, new frames may keep arriving. Only the
/// most recent one is held as pending; any older pending frame goes straight
/// back to the buffer pool. As soon as processing of the current frame ends,
/// the worker picks up the pending frame without waiting, so processing never
/// falls behind the camera.
pub struct FrameScheduler {
    shared: Arc<SharedState>,
    pool: Arc<FrameBufferPool>,
    processor: ProcessorHandle,
    metadata: FrameMetadata,
    worker: Mutex<Option<JoinHandle<()>>>,
}

struct SharedState {
    slot: Mutex<FrameSlot>,
    frame_available: Condvar,
    counters: Counters,
}

// Everything the producer and the worker exchange, guarded by one lock.
#[derive(Default)]
struct FrameSlot {
    active: bool,
    pending: Option<FrameBuffer>,
    known_buffers: HashSet<BufferId>,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicU64,
    dropped: AtomicU64,
    skipped: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
}

/// Snapshot of the scheduler counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub frames_submitted: u64,
    /// Pending frames replaced by a newer frame before processing.
    pub frames_dropped: u64,
    /// Frames refused because the scheduler was stopped or the buffer unknown.
    pub frames_skipped: u64,
    pub frames_processed: u64,
    pub frames_failed: u64,
}

impl SharedState {
    fn lock_slot(&self) -> MutexGuard<'_, FrameSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FrameScheduler {
    pub fn new(
        pool: Arc<FrameBufferPool>,
        processor: ProcessorHandle,
        metadata: FrameMetadata,
    ) -> Self {
        Self {
            shared: Arc::new(SharedState {
                slot: Mutex::new(FrameSlot::default()),
                frame_available: Condvar::new(),
                counters: Counters::default(),
            }),
            pool,
            processor,
            metadata,
            worker: Mutex::new(None),
        }
    }

    /// Spawns the processing thread. Starting a running scheduler does nothing.
    pub fn start(&self) -> Result<(), AppError> {
        let mut worker = self.worker_handle();
        if worker.is_some() {
            tracing::warn!("Frame scheduler is already running");
            return Ok(());
        }

        {
            let mut slot = self.shared.lock_slot();
            slot.active = true;
            slot.known_buffers.extend(self.pool.buffer_ids());
        }

        let shared = self.shared.clone();
        let pool = self.pool.clone();
        let processor = self.processor.clone();
        let metadata = self.metadata;
        let spawned = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(shared, pool, processor, metadata));

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                tracing::info!("Frame scheduler started");
                Ok(())
            }
            Err(e) => {
                let mut slot = self.shared.lock_slot();
                slot.active = false;
                slot.known_buffers.clear();
                Err(AppError::WorkerSpawn(e))
            }
        }
    }

    /// Stops the processing thread and waits for it to exit.
    ///
    /// Joining here guarantees that a following `start()` can't run two
    /// workers at once. Calling `stop()` again is harmless.
    pub fn stop(&self) {
        let mut worker = self.worker_handle();
        {
            let mut slot = self.shared.lock_slot();
            slot.active = false;
            self.shared.frame_available.notify_all();
        }

        if let Some(handle) = worker.take() {
            if handle.join().is_err() {
                tracing::error!("Frame processing thread panicked");
            }
            tracing::info!("Frame scheduler stopped");
        }

        let pending = {
            let mut slot = self.shared.lock_slot();
            // Release the buffer identities, they are no longer in use.
            slot.known_buffers.clear();
            slot.pending.take()
        };
        if let Some(frame) = pending {
            self.pool.release(frame);
        }
    }

    /// Offers a freshly captured frame. Never waits for processing.
    pub fn submit(&self, frame: FrameBuffer) {
        let counters = &self.shared.counters;
        counters.submitted.fetch_add(1, Ordering::Relaxed);

        let mut slot = self.shared.lock_slot();
        if !slot.active {
            drop(slot);
            counters.skipped.fetch_add(1, Ordering::Relaxed);
            self.pool.release(frame);
            return;
        }
        if !slot.known_buffers.contains(&frame.id()) {
            drop(slot);
            counters.skipped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                "Skipping frame. Could not find buffer {:?} among the camera buffers",
                frame.id()
            );
            return;
        }

        let stale = slot.pending.replace(frame);
        self.shared.frame_available.notify_one();
        drop(slot);

        if let Some(stale) = stale {
            counters.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("Dropping stale frame {:?}", stale.id());
            self.pool.release(stale);
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker_handle().is_some()
    }

    pub fn stats(&self) -> SchedulerStats {
        let counters = &self.shared.counters;
        SchedulerStats {
            frames_submitted: counters.submitted.load(Ordering::Relaxed),
            frames_dropped: counters.dropped.load(Ordering::Relaxed),
            frames_skipped: counters.skipped.load(Ordering::Relaxed),
            frames_processed: counters.processed.load(Ordering::Relaxed),
            frames_failed: counters.failed.load(Ordering::Relaxed),
        }
    }

    pub fn pool(&self) -> &Arc<FrameBufferPool> {
        &self.pool
    }

    pub fn processor(&self) -> &ProcessorHandle {
        &self.processor
    }

    fn worker_handle(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(
    shared: Arc<SharedState>,
    pool: Arc<FrameBufferPool>,
    processor: ProcessorHandle,
    metadata: FrameMetadata,
) {
    tracing::debug!("Frame processing loop started");
    loop {
        let frame = {
            let slot = shared.lock_slot();
            let mut slot = shared
                .frame_available
                .wait_while(slot, |slot| slot.active && slot.pending.is_none())
                .unwrap_or_else(PoisonError::into_inner);
            if !slot.active {
                break;
            }
            // Clear the slot so this buffer is not recycled while in use.
            match slot.pending.take() {
                Some(frame) => frame,
                None => continue,
            }
        };

        // Runs outside the slot lock so the camera can queue the next frame meanwhile.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            processor.with_processor(|processor| processor.process_frame(frame.data(), &metadata))
        }));
        match outcome {
            Ok(Ok(())) => {
                shared.counters.processed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                shared.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!("Error thrown from frame processor: {}", e);
            }
            Err(_) => {
                shared.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!("Frame processor panicked, frame {:?} discarded", frame.id());
            }
        }
        pool.release(frame);
    }
    tracing::debug!("Frame processing loop terminated");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FrameProcessor;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn wait_for(condition: impl Fn() -> bool) {
        let deadline = Instant::now() + TIMEOUT;
        while !condition() {
            assert!(Instant::now() < deadline, "timed out waiting for condition");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    fn frame_with(pool: &FrameBufferPool, marker: u8) -> FrameBuffer {
        let mut frame = pool.acquire().expect("free buffer");
        frame.data_mut()[0] = marker;
        frame
    }

    /// Records the first byte of every frame and blocks until released.
    struct GatedProcessor {
        seen: Arc<Mutex<Vec<u8>>>,
        started: mpsc::Sender<u8>,
        gate: mpsc::Receiver<()>,
        stopped: Arc<AtomicBool>,
    }

    impl FrameProcessor for GatedProcessor {
        fn process_frame(&mut self, data: &[u8], _metadata: &FrameMetadata) -> Result<(), AppError> {
            self.seen.lock().unwrap().push(data[0]);
            self.started.send(data[0]).unwrap();
            self.gate.recv_timeout(TIMEOUT).unwrap();
            Ok(())
        }

        fn name(&self) -> &'static str {
            "gated"
        }

        fn stop(&mut self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    /// Forwards the first byte of every frame.
    struct ForwardingProcessor {
        seen: mpsc::Sender<u8>,
    }

    impl FrameProcessor for ForwardingProcessor {
        fn process_frame(&mut self, data: &[u8], _metadata: &FrameMetadata) -> Result<(), AppError> {
            self.seen.send(data[0]).unwrap();
            Ok(())
        }

        fn name(&self) -> &'static str {
            "forwarding"
        }
    }

    #[test]
    fn test_superseded_frames_are_recycled_unprocessed() {
        let pool = Arc::new(FrameBufferPool::new(4, 8));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (started_tx, started_rx) = mpsc::channel();
        let (gate_tx, gate_rx) = mpsc::channel();
        let processor = ProcessorHandle::new(Box::new(GatedProcessor {
            seen: seen.clone(),
            started: started_tx,
            gate: gate_rx,
            stopped: Arc::new(AtomicBool::new(false)),
        }));
        let scheduler = FrameScheduler::new(pool.clone(), processor, FrameMetadata::default());
        scheduler.start().unwrap();

        scheduler.submit(frame_with(&pool, 1));
        assert_eq!(started_rx.recv_timeout(TIMEOUT).unwrap(), 1);

        // Worker is busy with frame 1; 2 and 3 are superseded by 4.
        scheduler.submit(frame_with(&pool, 2));
        scheduler.submit(frame_with(&pool, 3));
        assert_eq!(pool.available(), 2);
        scheduler.submit(frame_with(&pool, 4));
        assert_eq!(pool.available(), 2);

        gate_tx.send(()).unwrap();
        assert_eq!(started_rx.recv_timeout(TIMEOUT).unwrap(), 4);
        gate_tx.send(()).unwrap();
        wait_for(|| scheduler.stats().frames_processed == 2);
        scheduler.stop();

        assert_eq!(*seen.lock().unwrap(), vec![1, 4]);
        let stats = scheduler.stats();
        assert_eq!(stats.frames_submitted, 4);
        assert_eq!(stats.frames_dropped, 2);
        assert_eq!(stats.frames_processed, 2);
        assert_eq!(pool.available(), 4);
    }

    #[test]
    fn test_replace_waits_for_in_flight_frame() {
        let pool = Arc::new(FrameBufferPool::new(2, 8));
        let (started_tx, started_rx) = mpsc::channel();
        let (gate_tx, gate_rx) = mpsc::channel();
        let old_stopped = Arc::new(AtomicBool::new(false));
        let processor = ProcessorHandle::new(Box::new(GatedProcessor {
            seen: Arc::new(Mutex::new(Vec::new())),
            started: started_tx,
            gate: gate_rx,
            stopped: old_stopped.clone(),
        }));
        let scheduler =
            FrameScheduler::new(pool.clone(), processor.clone(), FrameMetadata::default());
        scheduler.start().unwrap();

        scheduler.submit(frame_with(&pool, 1));
        assert_eq!(started_rx.recv_timeout(TIMEOUT).unwrap(), 1);

        let (forwarded_tx, forwarded_rx) = mpsc::channel();
        let (replaced_tx, replaced_rx) = mpsc::channel();
        let switcher = {
            let processor = processor.clone();
            std::thread::spawn(move || {
                processor.replace(Box::new(ForwardingProcessor { seen: forwarded_tx }));
                replaced_tx.send(()).unwrap();
            })
        };

        // Frame 1 still holds the processor, so the switch has to wait.
        assert!(replaced_rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert!(!old_stopped.load(Ordering::SeqCst));

        gate_tx.send(()).unwrap();
        replaced_rx.recv_timeout(TIMEOUT).unwrap();
        switcher.join().unwrap();
        assert!(old_stopped.load(Ordering::SeqCst));
        assert_eq!(processor.name(), "forwarding");

        scheduler.submit(frame_with(&pool, 2));
        assert_eq!(forwarded_rx.recv_timeout(TIMEOUT).unwrap(), 2);
        scheduler.stop();
        assert_eq!(pool.available(), 2);
    }

    /// Tracks how many workers are inside the processor at the same time.
    struct ConcurrencyTracker {
        inside: Arc<AtomicUsize>,
        max_inside: Arc<AtomicUsize>,
    }

    impl FrameProcessor for ConcurrencyTracker {
        fn process_frame(&mut self, _data: &[u8], _metadata: &FrameMetadata) -> Result<(), AppError> {
            let now_inside = self.inside.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_inside.fetch_max(now_inside, Ordering::SeqCst);
            assert_eq!(
                std::thread::current().name(),
                Some(WORKER_THREAD_NAME)
            );
            std::thread::sleep(Duration::from_millis(1));
            self.inside.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "concurrency-tracker"
        }
    }

    #[test]
    fn test_restart_never_runs_two_workers() {
        let pool = Arc::new(FrameBufferPool::new(4, 4));
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));
        let processor = ProcessorHandle::new(Box::new(ConcurrencyTracker {
            inside: inside.clone(),
            max_inside: max_inside.clone(),
        }));
        let scheduler = FrameScheduler::new(pool.clone(), processor, FrameMetadata::default());

        for _ in 0..20 {
            scheduler.start().unwrap();
            scheduler.start().unwrap();
            assert!(scheduler.is_running());
            for marker in 0..3 {
                if let Some(mut frame) = pool.acquire() {
                    frame.data_mut()[0] = marker;
                    scheduler.submit(frame);
                }
            }
            scheduler.stop();
            scheduler.stop();
            assert!(!scheduler.is_running());
            assert_eq!(inside.load(Ordering::SeqCst), 0);
            assert_eq!(pool.available(), 4);
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    /// Fails on odd markers and panics on marker 2.
    struct FlakyProcessor;

    impl FrameProcessor for FlakyProcessor {
        fn process_frame(&mut self, data: &[u8], _metadata: &FrameMetadata) -> Result<(), AppError> {
            match data[0] {
                2 => panic!("detector crashed"),
                marker if marker % 2 == 1 => {
                    Err(AppError::LandmarkDetection(format!("frame {marker}")))
                }
                _ => Ok(()),
            }
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    #[test]
    fn test_failures_do_not_stop_the_worker_or_leak_buffers() {
        let pool = Arc::new(FrameBufferPool::new(2, 4));
        let processor = ProcessorHandle::new(Box::new(FlakyProcessor));
        let scheduler = FrameScheduler::new(pool.clone(), processor, FrameMetadata::default());
        scheduler.start().unwrap();

        for (i, marker) in [1u8, 2, 4, 3, 6].into_iter().enumerate() {
            scheduler.submit(frame_with(&pool, marker));
            let expected = i as u64 + 1;
            wait_for(|| {
                let stats = scheduler.stats();
                stats.frames_processed + stats.frames_failed == expected
            });
            wait_for(|| pool.available() == 2);
        }

        let stats = scheduler.stats();
        assert_eq!(stats.frames_processed, 2);
        assert_eq!(stats.frames_failed, 3);
        assert!(scheduler.is_running());
        scheduler.stop();
    }

    #[test]
    fn test_unknown_and_inactive_submissions_are_skipped() {
        let pool = Arc::new(FrameBufferPool::new(2, 4));
        let foreign_pool = FrameBufferPool::new(1, 4);
        let processor = ProcessorHandle::new(Box::new(FlakyProcessor));
        let scheduler = FrameScheduler::new(pool.clone(), processor, FrameMetadata::default());

        // Not started yet, the buffer goes straight back.
        scheduler.submit(frame_with(&pool, 0));
        assert_eq!(pool.available(), 2);

        scheduler.start().unwrap();
        scheduler.submit(frame_with(&foreign_pool, 0));
        scheduler.stop();

        let stats = scheduler.stats();
        assert_eq!(stats.frames_skipped, 2);
        assert_eq!(stats.frames_processed, 0);
        assert_eq!(pool.available(), 2);
    }
}

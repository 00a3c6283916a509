use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Identity of a pooled buffer. Two buffers with identical bytes are still
/// different buffers, so frames are always tracked by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId {
    pool: Uuid,
    slot: usize,
}

impl BufferId {
    pub fn pool(&self) -> Uuid {
        self.pool
    }

    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// A raw frame buffer. It is never cloned, so it has exactly one owner at a
/// time: the pool, the camera producer, or the scheduler.
#[derive(Debug)]
pub struct FrameBuffer {
    id: BufferId,
    data: Box<[u8]>,
}

impl FrameBuffer {
    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Fixed set of equally sized buffers shared by the camera producer and the
/// frame scheduler.
#[derive(Debug)]
pub struct FrameBufferPool {
    id: Uuid,
    buffer_size: usize,
    capacity: usize,
    free: Mutex<Vec<FrameBuffer>>,
}

impl FrameBufferPool {
    pub fn new(buffer_count: usize, buffer_size: usize) -> Self {
        let id = Uuid::new_v4();
        let free = (0..buffer_count)
            .map(|slot| FrameBuffer {
                id: BufferId { pool: id, slot },
                data: vec![0u8; buffer_size].into_boxed_slice(),
            })
            .collect();
        tracing::debug!(
            "Created frame buffer pool {} with {} buffers of {} bytes",
            id,
            buffer_count,
            buffer_size
        );
        Self {
            id,
            buffer_size,
            capacity: buffer_count,
            free: Mutex::new(free),
        }
    }

    /// Pool sized for a preview format of `bits_per_pixel`.
    pub fn for_frame(width: u32, height: u32, bits_per_pixel: u32, buffer_count: usize) -> Self {
        Self::new(
            buffer_count,
            Self::buffer_size_for(width, height, bits_per_pixel),
        )
    }

    /// Bytes needed for one frame, plus one spare byte.
    pub fn buffer_size_for(width: u32, height: u32, bits_per_pixel: u32) -> usize {
        let size_in_bits = u64::from(width) * u64::from(height) * u64::from(bits_per_pixel);
        size_in_bits.div_ceil(8) as usize + 1
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.free_list().len()
    }

    pub fn buffer_ids(&self) -> impl Iterator<Item = BufferId> + '_ {
        (0..self.capacity).map(|slot| BufferId {
            pool: self.id,
            slot,
        })
    }

    pub fn owns(&self, buffer: &FrameBuffer) -> bool {
        buffer.id.pool == self.id && buffer.id.slot < self.capacity
    }

    /// Hands a free buffer to the producer, or `None` when all are in flight.
    pub fn acquire(&self) -> Option<FrameBuffer> {
        self.free_list().pop()
    }

    pub fn release(&self, buffer: FrameBuffer) {
        if !self.owns(&buffer) {
            tracing::warn!(
                "Dropping buffer {:?}, it does not belong to pool {}",
                buffer.id,
                self.id
            );
            return;
        }
        self.free_list().push(buffer);
    }

    fn free_list(&self) -> MutexGuard<'_, Vec<FrameBuffer>> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_size_for_nv21() {
        // 640 * 480 * 12 bits = 460800 bytes, plus one.
        assert_eq!(FrameBufferPool::buffer_size_for(640, 480, 12), 460_801);
        // Partial bytes round up.
        assert_eq!(FrameBufferPool::buffer_size_for(1, 1, 12), 3);
    }

    #[test]
    fn test_acquire_and_release_cycle() {
        let pool = FrameBufferPool::new(2, 16);
        let a = pool.acquire().expect("first buffer");
        let b = pool.acquire().expect("second buffer");
        assert!(pool.acquire().is_none());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.len(), 16);

        pool.release(a);
        assert_eq!(pool.available(), 1);
        pool.release(b);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_identical_contents_keep_distinct_identity() {
        let pool = FrameBufferPool::new(2, 4);
        let mut a = pool.acquire().unwrap();
        let mut b = pool.acquire().unwrap();
        a.data_mut().copy_from_slice(&[1, 2, 3, 4]);
        b.data_mut().copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(a.data(), b.data());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_release_rejects_foreign_buffer() {
        let pool = FrameBufferPool::new(1, 4);
        let other = FrameBufferPool::new(1, 4);
        let foreign = other.acquire().unwrap();
        assert!(!pool.owns(&foreign));
        pool.release(foreign);
        assert_eq!(pool.available(), 1);
        assert_eq!(other.available(), 0);
    }

    #[test]
    fn test_buffer_ids_cover_every_slot() {
        let pool = FrameBufferPool::new(4, 1);
        let ids: Vec<BufferId> = pool.buffer_ids().collect();
        assert_eq!(ids.len(), 4);
        assert!(ids.iter().all(|id| id.pool() == pool.id()));
        assert_eq!(ids.iter().map(|id| id.slot()).sum::<usize>(), 6);
    }
}

//! Concurrency-safe chunk recycling.
//!
//! Streams that encode or decode many payloads allocate and drop the same
//! chunk sizes over and over. A [`ChunkPool`] keeps released chunks around
//! so the next stream can reuse them instead of hitting the allocator.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::chunk::Chunk;
use crate::error::StreamError;

/// A concurrency-safe cache of same-capacity [`Chunk`]s.
///
/// A pool is created with one chunk capacity and only ever produces and
/// accepts chunks of that size. It is an explicitly constructed resource:
/// wrap it in an [`Arc`] and hand a clone to every stream that should share
/// it — there is no hidden global pool.
///
/// [`acquire`] and [`release`] are safe to call from arbitrary threads
/// without external locking, and [`acquire`] never waits for a release: an
/// empty pool falls back to a fresh allocation.
///
/// # Caller contract
///
/// Two checks are deliberately absent, matching the performance profile of
/// the codec paths this pool serves:
///
/// - [`release`] does not verify a chunk's capacity or identity. Releasing
///   a chunk of the wrong size is a caller error, not a detected fault.
/// - [`acquire`] does not clear recycled chunks. A recycled chunk still
///   holds whatever its previous owner wrote; only trust bytes you wrote
///   yourself.
///
/// # Example
///
/// ```
/// use chunkstream::ChunkPool;
///
/// let pool = ChunkPool::new(4096);
///
/// let chunk = pool.acquire()?;
/// assert_eq!(chunk.capacity(), 4096);
///
/// pool.release(chunk);
/// assert_eq!(pool.idle_chunks(), 1);
/// # Ok::<(), chunkstream::StreamError>(())
/// ```
///
/// [`Arc`]: std::sync::Arc
/// [`acquire`]: ChunkPool::acquire
/// [`release`]: ChunkPool::release
#[derive(Debug)]
pub struct ChunkPool {
    chunk_capacity: usize,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    free: Vec<Chunk>,
    shutdown: bool,
}

impl ChunkPool {
    /// Creates a pool that produces and accepts chunks of `chunk_capacity`
    /// bytes.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_capacity` is zero.
    pub fn new(chunk_capacity: usize) -> Self {
        assert!(chunk_capacity > 0, "pool chunk capacity must be non-zero");
        Self {
            chunk_capacity,
            inner: Mutex::new(Inner {
                free: Vec::new(),
                shutdown: false,
            }),
        }
    }

    /// Returns the capacity every chunk of this pool has.
    pub fn chunk_capacity(&self) -> usize {
        self.chunk_capacity
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes a recycled chunk, or allocates a fresh one when none is idle.
    ///
    /// Never blocks waiting for a release. Recycled chunks are returned as
    /// their previous owner left them — contents are not cleared.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Disposed`] after [`shutdown`].
    ///
    /// [`shutdown`]: ChunkPool::shutdown
    pub fn acquire(&self) -> Result<Chunk, StreamError> {
        let mut inner = self.lock();
        if inner.shutdown {
            return Err(StreamError::Disposed);
        }
        if let Some(chunk) = inner.free.pop() {
            return Ok(chunk);
        }
        // Allocate outside the lock.
        drop(inner);
        Ok(Chunk::new(self.chunk_capacity))
    }

    /// Transfers a chunk back to the pool for reuse.
    ///
    /// Ownership moves to the pool; the caller must not touch the chunk
    /// again. The chunk must have this pool's capacity — nothing is
    /// verified. After [`shutdown`] the chunk is silently dropped instead,
    /// so streams that outlive an intentional pool teardown can still hand
    /// back their chunks without failing.
    ///
    /// [`shutdown`]: ChunkPool::shutdown
    pub fn release(&self, chunk: Chunk) {
        let mut inner = self.lock();
        if inner.shutdown {
            return;
        }
        inner.free.push(chunk);
    }

    /// Shuts the pool down and drops every idle chunk.
    ///
    /// Subsequent [`acquire`] calls fail with [`StreamError::Disposed`];
    /// subsequent [`release`] calls become silent no-ops.
    ///
    /// [`acquire`]: ChunkPool::acquire
    /// [`release`]: ChunkPool::release
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        inner.shutdown = true;
        inner.free.clear();
    }

    /// Number of idle chunks currently cached.
    pub fn idle_chunks(&self) -> usize {
        self.lock().free.len()
    }
}

//! chunkstream
//!
//! Growable, seekable byte sequences over chains of fixed-capacity chunks.
//!
//! `chunkstream` sits between a byte producer that pushes arbitrary-length
//! fragments — typically a native encoder's write callback — and consumers
//! that read sequentially, seek, snapshot, or drain. Writes grow a linked
//! chain of fixed-capacity chunks instead of reallocating one contiguous
//! buffer; an optional concurrent [`ChunkPool`] recycles chunks across many
//! short-lived streams; [`UnmanagedChunkedStream`] walks a chain of
//! externally-owned native memory without copying or freeing it.
//!
//! The crate intentionally:
//! - does NOT compress or interpret the bytes it stores
//! - does NOT share buffers across processes
//! - does NOT define a wire or on-disk format
//! - does NOT resize chunks in place — growth is strictly additive
//!
//! It only does one thing: **push bytes in → seek, snapshot, or drain them out**
//!
//! # Writing and reading
//!
//! ```
//! use chunkstream::ChunkedStream;
//!
//! let mut stream = ChunkedStream::with_chunk_capacity(4);
//! stream.write(&[1, 2, 3, 4, 5, 6, 7])?;
//!
//! assert_eq!(stream.len()?, 7);
//!
//! stream.seek(5)?;
//! let mut buf = [0u8; 2];
//! let n = stream.read(&mut buf)?;
//! assert_eq!((n, buf), (2, [6, 7]));
//! # Ok::<(), chunkstream::StreamError>(())
//! ```
//!
//! # Pooled chunks
//!
//! ```
//! use std::sync::Arc;
//! use chunkstream::{ChunkPool, ChunkedStream};
//!
//! let pool = Arc::new(ChunkPool::new(16 * 1024));
//!
//! let mut stream = ChunkedStream::with_pool(Arc::clone(&pool));
//! stream.write(b"encoded payload")?;
//! let snapshot = stream.to_bytes()?;
//! stream.close(); // chunks go back to the pool for the next stream
//!
//! assert_eq!(&snapshot[..], b"encoded payload");
//! assert!(pool.idle_chunks() > 0);
//! # Ok::<(), chunkstream::StreamError>(())
//! ```

#![warn(missing_docs)]

mod chunk;
mod error;
mod pool;
mod stream;

//
// Public surface (intentionally tiny)
//

pub use chunk::{Chunk, RawChunk};
pub use error::StreamError;
pub use pool::ChunkPool;
pub use stream::{ChunkedStream, DEFAULT_CHUNK_CAPACITY, UnmanagedChunkedStream};

//! Byte streams over chunk chains.
//!
//! - [`ChunkedStream`] - growable, seekable, writable-or-read-only sequence
//!   over managed chunks
//! - [`UnmanagedChunkedStream`] - read-only counterpart over
//!   externally-owned native memory

mod chunked;
mod unmanaged;

pub use chunked::{ChunkedStream, DEFAULT_CHUNK_CAPACITY};
pub use unmanaged::UnmanagedChunkedStream;

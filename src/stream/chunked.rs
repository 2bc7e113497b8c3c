//! Growable, seekable byte sequences over chains of managed chunks.

use std::io;
use std::sync::Arc;

use bytes::Bytes;

use crate::chunk::Chunk;
use crate::error::StreamError;
use crate::pool::ChunkPool;

/// Chunk capacity used for growth when no pool is attached.
pub const DEFAULT_CHUNK_CAPACITY: usize = 8 * 1024; // 8 KiB

/// One chain node: a chunk plus the arena index of its successor.
#[derive(Debug)]
struct Node {
    chunk: Chunk,
    next: Option<usize>,
}

/// A growable, seekable byte sequence over a chain of fixed-capacity
/// chunks.
///
/// Producers append with [`write`], which extends the chain one chunk at a
/// time instead of reallocating a contiguous buffer; consumers use
/// [`read`], [`seek`], [`to_bytes`], or [`write_to`] without ever seeing a
/// chunk boundary. New chunks come from an attached [`ChunkPool`] when one
/// was supplied at construction, otherwise from fresh allocations of the
/// configured capacity.
///
/// The stream keeps two independent cursors:
///
/// - the *write cursor* (terminal chunk + fill level) only ever moves
///   forward, which keeps every non-terminal chunk full to capacity;
/// - the *read cursor* moves freely via [`seek`] and [`set_position`].
///
/// An instance expects exclusive single-threaded access; only the pool it
/// may share with other streams is safe to touch from several threads.
///
/// # Example
///
/// ```
/// use chunkstream::ChunkedStream;
///
/// let mut stream = ChunkedStream::new();
/// stream.write(b"header")?;
/// stream.write(b" body")?;
///
/// assert_eq!(&stream.to_bytes()?[..], b"header body");
/// # Ok::<(), chunkstream::StreamError>(())
/// ```
///
/// [`write`]: ChunkedStream::write
/// [`read`]: ChunkedStream::read
/// [`seek`]: ChunkedStream::seek
/// [`set_position`]: ChunkedStream::set_position
/// [`to_bytes`]: ChunkedStream::to_bytes
/// [`write_to`]: ChunkedStream::write_to
#[derive(Debug)]
pub struct ChunkedStream {
    /// Chain nodes in append order; `next` links give the traversal order.
    nodes: Vec<Node>,
    head: Option<usize>,
    /// Terminal node; the write cursor's chunk.
    tail: Option<usize>,
    /// Fill level of the terminal chunk. Bytes below it are data.
    write_offset: usize,
    read_node: Option<usize>,
    read_offset: usize,
    chunk_capacity: usize,
    pool: Option<Arc<ChunkPool>>,
    read_only: bool,
    disposed: bool,
}

impl ChunkedStream {
    /// Creates an empty stream growing by [`DEFAULT_CHUNK_CAPACITY`] chunks.
    pub fn new() -> Self {
        Self::with_chunk_capacity(DEFAULT_CHUNK_CAPACITY)
    }

    /// Creates an empty stream growing by chunks of `chunk_capacity` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_capacity` is zero.
    pub fn with_chunk_capacity(chunk_capacity: usize) -> Self {
        assert!(chunk_capacity > 0, "chunk capacity must be non-zero");
        Self {
            nodes: Vec::new(),
            head: None,
            tail: None,
            write_offset: 0,
            read_node: None,
            read_offset: 0,
            chunk_capacity,
            pool: None,
            read_only: false,
            disposed: false,
        }
    }

    /// Creates a stream pre-seeded with one chunk of exactly `len` bytes.
    ///
    /// For producers that know the final size in advance (a length header,
    /// a codec's size query): the whole payload then lands in a single
    /// chunk. The stream is still empty — its length grows as data is
    /// written — and writing past `len` grows by default-capacity chunks.
    pub fn preallocated(len: usize) -> Self {
        let mut stream = Self::new();
        if len > 0 {
            stream.push_chunk(Chunk::new(len));
        }
        stream
    }

    /// Creates an empty stream that draws growth chunks from `pool`.
    ///
    /// The stream's chunk capacity is the pool's. On [`close`] (or drop)
    /// every chunk of the chain is released back to the pool.
    ///
    /// [`close`]: ChunkedStream::close
    pub fn with_pool(pool: Arc<ChunkPool>) -> Self {
        let mut stream = Self::with_chunk_capacity(pool.chunk_capacity());
        stream.pool = Some(pool);
        stream
    }

    fn ensure_open(&self) -> Result<(), StreamError> {
        if self.disposed {
            Err(StreamError::Disposed)
        } else {
            Ok(())
        }
    }

    fn cap(&self, node: usize) -> usize {
        self.nodes[node].chunk.capacity()
    }

    /// Valid bytes in a node: full capacity for non-terminal chunks, the
    /// fill level for the terminal one.
    fn filled(&self, node: usize) -> usize {
        if Some(node) == self.tail {
            self.write_offset
        } else {
            self.cap(node)
        }
    }

    /// Links `chunk` as the new terminal node and returns its index.
    fn push_chunk(&mut self, chunk: Chunk) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node { chunk, next: None });
        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.write_offset = 0;
        if self.read_node.is_none() {
            self.read_node = Some(idx);
            self.read_offset = 0;
        }
        idx
    }

    fn next_chunk(&self) -> Result<Chunk, StreamError> {
        match &self.pool {
            Some(pool) => pool.acquire(),
            None => Ok(Chunk::new(self.chunk_capacity)),
        }
    }

    /// Appends `buf` at the write cursor, growing the chain as needed.
    ///
    /// Fragments of any size are accepted; a fragment larger than one
    /// chunk's capacity is split across as many chunks as required, each
    /// copy step bounded by the current chunk's remaining capacity.
    /// Existing chunks are never resized.
    ///
    /// # Errors
    ///
    /// [`StreamError::ReadOnly`] if the stream is read-only,
    /// [`StreamError::Disposed`] after [`close`] or when a pool-backed
    /// stream needs a chunk from a pool that was shut down. In the latter
    /// case every byte copied before the failure is kept; the chain is not
    /// extended beyond them.
    ///
    /// [`close`]: ChunkedStream::close
    pub fn write(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        self.ensure_open()?;
        if self.read_only {
            return Err(StreamError::ReadOnly);
        }
        let mut rest = buf;
        while !rest.is_empty() {
            let tail = match self.tail {
                Some(tail) if self.write_offset < self.cap(tail) => tail,
                _ => {
                    let chunk = self.next_chunk()?;
                    self.push_chunk(chunk)
                }
            };
            let offset = self.write_offset;
            let step = rest.len().min(self.cap(tail) - offset);
            self.nodes[tail].chunk.as_mut_slice()[offset..offset + step]
                .copy_from_slice(&rest[..step]);
            self.write_offset += step;
            rest = &rest[step..];
        }
        Ok(())
    }

    /// Appends a single byte at the write cursor.
    ///
    /// # Errors
    ///
    /// Same conditions as [`write`].
    ///
    /// [`write`]: ChunkedStream::write
    pub fn write_byte(&mut self, byte: u8) -> Result<(), StreamError> {
        self.write(&[byte])
    }

    /// Reads up to `buf.len()` bytes at the read cursor, advancing it.
    ///
    /// Crosses chunk boundaries transparently but never reads past the
    /// logical end of written data. Returns how many bytes were copied —
    /// fewer than requested at end-of-data, `0` at end-of-data with an
    /// empty result rather than an error.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        self.ensure_open()?;
        let mut copied = 0;
        while copied < buf.len() {
            let Some(node) = self.read_node else { break };
            let filled = self.filled(node);
            if self.read_offset >= filled {
                let Some(next) = self.nodes[node].next else {
                    break;
                };
                self.read_node = Some(next);
                self.read_offset = 0;
                continue;
            }
            let step = (buf.len() - copied).min(filled - self.read_offset);
            buf[copied..copied + step].copy_from_slice(
                &self.nodes[node].chunk.as_slice()[self.read_offset..self.read_offset + step],
            );
            self.read_offset += step;
            copied += step;
        }
        Ok(copied)
    }

    /// Reads one byte at the read cursor, or `None` at end-of-data.
    pub fn read_byte(&mut self) -> Result<Option<u8>, StreamError> {
        let mut byte = [0u8; 1];
        Ok(if self.read(&mut byte)? == 1 {
            Some(byte[0])
        } else {
            None
        })
    }

    /// Returns the logical length: the bytes written so far, not the
    /// allocated capacity.
    ///
    /// Recomputed on every call by walking the chain — every non-terminal
    /// chunk counts at full capacity, the terminal chunk at its fill
    /// level.
    pub fn len(&self) -> Result<u64, StreamError> {
        self.ensure_open()?;
        Ok(self.total_len())
    }

    /// Returns `true` when no bytes have been written.
    pub fn is_empty(&self) -> Result<bool, StreamError> {
        Ok(self.len()? == 0)
    }

    fn total_len(&self) -> u64 {
        let mut total = 0u64;
        let mut idx = self.head;
        while let Some(node) = idx {
            total += self.filled(node) as u64;
            idx = self.nodes[node].next;
        }
        total
    }

    /// Returns the read cursor's absolute position.
    ///
    /// Recomputed on every call by walking the chain from the head up to
    /// the cursor's chunk, then adding the in-chunk offset.
    pub fn position(&self) -> Result<u64, StreamError> {
        self.ensure_open()?;
        let Some(read_node) = self.read_node else {
            return Ok(0);
        };
        let mut total = 0u64;
        let mut idx = self.head;
        while let Some(node) = idx {
            if node == read_node {
                return Ok(total + self.read_offset as u64);
            }
            total += self.filled(node) as u64;
            idx = self.nodes[node].next;
        }
        Ok(total)
    }

    /// Moves the read cursor to the absolute position `position`.
    ///
    /// Walks the chain from the head until the chunk containing the target
    /// is found. A target equal to [`len`] is valid and lands at the very
    /// end of the terminal chunk. The cursor is only committed once the
    /// target is located: a failing call leaves it exactly where it was.
    ///
    /// # Errors
    ///
    /// [`StreamError::OutOfRange`] for targets beyond [`len`].
    ///
    /// [`len`]: ChunkedStream::len
    pub fn set_position(&mut self, position: u64) -> Result<(), StreamError> {
        self.ensure_open()?;
        let mut remaining = position;
        let mut idx = self.head;
        while let Some(node) = idx {
            let filled = self.filled(node) as u64;
            let terminal = self.nodes[node].next.is_none();
            if remaining < filled || (terminal && remaining == filled) {
                self.read_node = Some(node);
                self.read_offset = remaining as usize;
                return Ok(());
            }
            remaining -= filled;
            idx = self.nodes[node].next;
        }
        if position == 0 {
            // Empty chain; the cursor already is at the start.
            return Ok(());
        }
        Err(StreamError::OutOfRange {
            target: position,
            length: self.total_len(),
        })
    }

    /// Alias for [`set_position`], matching seek-style call sites.
    ///
    /// [`set_position`]: ChunkedStream::set_position
    pub fn seek(&mut self, position: u64) -> Result<(), StreamError> {
        self.set_position(position)
    }

    /// Returns a contiguous copy of the entire logical content.
    ///
    /// The read cursor is saved, the whole stream is drained from the
    /// start, and the cursor is restored before returning — callers
    /// observe no cursor movement.
    pub fn to_bytes(&mut self) -> Result<Bytes, StreamError> {
        self.ensure_open()?;
        let saved_node = self.read_node;
        let saved_offset = self.read_offset;
        self.read_node = self.head;
        self.read_offset = 0;

        let mut out = vec![0u8; self.total_len() as usize];
        let drained = self.read(&mut out)?;
        debug_assert_eq!(drained, out.len());

        self.read_node = saved_node;
        self.read_offset = saved_offset;
        Ok(Bytes::from(out))
    }

    /// Drains all unread bytes into `sink`, advancing the read cursor to
    /// the end.
    ///
    /// Unlike [`to_bytes`] the cursor is not restored. Returns the number
    /// of bytes written.
    ///
    /// # Errors
    ///
    /// Sink failures surface as [`StreamError::Io`].
    ///
    /// [`to_bytes`]: ChunkedStream::to_bytes
    pub fn write_to<W: io::Write>(&mut self, sink: &mut W) -> Result<u64, StreamError> {
        self.ensure_open()?;
        let mut written = 0u64;
        loop {
            let Some(node) = self.read_node else { break };
            let filled = self.filled(node);
            if self.read_offset >= filled {
                let Some(next) = self.nodes[node].next else {
                    break;
                };
                self.read_node = Some(next);
                self.read_offset = 0;
                continue;
            }
            let step = filled - self.read_offset;
            sink.write_all(&self.nodes[node].chunk.as_slice()[self.read_offset..filled])?;
            self.read_offset = filled;
            written += step as u64;
        }
        Ok(written)
    }

    /// Toggles write permission.
    ///
    /// Usable at any time, not just at construction — the usual pattern is
    /// a producer finishing its writes and freezing the stream into a pure
    /// read source.
    pub fn set_read_only(&mut self, read_only: bool) -> Result<(), StreamError> {
        self.ensure_open()?;
        self.read_only = read_only;
        Ok(())
    }

    /// Returns `true` when writes are rejected.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Truncation and pre-sized growth are permanently unsupported; the
    /// stream only grows through [`write`].
    ///
    /// # Errors
    ///
    /// Always [`StreamError::Unsupported`].
    ///
    /// [`write`]: ChunkedStream::write
    pub fn set_len(&mut self, _len: u64) -> Result<(), StreamError> {
        Err(StreamError::Unsupported { operation: "set_len" })
    }

    /// Number of chunks currently in the chain.
    pub fn chunk_count(&self) -> usize {
        self.nodes.len()
    }

    /// Closes the stream.
    ///
    /// Pool-backed streams walk the chain and release every chunk back to
    /// the pool, then drop the pool reference. Every subsequent operation
    /// fails with [`StreamError::Disposed`]. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.disposed {
            return;
        }
        self.release_chain();
        self.disposed = true;
    }

    fn release_chain(&mut self) {
        let pool = self.pool.take();
        let nodes = std::mem::take(&mut self.nodes);
        if let Some(pool) = pool {
            // Nodes are appended in chain order, so this walks the chain.
            for node in nodes {
                pool.release(node.chunk);
            }
        }
        self.head = None;
        self.tail = None;
        self.write_offset = 0;
        self.read_node = None;
        self.read_offset = 0;
    }
}

impl Default for ChunkedStream {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ChunkedStream {
    fn drop(&mut self) {
        if !self.disposed {
            self.release_chain();
        }
    }
}

impl io::Read for ChunkedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(ChunkedStream::read(self, buf)?)
    }
}

impl io::Write for ChunkedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        ChunkedStream::write(self, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Seek for ChunkedStream {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let target = match pos {
            io::SeekFrom::Start(offset) => i128::from(offset),
            io::SeekFrom::End(delta) => i128::from(self.len()?) + i128::from(delta),
            io::SeekFrom::Current(delta) => i128::from(self.position()?) + i128::from(delta),
        };
        let target = u64::try_from(target).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek to a negative or overflowing position",
            )
        })?;
        self.set_position(target)?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stream() {
        let stream = ChunkedStream::new();
        assert_eq!(stream.len().unwrap(), 0);
        assert_eq!(stream.position().unwrap(), 0);
        assert_eq!(stream.chunk_count(), 0);
    }

    #[test]
    fn test_write_grows_by_whole_chunks() {
        let mut stream = ChunkedStream::with_chunk_capacity(4);
        stream.write(&[0; 9]).unwrap();
        assert_eq!(stream.chunk_count(), 3);
        assert_eq!(stream.len().unwrap(), 9);
    }

    #[test]
    fn test_preallocated_single_chunk() {
        let mut stream = ChunkedStream::preallocated(100);
        assert_eq!(stream.len().unwrap(), 0);
        assert_eq!(stream.chunk_count(), 1);

        stream.write(&[7; 100]).unwrap();
        assert_eq!(stream.chunk_count(), 1, "known-size payload stays in one chunk");
        assert_eq!(stream.len().unwrap(), 100);
    }

    #[test]
    fn test_preallocated_zero_is_empty() {
        let stream = ChunkedStream::preallocated(0);
        assert_eq!(stream.chunk_count(), 0);
    }

    #[test]
    fn test_read_crosses_chunk_boundaries() {
        let mut stream = ChunkedStream::with_chunk_capacity(3);
        stream.write(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(stream.read(&mut buf).unwrap(), 8);
        assert_eq!(buf, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(stream.read(&mut buf).unwrap(), 0, "end-of-data");
    }

    #[test]
    fn test_write_byte_crosses_boundary() {
        let mut stream = ChunkedStream::with_chunk_capacity(2);
        for byte in 0..5u8 {
            stream.write_byte(byte).unwrap();
        }
        assert_eq!(stream.chunk_count(), 3);
        assert_eq!(&stream.to_bytes().unwrap()[..], &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_read_byte_end_marker() {
        let mut stream = ChunkedStream::with_chunk_capacity(2);
        stream.write(&[9]).unwrap();
        assert_eq!(stream.read_byte().unwrap(), Some(9));
        assert_eq!(stream.read_byte().unwrap(), None);
    }

    #[test]
    fn test_position_tracks_reads() {
        let mut stream = ChunkedStream::with_chunk_capacity(4);
        stream.write(&[0; 10]).unwrap();

        let mut buf = [0u8; 6];
        stream.read(&mut buf).unwrap();
        assert_eq!(stream.position().unwrap(), 6);
    }

    #[test]
    fn test_seek_to_length_then_read_yields_nothing() {
        let mut stream = ChunkedStream::with_chunk_capacity(4);
        stream.write(&[1; 6]).unwrap();

        stream.seek(6).unwrap();
        assert_eq!(stream.read_byte().unwrap(), None);
    }

    #[test]
    fn test_failed_seek_leaves_cursor() {
        let mut stream = ChunkedStream::with_chunk_capacity(4);
        stream.write(&[1; 6]).unwrap();
        stream.seek(2).unwrap();

        let err = stream.seek(7).unwrap_err();
        assert!(matches!(err, StreamError::OutOfRange { target: 7, length: 6 }));
        assert_eq!(stream.position().unwrap(), 2);
    }

    #[test]
    fn test_set_len_unsupported() {
        let mut stream = ChunkedStream::new();
        assert!(matches!(
            stream.set_len(10),
            Err(StreamError::Unsupported { operation: "set_len" })
        ));
    }

    #[test]
    fn test_interleaved_write_read() {
        let mut stream = ChunkedStream::with_chunk_capacity(4);
        stream.write(&[1, 2, 3]).unwrap();

        let mut buf = [0u8; 3];
        assert_eq!(stream.read(&mut buf).unwrap(), 3);

        // Writing after a full read makes more data visible at the cursor.
        stream.write(&[4, 5, 6]).unwrap();
        let mut buf = [0u8; 3];
        assert_eq!(stream.read(&mut buf).unwrap(), 3);
        assert_eq!(buf, [4, 5, 6]);
    }

    #[test]
    fn test_default_capacity() {
        let mut stream = ChunkedStream::default();
        stream.write(&[0; DEFAULT_CHUNK_CAPACITY + 1]).unwrap();
        assert_eq!(stream.chunk_count(), 2);
    }
}

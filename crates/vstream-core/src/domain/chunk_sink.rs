//! Watch-side reassembler for received media segments.
//!
//! The streaming connection delivers media as a sequence of opaque binary
//! segments with no sequence numbers and no random access.  A player needs
//! the *concatenation* of everything received so far, so the sink keeps one
//! growing buffer and extends it in place on every append.
//!
//! # Why not rebuild per chunk?
//!
//! Rebuilding a fresh playable object from the whole chunk history after each
//! arrival costs O(total bytes) per chunk, O(n²) over a session.  Extending a
//! single [`BytesMut`] is amortised O(chunk) and the full buffer is still
//! available after every append.
//!
//! # Ownership
//!
//! The sink has exactly one writer: the session's inbound-message handler.
//! `append` takes `&mut self`, so the borrow checker rules out a concurrent
//! append and read of the same sink.

use bytes::{Bytes, BytesMut};

/// Accumulates media segments, in arrival order, into one playable buffer.
#[derive(Debug, Default)]
pub struct ChunkSink {
    buffer: BytesMut,
    chunks: usize,
}

impl ChunkSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty sink with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            chunks: 0,
        }
    }

    /// Appends one segment and returns the reassembled buffer.
    ///
    /// After appending `c1, c2, ..., cn` the returned slice equals
    /// `c1 ++ c2 ++ ... ++ cn`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vstream_core::ChunkSink;
    ///
    /// let mut sink = ChunkSink::new();
    /// assert_eq!(sink.append(b"ab"), b"ab");
    /// assert_eq!(sink.append(b"cd"), b"abcd");
    /// ```
    pub fn append(&mut self, chunk: &[u8]) -> &[u8] {
        self.buffer.extend_from_slice(chunk);
        self.chunks += 1;
        &self.buffer
    }

    /// The most recent complete buffer.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Number of segments appended since creation or the last release.
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Total buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drops the buffered data and returns its memory to the allocator.
    pub fn release(&mut self) {
        self.buffer = BytesMut::new();
        self.chunks = 0;
    }

    /// Consumes the sink and returns the buffer without copying.
    pub fn into_bytes(self) -> Bytes {
        self.buffer.freeze()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Encoded chunk accumulation

/// An opaque segment of encoded media
pub type Chunk = Vec<u8>;

/// Ordered encoded segments of the current session
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Chunk>,
    total_bytes: usize,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: Chunk) {
        self.total_bytes += chunk.len();
        self.chunks.push(chunk);
    }

    /// Number of chunks held
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Concatenate all chunks in arrival order and clear the buffer.
    pub fn take(&mut self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.total_bytes);
        for chunk in self.chunks.drain(..) {
            data.extend_from_slice(&chunk);
        }
        self.total_bytes = 0;
        data
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.total_bytes = 0;
    }
}

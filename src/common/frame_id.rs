//! Frame identifier type.

use std::fmt;

/// Index of a frame in the buffer pool.
///
/// Frames and their descriptors live in parallel vectors allocated once at
/// pool construction, so `frames[frame_id.0]` and `descriptors[frame_id.0]`
/// name the same slot for the whole life of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub usize);

impl FrameId {
    /// Create a new FrameId.
    #[inline]
    pub fn new(id: usize) -> Self {
        FrameId(id)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", self.0)
    }
}

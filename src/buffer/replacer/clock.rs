//! CLOCK (second chance) replacement policy.

use std::sync::atomic::Ordering;

use crate::buffer::frame::BufferDescriptor;
use crate::buffer::stats::BufferPoolStats;
use crate::common::FrameId;

/// The clock hand over the buffer pool's descriptors.
///
/// The replacer keeps no per-frame state of its own; reference bits, pin
/// counts and validity are read straight from the descriptors, which the pool
/// hands in under its state lock.
///
/// Each probe first advances the hand, then looks at the frame under it:
/// 1. An invalid (empty) frame is taken immediately
/// 2. A set reference bit is cleared and the frame is skipped
/// 3. An unpinned frame is the victim
/// 4. A pinned frame is skipped
///
/// Two full revolutions are enough to clear every reference bit and come back
/// around, so a sweep that probes `2 * num_frames` frames without a victim
/// means every frame is pinned.
#[derive(Debug)]
pub struct ClockReplacer {
    hand: usize,
    num_frames: usize,
}

impl ClockReplacer {
    /// Create a replacer for `num_frames` frames.
    ///
    /// The hand starts on the last frame so the first probe lands on frame 0.
    pub fn new(num_frames: usize) -> Self {
        assert!(num_frames > 0, "num_frames must be > 0");
        Self {
            hand: num_frames - 1,
            num_frames,
        }
    }

    /// Current position of the clock hand.
    #[inline]
    pub fn hand(&self) -> FrameId {
        FrameId::new(self.hand)
    }

    #[inline]
    fn advance(&mut self) {
        self.hand = (self.hand + 1) % self.num_frames;
    }

    /// Sweep the clock until a victim frame is found.
    ///
    /// The hand is left on the victim. Returns `None` when every frame is
    /// pinned.
    pub fn find_victim(
        &mut self,
        descriptors: &mut [BufferDescriptor],
        stats: &BufferPoolStats,
    ) -> Option<FrameId> {
        debug_assert_eq!(descriptors.len(), self.num_frames);

        for _ in 0..2 * self.num_frames {
            self.advance();
            let desc = &mut descriptors[self.hand];

            if !desc.is_valid() {
                return Some(desc.frame_id());
            }

            if desc.ref_bit() {
                desc.clear_ref_bit();
                stats.ref_bit_clears.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            if !desc.is_pinned() {
                return Some(desc.frame_id());
            }
        }

        None
    }
}

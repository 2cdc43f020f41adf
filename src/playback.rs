//! Playback buffer
//!
//! Frames waiting for their target time, ordered by ascending timestamp.
//! Frames with equal timestamps keep their arrival order.

use alloc::string::String;
use alloc::vec::Vec;

use crate::frame::Frame;

/// A frame that was dropped because its target time passed long ago
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedFrame {
    pub output_id: String,
    /// Target timestamp of the dropped frame
    pub timestamp: u64,
    /// Oldest timestamp that was still eligible at the time of the drop
    pub cutoff: u64,
}

/// Outcome of one rendering decision pass
#[derive(Debug, Default)]
pub struct Drained {
    /// Frames to render now, in selection order, at most one per output
    pub ready: Vec<Frame>,
    /// Frames discarded as stale
    pub dropped: Vec<DroppedFrame>,
    /// Number of frames discarded because their output no longer exists
    pub purged: usize,
}

#[derive(Debug)]
pub struct PlaybackBuffer {
    frames: Vec<Frame>,
    capacity: usize,
}

impl PlaybackBuffer {
    /// Create a buffer holding at most `capacity` frames
    pub const fn new(capacity: usize) -> Self {
        Self {
            frames: Vec::new(),
            capacity,
        }
    }

    /// Insert a frame keeping timestamp order
    ///
    /// Returns the frame if the buffer is full
    pub fn enqueue(&mut self, frame: Frame) -> Result<(), Frame> {
        if self.frames.len() >= self.capacity {
            return Err(frame);
        }
        let index = self
            .frames
            .partition_point(|queued| queued.timestamp <= frame.timestamp);
        self.frames.insert(index, frame);
        Ok(())
    }

    /// Drop every buffered frame of an output
    ///
    /// Returns the number of dropped frames
    pub fn clear(&mut self, output_id: &str) -> usize {
        let before = self.frames.len();
        self.frames.retain(|frame| frame.output_id != output_id);
        before - self.frames.len()
    }

    /// Keep only the frames whose output satisfies `is_known`
    ///
    /// Returns the number of purged frames
    pub fn retain_outputs(&mut self, mut is_known: impl FnMut(&str) -> bool) -> usize {
        let before = self.frames.len();
        self.frames.retain(|frame| is_known(&frame.output_id));
        before - self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns true if no frame is buffered for `output_id`
    pub fn is_empty_for(&self, output_id: &str) -> bool {
        !self.frames.iter().any(|frame| frame.output_id == output_id)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Buffered frames in playback order
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Select the frames to render at `now`.
    ///
    /// Walks the buffer in timestamp order:
    /// - frames of outputs rejected by `is_known` are purged;
    /// - a frame within `tolerance_ms` of `now` is selected, unless another
    ///   frame of the same output was already selected in this pass;
    /// - a frame older than `now - stale_ms` is dropped;
    /// - everything else stays buffered.
    pub fn drain_ready(
        &mut self,
        now: u64,
        tolerance_ms: u64,
        stale_ms: u64,
        mut is_known: impl FnMut(&str) -> bool,
    ) -> Drained {
        let cutoff = now.saturating_sub(stale_ms);
        let mut drained = Drained::default();

        let mut index = 0;
        while index < self.frames.len() {
            let frame = &self.frames[index];
            if !is_known(&frame.output_id) {
                self.frames.remove(index);
                drained.purged += 1;
            } else if frame.timestamp.abs_diff(now) <= tolerance_ms {
                let selected = drained
                    .ready
                    .iter()
                    .any(|ready| ready.output_id == frame.output_id);
                if selected {
                    index += 1;
                } else {
                    drained.ready.push(self.frames.remove(index));
                }
            } else if frame.timestamp < cutoff {
                let frame = self.frames.remove(index);
                drained.dropped.push(DroppedFrame {
                    output_id: frame.output_id,
                    timestamp: frame.timestamp,
                    cutoff,
                });
            } else {
                index += 1;
            }
        }

        drained
    }
}

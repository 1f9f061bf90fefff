use std::ops::Range;

/// Fixed-rate frame stream derived from the drawing surface.
///
/// Frame `i` is due once `i * interval` milliseconds have elapsed since the stream began. When
/// the renderer falls behind, several frames become due at once and all of them carry the
/// current surface content, so the encoded stream keeps its nominal rate.
#[derive(Clone, Debug)]
pub struct FrameStream {
    interval_ms: f64,
    next_index: u64,
    frame_limit: Option<u64>,
}

impl FrameStream {
    pub fn new(fps: u32, frame_limit: Option<u64>) -> Self {
        Self {
            interval_ms: 1000.0 / f64::from(fps.max(1)),
            next_index: 0,
            frame_limit,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Frames handed out so far.
    pub fn emitted(&self) -> u64 {
        self.next_index
    }

    pub fn is_exhausted(&self) -> bool {
        self.frame_limit.is_some_and(|limit| self.next_index >= limit)
    }

    /// Timestamp of frame `index`, relative to the stream start.
    pub fn timestamp_ms(&self, index: u64) -> f64 {
        index as f64 * self.interval_ms
    }

    /// Claim every frame due at `elapsed_ms`.
    pub fn take_due(&mut self, elapsed_ms: f64) -> Range<u64> {
        let start = self.next_index;
        if !elapsed_ms.is_finite() || elapsed_ms < 0.0 {
            return start..start;
        }

        // Small epsilon so accumulated float error does not hold back a frame that is due.
        let mut end = ((elapsed_ms + 1e-6) / self.interval_ms).floor() as u64 + 1;
        if let Some(limit) = self.frame_limit {
            end = end.min(limit);
        }
        let end = end.max(start);
        self.next_index = end;
        start..end
    }
}

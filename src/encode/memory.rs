//! Deterministic in-process encoder for tests and debugging.
//!
//! It does not compress anything. The stream is a small header followed by one 16-byte record
//! per frame (timestamp bits + FNV-1a digest of the pixels), cut into chunks on the requested
//! timeslice exactly like a real streaming encoder would.

use crate::encode::encoder::{EncoderBackend, EncoderEvent, EncoderSettings, StreamEncoder};
use crate::encode::format::{PREFERRED_FORMATS, VideoFormat};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::Fnv1a64;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub const STREAM_MAGIC: &[u8; 4] = b"TXRL";
pub const FRAME_RECORD_LEN: usize = 16;

/// Counters shared between a backend and every encoder it opened.
#[derive(Debug, Default)]
pub struct EncoderStats {
    opened: AtomicU64,
    frames: AtomicU64,
    chunks: AtomicU64,
    stop_requests: AtomicU64,
}

impl EncoderStats {
    pub fn opened(&self) -> u64 {
        self.opened.load(Ordering::Relaxed)
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Chunks handed out, including empty ones.
    pub fn chunks(&self) -> u64 {
        self.chunks.load(Ordering::Relaxed)
    }

    pub fn stop_requests(&self) -> u64 {
        self.stop_requests.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Debug)]
pub struct InMemoryBackend {
    formats: Vec<VideoFormat>,
    emit_empty_chunks: bool,
    header: bool,
    stop_error: Option<String>,
    stats: Arc<EncoderStats>,
}

impl InMemoryBackend {
    /// Backend supporting every preferred format.
    pub fn new() -> Self {
        Self {
            formats: PREFERRED_FORMATS.to_vec(),
            emit_empty_chunks: false,
            header: true,
            stop_error: None,
            stats: Arc::new(EncoderStats::default()),
        }
    }

    /// Only the given formats are reported as supported.
    pub fn with_formats(mut self, formats: impl IntoIterator<Item = VideoFormat>) -> Self {
        self.formats = formats.into_iter().collect();
        self
    }

    /// Interleave a zero-byte chunk before every real one.
    pub fn with_empty_chunks(mut self, enabled: bool) -> Self {
        self.emit_empty_chunks = enabled;
        self
    }

    /// Skip the stream header, so a stream with no frames is zero bytes long.
    pub fn headerless(mut self) -> Self {
        self.header = false;
        self
    }

    /// Report `message` as an encoder error right before acknowledging a stop, like an encoder
    /// process that exits with a failure after flushing what it had.
    pub fn failing_on_stop(mut self, message: impl Into<String>) -> Self {
        self.stop_error = Some(message.into());
        self
    }

    pub fn stats(&self) -> Arc<EncoderStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderBackend for InMemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn supports(&self, format: &VideoFormat) -> bool {
        self.formats.contains(format)
    }

    fn open(
        &self,
        format: VideoFormat,
        settings: &EncoderSettings,
    ) -> ReelResult<Box<dyn StreamEncoder>> {
        if !self.supports(&format) {
            return Err(ReelError::unsupported_format(format!(
                "memory backend was not configured for {format}"
            )));
        }
        self.stats.opened.fetch_add(1, Ordering::Relaxed);

        let mut pending = Vec::new();
        if self.header {
            pending.extend_from_slice(STREAM_MAGIC);
            pending.extend_from_slice(&settings.width.to_le_bytes());
            pending.extend_from_slice(&settings.height.to_le_bytes());
            pending.extend_from_slice(&settings.fps.to_le_bytes());
            pending.extend_from_slice(&(format.mime_type.len() as u32).to_le_bytes());
            pending.extend_from_slice(format.mime_type.as_bytes());
        }

        Ok(Box::new(InMemoryEncoder {
            format,
            settings: *settings,
            emit_empty_chunks: self.emit_empty_chunks,
            stop_error: self.stop_error.clone(),
            stats: Arc::clone(&self.stats),
            pending,
            events: VecDeque::new(),
            slice_started_ms: 0.0,
            last_ts: None,
            stopping: false,
            stopped_delivered: false,
        }))
    }
}

struct InMemoryEncoder {
    format: VideoFormat,
    settings: EncoderSettings,
    emit_empty_chunks: bool,
    stop_error: Option<String>,
    stats: Arc<EncoderStats>,
    pending: Vec<u8>,
    events: VecDeque<EncoderEvent>,
    slice_started_ms: f64,
    last_ts: Option<f64>,
    stopping: bool,
    stopped_delivered: bool,
}

impl InMemoryEncoder {
    fn cut_chunk(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        if self.emit_empty_chunks {
            self.events.push_back(EncoderEvent::Chunk(Vec::new()));
            self.stats.chunks.fetch_add(1, Ordering::Relaxed);
        }
        let chunk = std::mem::take(&mut self.pending);
        self.events.push_back(EncoderEvent::Chunk(chunk));
        self.stats.chunks.fetch_add(1, Ordering::Relaxed);
    }

    fn next_event(&mut self) -> Option<EncoderEvent> {
        let ev = self.events.pop_front()?;
        if ev == EncoderEvent::Stopped {
            self.stopped_delivered = true;
        }
        Some(ev)
    }
}

impl StreamEncoder for InMemoryEncoder {
    fn format(&self) -> VideoFormat {
        self.format
    }

    fn write_frame(&mut self, premul_rgba8: &[u8], timestamp_ms: f64) -> ReelResult<()> {
        if self.stopping {
            return Err(ReelError::encode("memory encoder is stopping"));
        }
        if premul_rgba8.len() != self.settings.frame_len() {
            return Err(ReelError::encode(format!(
                "frame is {} bytes, expected {}",
                premul_rgba8.len(),
                self.settings.frame_len()
            )));
        }
        if let Some(last) = self.last_ts
            && timestamp_ms < last
        {
            return Err(ReelError::encode("frame timestamps must not go backwards"));
        }
        self.last_ts = Some(timestamp_ms);

        let mut digest = Fnv1a64::new_default();
        digest.write_bytes(premul_rgba8);
        self.pending
            .extend_from_slice(&timestamp_ms.to_bits().to_le_bytes());
        self.pending
            .extend_from_slice(&digest.finish().to_le_bytes());
        self.stats.frames.fetch_add(1, Ordering::Relaxed);

        if timestamp_ms - self.slice_started_ms >= f64::from(self.settings.timeslice_ms) {
            self.cut_chunk();
            self.slice_started_ms = timestamp_ms;
        }
        Ok(())
    }

    fn poll_event(&mut self) -> Option<EncoderEvent> {
        self.next_event()
    }

    fn request_stop(&mut self) -> ReelResult<()> {
        if self.stopping {
            return Err(ReelError::encoder_stop(
                "memory encoder was already asked to stop",
            ));
        }
        self.stopping = true;
        self.stats.stop_requests.fetch_add(1, Ordering::Relaxed);
        self.cut_chunk();
        if let Some(message) = self.stop_error.take() {
            self.events.push_back(EncoderEvent::Error(message));
        }
        self.events.push_back(EncoderEvent::Stopped);
        Ok(())
    }

    fn wait_event(&mut self) -> Option<EncoderEvent> {
        // Nothing is asynchronous here: events only exist once they were queued.
        if self.stopped_delivered {
            return None;
        }
        self.next_event()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/memory.rs"]
mod tests;

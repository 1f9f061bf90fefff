use crate::encode::format::VideoFormat;
use crate::foundation::error::{ReelError, ReelResult};

/// Shortest chunking interval requested from an encoder.
pub const MIN_TIMESLICE_MS: u32 = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub bitrate_bps: u32,
    /// How often the encoder hands out a chunk: `max(1000 / fps, 16)` ms.
    pub timeslice_ms: u32,
}

impl EncoderSettings {
    pub fn new(width: u32, height: u32, fps: u32, bitrate_bps: u32) -> ReelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReelError::invalid_config(
                "encoder width/height must be non-zero",
            ));
        }
        if fps == 0 {
            return Err(ReelError::invalid_config("encoder fps must be non-zero"));
        }
        if bitrate_bps == 0 {
            return Err(ReelError::invalid_config("encoder bitrate must be non-zero"));
        }
        Ok(Self {
            width,
            height,
            fps,
            bitrate_bps,
            timeslice_ms: timeslice_ms(fps),
        })
    }

    /// Bytes in one RGBA8 frame.
    pub fn frame_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

pub fn timeslice_ms(fps: u32) -> u32 {
    (1000 / fps.max(1)).max(MIN_TIMESLICE_MS)
}

/// Notification delivered by a running encoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncoderEvent {
    /// Next piece of the encoded stream, in encoding order.
    Chunk(Vec<u8>),
    /// Stop acknowledgment. Always the last event.
    Stopped,
    /// The encoder failed; a `Stopped` still follows.
    Error(String),
}

/// A streaming encoder consuming premultiplied RGBA8 frames.
pub trait StreamEncoder {
    fn format(&self) -> VideoFormat;

    /// Encode one frame captured at `timestamp_ms` since the stream began.
    fn write_frame(&mut self, premul_rgba8: &[u8], timestamp_ms: f64) -> ReelResult<()>;

    /// Next pending event, without blocking.
    fn poll_event(&mut self) -> Option<EncoderEvent>;

    /// Ask the encoder to flush and stop. Fails with `EncoderStopFailure` if a stop was already
    /// requested.
    fn request_stop(&mut self) -> ReelResult<()>;

    /// Next event, blocking until one is available. Returns `None` only after `Stopped` was
    /// delivered.
    fn wait_event(&mut self) -> Option<EncoderEvent>;
}

/// Factory for encoders; reports which formats it can produce.
pub trait EncoderBackend {
    fn name(&self) -> &str;

    fn supports(&self, format: &VideoFormat) -> bool;

    fn open(
        &self,
        format: VideoFormat,
        settings: &EncoderSettings,
    ) -> ReelResult<Box<dyn StreamEncoder>>;
}

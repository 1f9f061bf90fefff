pub mod encoder;
pub mod ffmpeg;
pub mod format;
pub mod memory;

pub use encoder::{EncoderBackend, EncoderEvent, EncoderSettings, StreamEncoder};
pub use ffmpeg::{FfmpegBackend, is_ffmpeg_on_path};
pub use format::{PREFERRED_FORMATS, VideoFormat, negotiate};
pub use memory::{EncoderStats, InMemoryBackend};

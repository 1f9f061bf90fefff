use crate::encode::encoder::EncoderBackend;
use crate::foundation::error::{ReelError, ReelResult};

/// One codec/container combination the capture pipeline may produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VideoFormat {
    /// Mime type the artifact is tagged with.
    pub mime_type: &'static str,
    /// File extension without the dot.
    pub extension: &'static str,
    /// Encoder name as ffmpeg knows it; `None` lets the container pick its default codec.
    pub codec: Option<&'static str>,
    /// Output container (ffmpeg muxer name).
    pub container: &'static str,
}

impl VideoFormat {
    pub const VP9_WEBM: Self = Self {
        mime_type: "video/webm;codecs=vp9",
        extension: "webm",
        codec: Some("libvpx-vp9"),
        container: "webm",
    };

    pub const VP8_WEBM: Self = Self {
        mime_type: "video/webm;codecs=vp8",
        extension: "webm",
        codec: Some("libvpx"),
        container: "webm",
    };

    pub const MATROSKA: Self = Self {
        mime_type: "video/x-matroska",
        extension: "mkv",
        codec: None,
        container: "matroska",
    };

    /// The mime type without codec parameters, e.g. `video/webm`.
    pub fn container_mime(&self) -> &'static str {
        self.mime_type
            .split_once(';')
            .map_or(self.mime_type, |(base, _)| base)
    }
}

impl std::fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type)
    }
}

/// Formats in order of preference.
pub const PREFERRED_FORMATS: [VideoFormat; 3] = [
    VideoFormat::VP9_WEBM,
    VideoFormat::VP8_WEBM,
    VideoFormat::MATROSKA,
];

/// Pick the first entry of `preference` that `backend` can encode.
pub fn negotiate_from(
    backend: &dyn EncoderBackend,
    preference: &[VideoFormat],
) -> ReelResult<VideoFormat> {
    for format in preference {
        if backend.supports(format) {
            tracing::debug!(backend = backend.name(), format = %format, "negotiated video format");
            return Ok(*format);
        }
        tracing::debug!(backend = backend.name(), format = %format, "format not supported");
    }

    let tried: Vec<&str> = preference.iter().map(|f| f.mime_type).collect();
    Err(ReelError::unsupported_format(format!(
        "backend '{}' supports none of [{}]",
        backend.name(),
        tried.join(", ")
    )))
}

pub fn negotiate(backend: &dyn EncoderBackend) -> ReelResult<VideoFormat> {
    negotiate_from(backend, &PREFERRED_FORMATS)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/format.rs"]
mod tests;

use crate::capture::artifact::{ArtifactStore, EncodedArtifact};
use crate::capture::stream::FrameStream;
use crate::encode::encoder::{EncoderBackend, EncoderEvent, EncoderSettings, StreamEncoder};
use crate::encode::format::{PREFERRED_FORMATS, VideoFormat, negotiate_from};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::surface::Surface;

/// What `begin` settled on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderHandle {
    pub format: VideoFormat,
    pub settings: EncoderSettings,
}

struct ActiveCapture {
    handle: EncoderHandle,
    encoder: Box<dyn StreamEncoder>,
    stream: FrameStream,
    chunks: Vec<Vec<u8>>,
    buffered_bytes: u64,
    dropped_empty: u64,
    stop_requested: bool,
    stopped: bool,
    errors: Vec<String>,
}

impl ActiveCapture {
    fn handle_event(&mut self, ev: EncoderEvent) {
        match ev {
            EncoderEvent::Chunk(bytes) if bytes.is_empty() => {
                self.dropped_empty += 1;
                tracing::debug!("dropped zero-byte chunk");
            }
            EncoderEvent::Chunk(bytes) => {
                self.buffered_bytes += bytes.len() as u64;
                tracing::debug!(
                    len = bytes.len(),
                    index = self.chunks.len(),
                    "buffered chunk"
                );
                self.chunks.push(bytes);
            }
            EncoderEvent::Error(message) => {
                tracing::warn!(%message, "encoder reported an error");
                self.errors.push(message);
            }
            EncoderEvent::Stopped => self.stopped = true,
        }
    }
}

/// Streams the drawing surface into an encoder and buffers the encoded chunks.
pub struct CapturePipeline {
    backend: Box<dyn EncoderBackend>,
    preference: Vec<VideoFormat>,
    active: Option<ActiveCapture>,
}

impl CapturePipeline {
    pub fn new(backend: Box<dyn EncoderBackend>) -> Self {
        Self {
            backend,
            preference: PREFERRED_FORMATS.to_vec(),
            active: None,
        }
    }

    /// Replace the format preference list (first supported entry wins).
    pub fn with_preference(mut self, preference: Vec<VideoFormat>) -> Self {
        self.preference = preference;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Formats from the preference list the backend supports, in order.
    pub fn supported_formats(&self) -> Vec<VideoFormat> {
        self.preference
            .iter()
            .copied()
            .filter(|f| self.backend.supports(f))
            .collect()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn handle(&self) -> Option<EncoderHandle> {
        self.active.as_ref().map(|a| a.handle)
    }

    /// Frames written to the encoder in the current capture.
    pub fn frames_captured(&self) -> u64 {
        self.active.as_ref().map_or(0, |a| a.stream.emitted())
    }

    pub fn chunk_count(&self) -> usize {
        self.active.as_ref().map_or(0, |a| a.chunks.len())
    }

    pub fn buffered_bytes(&self) -> u64 {
        self.active.as_ref().map_or(0, |a| a.buffered_bytes)
    }

    pub fn dropped_empty_chunks(&self) -> u64 {
        self.active.as_ref().map_or(0, |a| a.dropped_empty)
    }

    /// Negotiate a format and start an encoder fed from `surface` at `fps`.
    ///
    /// Fails with `UnsupportedFormat` when nothing in the preference list is supported; no
    /// encoder is created in that case.
    pub fn begin(
        &mut self,
        surface: &Surface,
        fps: u32,
        bitrate_bps: u32,
        frame_limit: Option<u64>,
    ) -> ReelResult<EncoderHandle> {
        if self.active.is_some() {
            return Err(ReelError::encode("a capture is already active"));
        }
        if !surface.is_available() {
            return Err(ReelError::surface_unavailable(
                "cannot capture from a released surface",
            ));
        }

        let settings = EncoderSettings::new(surface.width(), surface.height(), fps, bitrate_bps)?;
        let format = negotiate_from(self.backend.as_ref(), &self.preference)?;
        let encoder = self.backend.open(format, &settings)?;

        let handle = EncoderHandle { format, settings };
        self.active = Some(ActiveCapture {
            handle,
            encoder,
            stream: FrameStream::new(fps, frame_limit),
            chunks: Vec::new(),
            buffered_bytes: 0,
            dropped_empty: 0,
            stop_requested: false,
            stopped: false,
            errors: Vec::new(),
        });
        tracing::info!(
            backend = self.backend.name(),
            format = %format,
            timeslice_ms = settings.timeslice_ms,
            "capture started"
        );
        Ok(handle)
    }

    /// Feed every frame due at `elapsed_ms` from the current surface content.
    /// Returns the number of frames written.
    pub fn capture(&mut self, surface: &Surface, elapsed_ms: f64) -> ReelResult<u64> {
        let Some(active) = self.active.as_mut() else {
            return Ok(0);
        };
        if active.stop_requested {
            return Ok(0);
        }
        let pixels = surface.data()?;

        let due = active.stream.take_due(elapsed_ms);
        let count = due.end - due.start;
        for index in due {
            let ts = active.stream.timestamp_ms(index);
            active.encoder.write_frame(pixels, ts)?;
        }
        Ok(count)
    }

    /// Collect whatever the encoder produced since the last call. Returns the number of events.
    pub fn pump(&mut self) -> usize {
        let Some(active) = self.active.as_mut() else {
            return 0;
        };
        let mut n = 0;
        while let Some(ev) = active.encoder.poll_event() {
            active.handle_event(ev);
            n += 1;
        }
        n
    }

    /// Stop the encoder, wait for its stop acknowledgment, and mint the artifact from every
    /// buffered chunk. An encoder that produced nothing yields a zero-size artifact. Errors the
    /// encoder reported along the way travel with the artifact in `encoder_errors`.
    #[tracing::instrument(skip_all)]
    pub fn finalize(&mut self, store: &mut ArtifactStore) -> ReelResult<EncodedArtifact> {
        let mut active = self
            .active
            .take()
            .ok_or_else(|| ReelError::encode("finalize called without an active capture"))?;

        if !active.stop_requested {
            active.stop_requested = true;
            if let Err(e) = active.encoder.request_stop() {
                tracing::warn!(error = %e, "encoder stop request failed");
            }
        }
        while !active.stopped {
            match active.encoder.wait_event() {
                Some(ev) => active.handle_event(ev),
                None => {
                    tracing::warn!("encoder went away without acknowledging stop");
                    break;
                }
            }
        }

        let mut artifact = store.mint(std::mem::take(&mut active.chunks), active.handle.format);
        if !active.errors.is_empty() {
            tracing::warn!(
                errors = active.errors.len(),
                "artifact was finalized after encoder errors"
            );
            artifact.encoder_errors = std::mem::take(&mut active.errors);
        }
        tracing::info!(
            handle = %artifact.handle,
            mime = %artifact.mime_type,
            size_bytes = artifact.size_bytes,
            frames = active.stream.emitted(),
            "capture finalized"
        );
        Ok(artifact)
    }

    /// Best-effort stop used during teardown. Failures are logged, never returned.
    pub fn abort(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };
        if !active.stop_requested
            && let Err(e) = active.encoder.request_stop()
        {
            tracing::warn!(error = %e, "ignoring encoder stop failure during teardown");
        }
        tracing::debug!(
            discarded_chunks = active.chunks.len(),
            "capture aborted"
        );
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/pipeline.rs"]
mod tests;

use crate::encode::format::VideoFormat;
use crate::foundation::error::ReelResult;
use anyhow::Context as _;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Opaque reference to an artifact's bytes. Valid until released through the
/// [`ArtifactStore`] that minted it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactHandle(u64);

impl ArtifactHandle {
    pub fn id(self) -> u64 {
        self.0
    }

    pub fn uri(self) -> String {
        format!("blob:textreel/{}", self.0)
    }
}

impl std::fmt::Display for ArtifactHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "blob:textreel/{}", self.0)
    }
}

/// A finished recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedArtifact {
    pub handle: ArtifactHandle,
    pub mime_type: String,
    pub extension: String,
    pub size_bytes: u64,
    /// Number of non-empty encoder chunks concatenated into the artifact.
    pub chunk_count: usize,
    pub created_unix_ms: u64,
    /// Failures the encoder reported before it stopped. When not empty the stream may be
    /// truncated or unplayable.
    pub encoder_errors: Vec<String>,
}

impl EncodedArtifact {
    /// `text-video-<created_unix_ms>.<ext>`
    pub fn is_clean(&self) -> bool {
        self.encoder_errors.is_empty()
    }

    pub fn suggested_filename(&self) -> String {
        format!("text-video-{}.{}", self.created_unix_ms, self.extension)
    }
}

/// Owns artifact bytes behind handles.
#[derive(Debug, Default)]
pub struct ArtifactStore {
    next_id: u64,
    blobs: BTreeMap<ArtifactHandle, Vec<u8>>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenate `chunks` in order into a new artifact.
    pub fn mint(&mut self, chunks: Vec<Vec<u8>>, format: VideoFormat) -> EncodedArtifact {
        let chunk_count = chunks.len();
        let bytes = chunks.concat();

        self.next_id += 1;
        let handle = ArtifactHandle(self.next_id);
        let artifact = EncodedArtifact {
            handle,
            mime_type: format.mime_type.to_owned(),
            extension: format.extension.to_owned(),
            size_bytes: bytes.len() as u64,
            chunk_count,
            created_unix_ms: unix_ms_now(),
            encoder_errors: Vec::new(),
        };
        self.blobs.insert(handle, bytes);
        tracing::debug!(handle = %handle, size_bytes = artifact.size_bytes, "artifact minted");
        artifact
    }

    /// Bytes behind `handle`, or `None` once it was released.
    pub fn bytes(&self, handle: ArtifactHandle) -> Option<&[u8]> {
        self.blobs.get(&handle).map(Vec::as_slice)
    }

    pub fn is_live(&self, handle: ArtifactHandle) -> bool {
        self.blobs.contains_key(&handle)
    }

    /// Release `handle`. Returns whether it was live.
    pub fn release(&mut self, handle: ArtifactHandle) -> bool {
        let released = self.blobs.remove(&handle).is_some();
        if released {
            tracing::debug!(handle = %handle, "artifact released");
        }
        released
    }

    /// Handles minted and not yet released.
    pub fn live_count(&self) -> usize {
        self.blobs.len()
    }

    /// Write the artifact into `dir` under its suggested filename.
    pub fn save(&self, artifact: &EncodedArtifact, dir: &Path) -> ReelResult<PathBuf> {
        let bytes = self.bytes(artifact.handle).with_context(|| {
            format!("artifact {} was already released", artifact.handle)
        })?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory '{}'", dir.display()))?;
        let path = dir.join(artifact.suggested_filename());
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        Ok(path)
    }
}

fn unix_ms_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "../../tests/unit/capture/artifact.rs"]
mod tests;

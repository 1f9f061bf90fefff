pub mod artifact;
pub mod pipeline;
pub mod stream;

pub use artifact::{ArtifactHandle, ArtifactStore, EncodedArtifact};
pub use pipeline::{CapturePipeline, EncoderHandle};
pub use stream::FrameStream;

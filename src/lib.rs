//! Textreel renders an animated title card on the CPU and records it live into a video stream.
//!
//! A recording is driven by a [`SessionController`]:
//!
//! - Describe what to draw with a [`RenderConfig`] and for how long with a [`TimelineConfig`]
//! - Pick a [`FrameScheduler`] (wall clock or simulated) and an [`EncoderBackend`]
//! - `start`, step until the clock completes (or `stop`), then read the [`EncodedArtifact`]
//!
//! Frames are composed into a backend-agnostic [`ScenePlan`] by [`compose_scene`] and rasterized
//! by [`SceneRenderer`] into a premultiplied RGBA8 [`Surface`].
#![forbid(unsafe_code)]

mod foundation;

/// Live capture of rendered frames into an encoder.
pub mod capture;
/// Video stream encoders and format negotiation.
pub mod encode;
/// Scene composition and CPU rasterization.
pub mod render;
pub mod scene;
/// Recording lifecycle.
pub mod session;
/// Animation clock and frame scheduling.
pub mod timeline;

pub use crate::foundation::core::{Canvas, Point, Rect, Rgba8};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::capture::{ArtifactHandle, ArtifactStore, CapturePipeline, EncodedArtifact};
pub use crate::encode::{
    EncoderBackend, FfmpegBackend, InMemoryBackend, PREFERRED_FORMATS, VideoFormat,
};
pub use crate::render::SceneRenderer;
pub use crate::render::plan::{DrawOp, ScenePlan};
pub use crate::render::scene::compose_scene;
pub use crate::render::surface::Surface;
pub use crate::scene::config::{
    BackgroundStyle, CaptureSettings, RecordingConfig, RenderConfig, ResolutionPreset,
    TimelineConfig,
};
pub use crate::session::{
    SessionConfig, SessionController, SessionEvent, SessionSnapshot, SessionState, StopSignal,
};
pub use crate::timeline::{
    AnimationClock, FrameScheduler, RealtimeScheduler, SimulatedScheduler, TickHandle,
};

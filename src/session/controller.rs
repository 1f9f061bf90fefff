use crate::capture::artifact::{ArtifactStore, EncodedArtifact};
use crate::capture::pipeline::CapturePipeline;
use crate::encode::encoder::EncoderBackend;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::SceneRenderer;
use crate::render::surface::Surface;
use crate::scene::config::{CaptureSettings, RecordingConfig, RenderConfig, TimelineConfig};
use crate::session::state::{SessionEvent, SessionSnapshot, SessionState};
use crate::timeline::clock::{AnimationClock, Completion};
use crate::timeline::scheduler::{FrameScheduler, TickHandle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cross-thread request to end the current recording (e.g. from a Ctrl-C handler).
///
/// Raising it is observed on the next clock tick, which then completes the run through the
/// normal finalize path.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

type Observer = Box<dyn FnMut(&SessionEvent)>;

/// Recording parameters applied together at the next `start`.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub render: RenderConfig,
    pub timeline: TimelineConfig,
    pub capture: CaptureSettings,
}

impl SessionConfig {
    pub fn validate(&self) -> ReelResult<()> {
        self.render.validate()?;
        self.timeline.validate()?;
        self.capture.validate()
    }
}

impl TryFrom<RecordingConfig> for SessionConfig {
    type Error = ReelError;

    fn try_from(value: RecordingConfig) -> ReelResult<Self> {
        let (render, timeline, capture) = value.into_parts()?;
        Ok(Self {
            render,
            timeline,
            capture,
        })
    }
}

/// Owns one recording lifecycle: renderer, drawing surface, frame scheduler, capture pipeline
/// and the artifacts it produced.
///
/// Everything runs on the caller's thread. [`SessionController::run_until_complete`] is the
/// frame loop: it waits for each scheduled tick, renders, feeds the encoder and reschedules
/// while the session is recording.
pub struct SessionController {
    config: SessionConfig,
    next_config: Option<SessionConfig>,
    renderer: SceneRenderer,
    surface: Surface,
    scheduler: Box<dyn FrameScheduler>,
    capture: CapturePipeline,
    store: ArtifactStore,

    state: SessionState,
    clock: Option<AnimationClock>,
    pending_tick: Option<TickHandle>,
    start_timestamp_ms: Option<f64>,
    progress: f64,
    elapsed_ms: f64,
    frames_rendered: u64,
    artifact: Option<EncodedArtifact>,
    last_error: Option<String>,

    stop_signal: StopSignal,
    observer: Option<Observer>,
    torn_down: bool,
}

impl SessionController {
    /// Validate `config` and allocate the drawing surface. Nothing starts yet.
    pub fn new(
        config: SessionConfig,
        scheduler: Box<dyn FrameScheduler>,
        backend: Box<dyn EncoderBackend>,
    ) -> ReelResult<Self> {
        config.validate()?;
        let surface = Surface::new(config.render.canvas())?;
        Ok(Self {
            config,
            next_config: None,
            renderer: SceneRenderer::new(),
            surface,
            scheduler,
            capture: CapturePipeline::new(backend),
            store: ArtifactStore::new(),
            state: SessionState::Idle,
            clock: None,
            pending_tick: None,
            start_timestamp_ms: None,
            progress: 0.0,
            elapsed_ms: 0.0,
            frames_rendered: 0,
            artifact: None,
            last_error: None,
            stop_signal: StopSignal::default(),
            observer: None,
            torn_down: false,
        })
    }

    /// Use an existing renderer (e.g. one with extra font directories).
    pub fn with_renderer(mut self, renderer: SceneRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_capture(mut self, capture: CapturePipeline) -> Self {
        self.capture = capture;
        self
    }

    /// Receive every [`SessionEvent`] as it happens.
    pub fn set_observer(&mut self, observer: impl FnMut(&SessionEvent) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop_signal.clone()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn artifact(&self) -> Option<&EncodedArtifact> {
        self.artifact.as_ref()
    }

    /// Bytes of the current artifact, while its handle is live.
    pub fn artifact_bytes(&self) -> Option<&[u8]> {
        self.artifact
            .as_ref()
            .and_then(|a| self.store.bytes(a.handle))
    }

    pub fn artifact_store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Frames the renderer drew in the current or last recording.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn capture(&self) -> &CapturePipeline {
        &self.capture
    }

    pub fn start_timestamp_ms(&self) -> Option<f64> {
        self.start_timestamp_ms
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            progress: self.progress,
            elapsed_ms: self.elapsed_ms,
            frames_captured: self.capture.frames_captured(),
            mime_type: self.artifact.as_ref().map(|a| a.mime_type.clone()),
            size_bytes: self.artifact.as_ref().map(|a| a.size_bytes),
            artifact_uri: self.artifact.as_ref().map(|a| a.handle.uri()),
            last_error: self.last_error.clone(),
        }
    }

    /// Queue new parameters for the next recording. Rejected up front when out of range.
    pub fn configure(&mut self, config: SessionConfig) -> ReelResult<()> {
        config.validate()?;
        self.next_config = Some(config);
        Ok(())
    }

    /// Drop the drawing surface, as when the host tears it down mid-session.
    pub fn release_surface(&mut self) {
        self.surface.release();
    }

    /// Begin a recording. Returns `Ok(false)` without touching anything while a recording is
    /// already in progress.
    #[tracing::instrument(skip(self), fields(state = %self.state))]
    pub fn start(&mut self) -> ReelResult<bool> {
        if self.torn_down {
            return Err(ReelError::surface_unavailable("session was torn down"));
        }
        if !self.state.can_start() {
            tracing::warn!(state = %self.state, "start ignored: a recording is in progress");
            return Ok(false);
        }

        if let Some(next) = self.next_config.take() {
            self.config = next;
        }
        if self.surface.canvas() != self.config.render.canvas() || !self.surface.is_available() {
            self.surface = Surface::new(self.config.render.canvas())?;
        }

        if let Some(previous) = self.artifact.take() {
            self.store.release(previous.handle);
        }
        self.progress = 0.0;
        self.elapsed_ms = 0.0;
        self.frames_rendered = 0;
        self.last_error = None;
        self.stop_signal.reset();

        let timeline = self.config.timeline;
        let begun = self.capture.begin(
            &self.surface,
            timeline.frames_per_second,
            self.config.capture.bitrate_bps,
            Some(timeline.total_frames()),
        );
        if let Err(e) = begun {
            tracing::warn!(error = %e, "capture could not begin");
            self.fail(&e);
            if self.state == SessionState::Complete {
                self.transition(SessionState::Idle);
            }
            return Err(e);
        }

        let now = self.scheduler.now_ms();
        let clock = match AnimationClock::start(now, timeline.total_duration_ms()) {
            Ok(clock) => clock,
            Err(e) => {
                self.capture.abort();
                return Err(e);
            }
        };
        self.clock = Some(clock);
        self.start_timestamp_ms = Some(now);
        self.transition(SessionState::Recording);
        tracing::info!(
            start_ms = now,
            total_ms = timeline.total_duration_ms(),
            fps = timeline.frames_per_second,
            "recording started"
        );

        // Frame 0 shows the scene at t = 0, before the first tick arrives.
        if let Err(e) = self.render_and_capture(now, 0.0) {
            tracing::warn!(error = %e, "opening frame failed; stopping");
            self.fail(&e);
            self.cancel_clock();
            return self.finalize().map(|()| true);
        }
        self.capture.pump();
        self.pending_tick = Some(self.scheduler.request_frame());
        Ok(true)
    }

    /// Handle a fired tick. Ticks other than the one this session scheduled are ignored.
    pub fn on_frame(&mut self, handle: TickHandle, now_ms: f64) -> ReelResult<()> {
        if self.pending_tick != Some(handle) {
            tracing::debug!(tick = handle.id(), "ignoring stale tick");
            return Ok(());
        }
        self.pending_tick = None;
        if self.state != SessionState::Recording {
            return Ok(());
        }

        let Some(clock) = self.clock.as_mut() else {
            return Ok(());
        };
        if self.stop_signal.is_raised() {
            clock.raise_stop();
        }
        let Some(tick) = clock.tick(now_ms) else {
            return Ok(());
        };

        if tick.completion != Some(Completion::Stopped)
            && let Err(e) = self.render_and_capture(tick.now_ms, tick.elapsed_ms)
        {
            // Mid-session failures end the run through finalize instead of stalling it.
            if e.is_surface_loss() {
                tracing::warn!(error = %e, "surface lost while recording; stopping");
            } else {
                tracing::warn!(error = %e, "frame failed while recording; stopping");
            }
            self.fail(&e);
            self.cancel_clock();
            return self.finalize();
        }
        self.capture.pump();

        self.progress = tick.progress;
        self.elapsed_ms = tick.elapsed_ms;
        self.emit(SessionEvent::Progress {
            fraction: tick.progress,
            elapsed_ms: tick.elapsed_ms,
        });

        if tick.is_final() {
            tracing::debug!(completion = ?tick.completion, "clock completed");
            self.finalize()
        } else {
            self.pending_tick = Some(self.scheduler.request_frame());
            Ok(())
        }
    }

    fn render_and_capture(&mut self, now_ms: f64, elapsed_ms: f64) -> ReelResult<()> {
        self.renderer
            .render(&mut self.surface, now_ms, &self.config.render)?;
        self.frames_rendered += 1;
        let written = self.capture.capture(&self.surface, elapsed_ms)?;
        tracing::trace!(now_ms, elapsed_ms, frames = written, "tick");
        Ok(())
    }

    /// One loop iteration: collect encoder output, wait for the next tick and handle it.
    /// Returns `false` when there is nothing left to wait for.
    pub fn step(&mut self) -> ReelResult<bool> {
        if self.state != SessionState::Recording {
            return Ok(false);
        }
        self.capture.pump();
        match self.scheduler.wait_frame() {
            Some((handle, now_ms)) => {
                self.on_frame(handle, now_ms)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drive the frame loop while recording. Returns the artifact once the run completed.
    pub fn run_until_complete(&mut self) -> ReelResult<Option<&EncodedArtifact>> {
        while self.state == SessionState::Recording {
            if !self.step()? {
                break;
            }
        }
        if self.state == SessionState::Recording {
            // No tick pending but still recording: nothing would ever complete the run.
            tracing::warn!("frame loop ran dry while recording; finalizing");
            self.cancel_clock();
            self.finalize()?;
        }
        Ok(self.artifact.as_ref())
    }

    /// Stop a recording early. Only acts while recording; calling it again is a no-op.
    pub fn stop(&mut self) -> ReelResult<bool> {
        if self.state != SessionState::Recording {
            return Ok(false);
        }
        tracing::info!(elapsed_ms = self.elapsed_ms, "recording stopped");
        self.cancel_clock();
        self.finalize()?;
        Ok(true)
    }

    fn cancel_clock(&mut self) {
        if let Some(handle) = self.pending_tick.take() {
            self.scheduler.cancel_frame(handle);
        }
        if let Some(clock) = self.clock.as_mut() {
            clock.cancel();
        }
    }

    #[tracing::instrument(skip(self))]
    fn finalize(&mut self) -> ReelResult<()> {
        self.transition(SessionState::Finalizing);
        if let Some(handle) = self.pending_tick.take() {
            self.scheduler.cancel_frame(handle);
        }

        match self.capture.finalize(&mut self.store) {
            Ok(artifact) => {
                for message in &artifact.encoder_errors {
                    self.fail(&ReelError::encode(message.clone()));
                }
                self.artifact = Some(artifact.clone());
                self.emit(SessionEvent::ArtifactReady(artifact));
                self.transition(SessionState::Complete);
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                self.transition(SessionState::Idle);
                Err(e)
            }
        }
    }

    /// Cancel any pending tick, stop the encoder (best effort) and release the artifact.
    /// Runs once; later calls do nothing.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        self.cancel_clock();
        self.capture.abort();
        if let Some(artifact) = self.artifact.take() {
            self.store.release(artifact.handle);
        }
        if self.state != SessionState::Idle {
            let from = self.state;
            self.state = SessionState::Idle;
            self.emit(SessionEvent::StateChanged {
                from,
                to: SessionState::Idle,
            });
        }
        tracing::debug!(live_handles = self.store.live_count(), "session torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Write the current artifact into `dir` under its suggested filename.
    pub fn save_artifact(&self, dir: &Path) -> ReelResult<PathBuf> {
        let artifact = self
            .artifact
            .as_ref()
            .ok_or_else(|| ReelError::encode("no artifact to save"))?;
        self.store.save(artifact, dir)
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.state;
        if from == to {
            return;
        }
        if !from.can_transition_to(to) {
            tracing::warn!(%from, %to, "unexpected session transition");
        }
        self.state = to;
        tracing::debug!(%from, %to, "session state changed");
        self.emit(SessionEvent::StateChanged { from, to });
    }

    fn fail(&mut self, e: &ReelError) {
        let message = e.to_string();
        self.last_error = Some(message.clone());
        self.emit(SessionEvent::Error { message });
    }

    fn emit(&mut self, event: SessionEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&event);
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/controller.rs"]
mod tests;

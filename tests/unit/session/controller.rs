use super::*;
use crate::encode::format::VideoFormat;
use crate::encode::memory::{FRAME_RECORD_LEN, InMemoryBackend};
use crate::scene::config::{BackgroundStyle, ResolutionPreset};
use crate::timeline::scheduler::SimulatedScheduler;
use std::cell::RefCell;
use std::rc::Rc;

fn short_config() -> SessionConfig {
    SessionConfig {
        render: RenderConfig::new("Hi", "", BackgroundStyle::Waves, ResolutionPreset::P480),
        timeline: TimelineConfig::new(1, 10).unwrap(),
        capture: CaptureSettings::default(),
    }
}

fn controller(backend: InMemoryBackend) -> SessionController {
    SessionController::new(
        short_config(),
        Box::new(SimulatedScheduler::at_fps(10)),
        Box::new(backend),
    )
    .unwrap()
}

fn record_events(c: &mut SessionController) -> Rc<RefCell<Vec<SessionEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    c.set_observer(move |ev| sink.borrow_mut().push(ev.clone()));
    events
}

#[test]
fn invalid_configuration_is_rejected_before_anything_starts() {
    let mut cfg = short_config();
    cfg.render.width_px = 1000;
    let err = SessionController::new(
        cfg,
        Box::new(SimulatedScheduler::at_fps(10)),
        Box::new(InMemoryBackend::new()),
    )
    .err()
    .unwrap();
    assert!(matches!(err, ReelError::InvalidConfiguration(_)));

    let mut c = controller(InMemoryBackend::new());
    let mut bad = short_config();
    bad.timeline.duration_seconds = 31;
    assert!(c.configure(bad).is_err());
    assert_eq!(c.state(), SessionState::Idle);
}

#[test]
fn full_run_completes_with_progress_one() {
    let mut c = controller(InMemoryBackend::new());
    let events = record_events(&mut c);

    assert!(c.start().unwrap());
    assert_eq!(c.state(), SessionState::Recording);
    let artifact = c.run_until_complete().unwrap().cloned().unwrap();

    assert_eq!(c.state(), SessionState::Complete);
    assert_eq!(c.progress(), 1.0);
    assert!(artifact.size_bytes > 0);
    assert_eq!(c.artifact_bytes().map(<[u8]>::len), Some(artifact.size_bytes as usize));
    // The opening frame plus one per tick.
    assert_eq!(c.frames_rendered(), 11);

    let states: Vec<(SessionState, SessionState)> = events
        .borrow()
        .iter()
        .filter_map(|ev| match ev {
            SessionEvent::StateChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![
            (SessionState::Idle, SessionState::Recording),
            (SessionState::Recording, SessionState::Finalizing),
            (SessionState::Finalizing, SessionState::Complete),
        ]
    );
    let ready = events
        .borrow()
        .iter()
        .filter(|ev| matches!(ev, SessionEvent::ArtifactReady(_)))
        .count();
    assert_eq!(ready, 1);
}

#[test]
fn progress_events_never_decrease() {
    let mut c = controller(InMemoryBackend::new());
    let events = record_events(&mut c);
    c.start().unwrap();
    c.run_until_complete().unwrap();

    let fractions: Vec<f64> = events
        .borrow()
        .iter()
        .filter_map(|ev| match ev {
            SessionEvent::Progress { fraction, .. } => Some(*fraction),
            _ => None,
        })
        .collect();
    assert!(!fractions.is_empty());
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(fractions.last(), Some(&1.0));
}

#[test]
fn start_while_recording_is_a_no_op() {
    let mut c = controller(InMemoryBackend::new());
    c.start().unwrap();
    c.step().unwrap();
    c.step().unwrap();
    let before = c.snapshot();

    assert!(!c.start().unwrap());
    assert_eq!(c.snapshot(), before);
}

#[test]
fn stop_twice_finalizes_once() {
    let mut c = controller(InMemoryBackend::new());
    let events = record_events(&mut c);
    c.start().unwrap();
    c.step().unwrap();

    assert!(c.stop().unwrap());
    assert!(!c.stop().unwrap());
    assert_eq!(c.state(), SessionState::Complete);

    let finalizing = events
        .borrow()
        .iter()
        .filter(|ev| {
            matches!(
                ev,
                SessionEvent::StateChanged {
                    to: SessionState::Finalizing,
                    ..
                }
            )
        })
        .count();
    assert_eq!(finalizing, 1);
    assert!(c.progress() < 1.0);
}

#[test]
fn stop_when_idle_does_nothing() {
    let mut c = controller(InMemoryBackend::new());
    assert!(!c.stop().unwrap());
    assert_eq!(c.state(), SessionState::Idle);
    assert!(c.artifact().is_none());
}

#[test]
fn unsupported_format_keeps_session_idle() {
    let mut c = controller(InMemoryBackend::new().with_formats(Vec::<VideoFormat>::new()));
    let events = record_events(&mut c);
    let err = c.start().unwrap_err();
    assert!(matches!(err, ReelError::UnsupportedFormat(_)));
    assert_eq!(c.state(), SessionState::Idle);
    assert!(c.snapshot().last_error.is_some());
    assert!(
        events
            .borrow()
            .iter()
            .all(|ev| !matches!(ev, SessionEvent::StateChanged { .. }))
    );
}

#[test]
fn restart_releases_previous_artifact() {
    let mut c = controller(InMemoryBackend::new());
    c.start().unwrap();
    c.run_until_complete().unwrap();
    let first = c.artifact().cloned().unwrap();
    assert_eq!(c.artifact_store().live_count(), 1);

    assert!(c.start().unwrap());
    assert!(!c.artifact_store().is_live(first.handle));
    assert_eq!(c.progress(), 0.0);
    c.run_until_complete().unwrap();
    let second = c.artifact().cloned().unwrap();
    assert_ne!(first.handle, second.handle);
    assert_eq!(c.artifact_store().live_count(), 1);
}

#[test]
fn configure_applies_on_next_start() {
    let mut c = controller(InMemoryBackend::new());
    c.start().unwrap();
    let mut next = short_config();
    next.render = RenderConfig::new("Square", "", BackgroundStyle::Aurora, ResolutionPreset::Square);
    c.configure(next).unwrap();
    assert_eq!(c.surface().width(), 854);

    c.run_until_complete().unwrap();
    c.start().unwrap();
    assert_eq!(c.surface().width(), 1080);
    assert_eq!(c.config().render.title_text, "Square");
}

#[test]
fn surface_loss_mid_session_finalizes() {
    let mut c = controller(InMemoryBackend::new());
    let events = record_events(&mut c);
    c.start().unwrap();
    c.step().unwrap();
    c.release_surface();
    c.step().unwrap();

    assert_eq!(c.state(), SessionState::Complete);
    assert!(c.artifact().is_some());
    assert!(
        events
            .borrow()
            .iter()
            .any(|ev| matches!(ev, SessionEvent::Error { .. }))
    );
    assert!(!c.step().unwrap());
}

#[test]
fn encoder_failure_is_reported_on_the_completed_session() {
    let mut c = controller(InMemoryBackend::new().failing_on_stop("exit status 1"));
    let events = record_events(&mut c);
    c.start().unwrap();
    let artifact = c.run_until_complete().unwrap().cloned().unwrap();

    assert_eq!(c.state(), SessionState::Complete);
    assert!(!artifact.is_clean());
    assert!(artifact.size_bytes > 0);
    let last_error = c.snapshot().last_error.unwrap();
    assert!(last_error.contains("exit status 1"), "{last_error}");
    assert!(events.borrow().iter().any(
        |ev| matches!(ev, SessionEvent::Error { message } if message.contains("exit status 1"))
    ));
}

#[test]
fn clean_run_leaves_no_error() {
    let mut c = controller(InMemoryBackend::new());
    c.start().unwrap();
    let artifact = c.run_until_complete().unwrap().cloned().unwrap();
    assert!(artifact.is_clean());
    assert_eq!(c.snapshot().last_error, None);
}

#[test]
fn stop_signal_completes_on_next_tick() {
    let mut c = controller(InMemoryBackend::new());
    let signal = c.stop_signal();
    c.start().unwrap();
    c.step().unwrap();
    let rendered = c.frames_rendered();

    signal.raise();
    c.step().unwrap();
    assert_eq!(c.state(), SessionState::Complete);
    assert_eq!(c.frames_rendered(), rendered);
}

#[test]
fn stale_ticks_are_ignored() {
    let mut c = controller(InMemoryBackend::new());
    c.start().unwrap();
    c.on_frame(TickHandle(9999), 50.0).unwrap();
    assert_eq!(c.frames_rendered(), 1);
    assert_eq!(c.state(), SessionState::Recording);
}

#[test]
fn teardown_runs_once_and_releases_everything() {
    let backend = InMemoryBackend::new();
    let stats = backend.stats();
    let mut c = controller(backend);
    c.start().unwrap();
    c.step().unwrap();
    c.teardown();

    assert!(c.is_torn_down());
    assert_eq!(c.state(), SessionState::Idle);
    assert_eq!(c.artifact_store().live_count(), 0);
    assert_eq!(stats.stop_requests(), 1);
    assert!(!c.step().unwrap());

    c.teardown();
    assert_eq!(stats.stop_requests(), 1);
    assert!(c.start().is_err());
}

#[test]
fn teardown_without_recording_is_safe() {
    let mut c = controller(InMemoryBackend::new());
    c.teardown();
    assert_eq!(c.state(), SessionState::Idle);
    drop(c);
}

#[test]
fn same_tick_start_and_stop_keeps_only_the_opening_frame() {
    let backend = InMemoryBackend::new().headerless();
    let stats = backend.stats();
    let mut c = controller(backend);
    c.start().unwrap();
    assert!(c.stop().unwrap());
    assert_eq!(c.state(), SessionState::Complete);
    let artifact = c.artifact().unwrap();
    assert_eq!(artifact.size_bytes, FRAME_RECORD_LEN as u64);
    assert!(artifact.is_clean());
    assert_eq!(c.frames_rendered(), 1);
    assert_eq!(stats.frames(), 1);
}

#[test]
fn opening_frame_is_captured_at_start() {
    let backend = InMemoryBackend::new();
    let stats = backend.stats();
    let mut c = controller(backend);
    c.start().unwrap();

    assert_eq!(c.frames_rendered(), 1);
    assert_eq!(stats.frames(), 1);
    assert_eq!(c.snapshot().frames_captured, 1);
    assert_eq!(c.progress(), 0.0);

    // The first tick lands after one interval and only adds the frame that became due.
    c.step().unwrap();
    assert_eq!(stats.frames(), 2);
}

#[test]
fn injected_capture_pipeline_is_used() {
    let backend = InMemoryBackend::new().with_formats([VideoFormat::MATROSKA]);
    let mut c = controller(InMemoryBackend::new())
        .with_capture(CapturePipeline::new(Box::new(backend)));
    c.start().unwrap();
    c.run_until_complete().unwrap();
    assert_eq!(c.artifact().unwrap().mime_type, "video/x-matroska");
}

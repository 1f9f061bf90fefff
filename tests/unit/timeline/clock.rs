use super::*;

#[test]
fn rejects_non_positive_duration() {
    assert!(AnimationClock::start(0.0, 0.0).is_err());
    assert!(AnimationClock::start(0.0, -5.0).is_err());
    assert!(AnimationClock::start(f64::NAN, 1000.0).is_err());
}

#[test]
fn progress_is_monotone_and_exactly_one_on_completion() {
    let mut clock = AnimationClock::start(1000.0, 5000.0).unwrap();
    let mut last = 0.0;
    let mut completions = 0;
    let mut now = 1000.0;
    while let Some(tick) = clock.tick(now) {
        assert!(tick.progress >= last);
        assert!((0.0..=1.0).contains(&tick.progress));
        last = tick.progress;
        if tick.is_final() {
            completions += 1;
            assert_eq!(tick.progress, 1.0);
            assert_eq!(tick.completion, Some(Completion::Elapsed));
        }
        now += 1000.0 / 30.0;
    }
    assert_eq!(completions, 1);
    assert_eq!(clock.state(), ClockState::Completed);
    assert_eq!(clock.tick(now + 100.0), None);
}

#[test]
fn elapsed_is_measured_from_start_and_clamped_at_zero() {
    let mut clock = AnimationClock::start(500.0, 1000.0).unwrap();
    let t = clock.tick(250.0).unwrap();
    assert_eq!(t.elapsed_ms, 0.0);
    assert_eq!(t.now_ms, 250.0);
    let t = clock.tick(750.0).unwrap();
    assert_eq!(t.elapsed_ms, 250.0);
    assert_eq!(t.progress, 0.25);
}

#[test]
fn going_backwards_never_lowers_progress() {
    let mut clock = AnimationClock::start(0.0, 1000.0).unwrap();
    clock.tick(600.0);
    let t = clock.tick(300.0).unwrap();
    assert_eq!(t.progress, 0.6);
}

#[test]
fn raised_stop_completes_on_next_tick() {
    let mut clock = AnimationClock::start(0.0, 5000.0).unwrap();
    clock.tick(1000.0);
    clock.raise_stop();
    let t = clock.tick(2000.0).unwrap();
    assert_eq!(t.completion, Some(Completion::Stopped));
    assert_eq!(t.progress, 0.4);
    assert!(!clock.is_running());
    assert_eq!(clock.tick(3000.0), None);
}

#[test]
fn cancel_is_silent_and_idempotent() {
    let mut clock = AnimationClock::start(0.0, 5000.0).unwrap();
    clock.tick(100.0);
    assert!(clock.cancel());
    assert!(!clock.cancel());
    assert_eq!(clock.state(), ClockState::Cancelled);
    assert_eq!(clock.tick(6000.0), None);
    clock.raise_stop();
    assert_eq!(clock.tick(7000.0), None);
    assert_eq!(clock.ticks(), 1);
}

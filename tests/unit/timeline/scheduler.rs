use super::*;

#[test]
fn simulated_ticks_advance_time_by_interval() {
    let mut s = SimulatedScheduler::new(10.0);
    assert_eq!(s.now_ms(), 0.0);
    assert_eq!(s.wait_frame(), None);

    let h = s.request_frame();
    assert_eq!(s.pending(), 1);
    assert_eq!(s.wait_frame(), Some((h, 10.0)));
    assert_eq!(s.pending(), 0);

    let h2 = s.request_frame();
    assert_ne!(h, h2);
    assert_eq!(s.wait_frame(), Some((h2, 20.0)));
    assert_eq!(s.fired(), 2);
}

#[test]
fn cancelled_tick_never_fires() {
    let mut s = SimulatedScheduler::new(5.0);
    let h = s.request_frame();
    s.cancel_frame(h);
    s.cancel_frame(h);
    assert_eq!(s.pending(), 0);
    assert_eq!(s.wait_frame(), None);
    assert_eq!(s.now_ms(), 0.0);
}

#[test]
fn bad_interval_falls_back_to_display_refresh() {
    let s = SimulatedScheduler::new(f64::NAN);
    assert_eq!(s.interval_ms(), DEFAULT_REFRESH_INTERVAL_MS);
    let s = SimulatedScheduler::at_fps(50);
    assert_eq!(s.interval_ms(), 20.0);
}

#[test]
fn advance_moves_time_without_firing() {
    let mut s = SimulatedScheduler::starting_at(100.0, 10.0);
    s.advance(5.0);
    s.advance(-3.0);
    assert_eq!(s.now_ms(), 105.0);
    assert_eq!(s.fired(), 0);
}

#[test]
fn realtime_ticks_are_strictly_increasing() {
    let mut s = RealtimeScheduler::with_refresh_interval(Duration::from_millis(2));
    let mut last = -1.0;
    for _ in 0..3 {
        let h = s.request_frame();
        let (fired, at) = s.wait_frame().unwrap();
        assert_eq!(fired, h);
        assert!(at > last);
        last = at;
    }
    assert_eq!(s.pending(), 0);
}

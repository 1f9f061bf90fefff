use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Display refresh interval assumed by [`RealtimeScheduler`] (60 Hz).
pub const DEFAULT_REFRESH_INTERVAL_MS: f64 = 1000.0 / 60.0;

/// Identifies one requested tick so it can be cancelled before it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickHandle(pub(crate) u64);

impl TickHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// The host's frame-scheduling primitive.
///
/// Ticks are one-shot: a consumer that wants to keep animating requests the next tick from
/// inside the current one. Everything runs on the caller's thread; [`FrameScheduler::wait_frame`]
/// blocks until the next refresh and hands back the tick that fired with its timestamp.
pub trait FrameScheduler {
    /// Current host time in milliseconds.
    fn now_ms(&self) -> f64;

    /// Request a callback on the next refresh.
    fn request_frame(&mut self) -> TickHandle;

    /// Cancel a pending tick. Cancelling a tick that already fired or was cancelled is a no-op.
    fn cancel_frame(&mut self, handle: TickHandle);

    /// Wait for the next pending tick. Returns `None` when nothing is pending.
    fn wait_frame(&mut self) -> Option<(TickHandle, f64)>;

    /// Number of ticks requested and not yet fired or cancelled.
    fn pending(&self) -> usize;
}

#[derive(Debug, Default)]
struct PendingTicks {
    next_id: u64,
    queue: VecDeque<TickHandle>,
}

impl PendingTicks {
    fn push(&mut self) -> TickHandle {
        self.next_id += 1;
        let h = TickHandle(self.next_id);
        self.queue.push_back(h);
        h
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.queue.retain(|h| *h != handle);
    }

    /// All ticks requested before a refresh fire on that refresh; hand them out one at a time.
    fn pop(&mut self) -> Option<TickHandle> {
        self.queue.pop_front()
    }
}

/// Wall-clock scheduler aligned to a fixed refresh interval.
#[derive(Debug)]
pub struct RealtimeScheduler {
    origin: Instant,
    refresh: Duration,
    pending: PendingTicks,
    last_fire_ms: Option<f64>,
}

impl RealtimeScheduler {
    pub fn new() -> Self {
        Self::with_refresh_interval(Duration::from_secs_f64(DEFAULT_REFRESH_INTERVAL_MS / 1000.0))
    }

    pub fn with_refresh_interval(refresh: Duration) -> Self {
        Self {
            origin: Instant::now(),
            refresh: refresh.max(Duration::from_millis(1)),
            pending: PendingTicks::default(),
            last_fire_ms: None,
        }
    }

    fn refresh_ms(&self) -> f64 {
        self.refresh.as_secs_f64() * 1000.0
    }
}

impl Default for RealtimeScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler for RealtimeScheduler {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn request_frame(&mut self) -> TickHandle {
        self.pending.push()
    }

    fn cancel_frame(&mut self, handle: TickHandle) {
        self.pending.cancel(handle);
    }

    fn wait_frame(&mut self) -> Option<(TickHandle, f64)> {
        let handle = self.pending.pop()?;
        let refresh = self.refresh_ms();
        let now = self.now_ms();

        // Next refresh boundary strictly after the last one we fired on.
        let mut boundary = (now / refresh).ceil() * refresh;
        if let Some(last) = self.last_fire_ms
            && boundary <= last
        {
            boundary = last + refresh;
        }
        if boundary > now {
            std::thread::sleep(Duration::from_secs_f64((boundary - now) / 1000.0));
        }

        let fired = self.now_ms();
        self.last_fire_ms = Some(boundary);
        Some((handle, fired))
    }

    fn pending(&self) -> usize {
        self.pending.queue.len()
    }
}

/// Deterministic scheduler: every fired tick advances simulated time by a fixed interval.
///
/// Time starts at `start_ms` and only moves when a tick fires, so runs are reproducible and
/// finish as fast as the work allows.
#[derive(Debug)]
pub struct SimulatedScheduler {
    now_ms: f64,
    interval_ms: f64,
    pending: PendingTicks,
    fired: u64,
}

impl SimulatedScheduler {
    pub fn new(interval_ms: f64) -> Self {
        Self::starting_at(0.0, interval_ms)
    }

    pub fn starting_at(start_ms: f64, interval_ms: f64) -> Self {
        let interval_ms = if interval_ms.is_finite() && interval_ms > 0.0 {
            interval_ms
        } else {
            DEFAULT_REFRESH_INTERVAL_MS
        };
        Self {
            now_ms: if start_ms.is_finite() { start_ms } else { 0.0 },
            interval_ms,
            pending: PendingTicks::default(),
            fired: 0,
        }
    }

    /// Simulated refresh matching `fps`.
    pub fn at_fps(fps: u32) -> Self {
        Self::new(1000.0 / f64::from(fps.max(1)))
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Move simulated time forward without firing anything.
    pub fn advance(&mut self, ms: f64) {
        if ms.is_finite() && ms > 0.0 {
            self.now_ms += ms;
        }
    }

    /// Total ticks fired so far.
    pub fn fired(&self) -> u64 {
        self.fired
    }
}

impl FrameScheduler for SimulatedScheduler {
    fn now_ms(&self) -> f64 {
        self.now_ms
    }

    fn request_frame(&mut self) -> TickHandle {
        self.pending.push()
    }

    fn cancel_frame(&mut self, handle: TickHandle) {
        self.pending.cancel(handle);
    }

    fn wait_frame(&mut self) -> Option<(TickHandle, f64)> {
        let handle = self.pending.pop()?;
        self.now_ms += self.interval_ms;
        self.fired += 1;
        Some((handle, self.now_ms))
    }

    fn pending(&self) -> usize {
        self.pending.queue.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/scheduler.rs"]
mod tests;

use crate::foundation::error::{ReelError, ReelResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockState {
    Running,
    /// Completion was signalled; no further ticks are accepted.
    Completed,
    /// Cancelled before completing; nothing more is ever reported.
    Cancelled,
}

/// Why the clock completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// Elapsed time reached the configured total.
    Elapsed,
    /// An external stop was raised before the total was reached.
    Stopped,
}

/// Result of one clock tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    /// Absolute host time of the tick; this is what the renderer animates against.
    pub now_ms: f64,
    pub elapsed_ms: f64,
    /// `min(elapsed, total) / total`, never decreasing between ticks.
    pub progress: f64,
    /// Set on exactly one tick per run.
    pub completion: Option<Completion>,
}

impl Tick {
    pub fn is_final(&self) -> bool {
        self.completion.is_some()
    }
}

/// Maps host time to elapsed time and progress for one run.
///
/// The clock does not schedule anything itself: the owner requests ticks from its
/// [`FrameScheduler`](crate::timeline::FrameScheduler) and feeds every fired tick through
/// [`AnimationClock::tick`], requesting another only while the clock is still running.
#[derive(Clone, Debug)]
pub struct AnimationClock {
    start_ms: f64,
    total_ms: f64,
    state: ClockState,
    stop_raised: bool,
    progress: f64,
    ticks: u64,
}

impl AnimationClock {
    pub fn start(start_ms: f64, total_ms: f64) -> ReelResult<Self> {
        if !start_ms.is_finite() {
            return Err(ReelError::invalid_config("clock start time must be finite"));
        }
        if !total_ms.is_finite() || total_ms <= 0.0 {
            return Err(ReelError::invalid_config(format!(
                "timeline duration must be positive, got {total_ms}ms"
            )));
        }
        Ok(Self {
            start_ms,
            total_ms,
            state: ClockState::Running,
            stop_raised: false,
            progress: 0.0,
            ticks: 0,
        })
    }

    pub fn start_ms(&self) -> f64 {
        self.start_ms
    }

    pub fn total_ms(&self) -> f64 {
        self.total_ms
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ask the clock to complete on its next tick.
    pub fn raise_stop(&mut self) {
        if self.is_running() {
            self.stop_raised = true;
        }
    }

    /// Stop without signalling completion. Returns whether the clock was running.
    pub fn cancel(&mut self) -> bool {
        if self.is_running() {
            self.state = ClockState::Cancelled;
            true
        } else {
            false
        }
    }

    /// Advance to host time `now_ms`. Returns `None` once the clock has completed or was
    /// cancelled.
    pub fn tick(&mut self, now_ms: f64) -> Option<Tick> {
        if !self.is_running() {
            return None;
        }
        self.ticks += 1;

        let elapsed_ms = if now_ms.is_finite() {
            (now_ms - self.start_ms).max(0.0)
        } else {
            0.0
        };
        let completion = if elapsed_ms >= self.total_ms {
            self.progress = 1.0;
            Some(Completion::Elapsed)
        } else {
            self.progress = self.progress.max(elapsed_ms / self.total_ms);
            self.stop_raised.then_some(Completion::Stopped)
        };
        if completion.is_some() {
            self.state = ClockState::Completed;
        }

        Some(Tick {
            now_ms,
            elapsed_ms,
            progress: self.progress,
            completion,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/clock.rs"]
mod tests;

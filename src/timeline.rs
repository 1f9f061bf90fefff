pub mod clock;
pub mod scheduler;

pub use clock::{AnimationClock, ClockState, Completion, Tick};
pub use scheduler::{FrameScheduler, RealtimeScheduler, SimulatedScheduler, TickHandle};

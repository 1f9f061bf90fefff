pub mod controller;
pub mod state;

pub use controller::{SessionConfig, SessionController, StopSignal};
pub use state::{SessionEvent, SessionSnapshot, SessionState};

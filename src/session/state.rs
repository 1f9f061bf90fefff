use crate::capture::artifact::EncodedArtifact;
use serde::Serialize;

/// Lifecycle of one recording.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    /// Waiting for the encoder's stop acknowledgment.
    Finalizing,
    /// An artifact is available.
    Complete,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Finalizing => "finalizing",
            Self::Complete => "complete",
        }
    }

    /// Whether `start` may begin a new recording from this state.
    pub fn can_start(self) -> bool {
        matches!(self, Self::Idle | Self::Complete)
    }

    /// Transitions the controller performs on its own. Teardown resets to `Idle` from anywhere.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle | Self::Complete, Self::Recording)
                | (Self::Complete, Self::Idle)
                | (Self::Recording, Self::Finalizing)
                | (Self::Finalizing, Self::Complete)
                | (Self::Finalizing, Self::Idle)
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notifications for the surrounding UI.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    StateChanged {
        from: SessionState,
        to: SessionState,
    },
    Progress {
        fraction: f64,
        elapsed_ms: f64,
    },
    ArtifactReady(EncodedArtifact),
    /// A failure the session recovered from (it moved on to finalizing or idle).
    Error {
        message: String,
    },
}

/// Point-in-time view of a session for polling UIs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub progress: f64,
    pub elapsed_ms: f64,
    pub frames_captured: u64,
    pub mime_type: Option<String>,
    pub size_bytes: Option<u64>,
    pub artifact_uri: Option<String>,
    pub last_error: Option<String>,
}

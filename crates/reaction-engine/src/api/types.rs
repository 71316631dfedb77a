use serde::Serialize;

/// Unique identifier for a node in the scene.
///
/// Ids are allocated monotonically by [`RunContext`](crate::core::context::RunContext)
/// and never reused, so a handle that outlived its node can never alias a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub u32);

/// Playback state of the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlaybackState {
    /// No run loaded.
    #[default]
    Idle,
    /// Timeline advancing.
    Running,
    /// Timeline halted by the user (or by a scrub).
    Paused,
    /// Timeline halted at a step boundary waiting for the user to continue.
    ExplainingPaused { step: usize },
    /// Timeline reached its end. Terminal until restart.
    Completed,
}

impl PlaybackState {
    /// Whether the run is halted in any way (including explanation gates).
    pub fn is_paused(self) -> bool {
        matches!(self, PlaybackState::Paused | PlaybackState::ExplainingPaused { .. })
    }

    /// Numeric code written into the shared header.
    pub fn code(self) -> f32 {
        match self {
            PlaybackState::Idle => 0.0,
            PlaybackState::Running => 1.0,
            PlaybackState::Paused => 2.0,
            PlaybackState::ExplainingPaused { .. } => 3.0,
            PlaybackState::Completed => 4.0,
        }
    }
}

/// Coarse error category surfaced to the UI.
/// `Format` and `Structure` are kept apart so the UI can word "try again"
/// differently from "the plan was incomplete".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Input,
    Provider,
    Format,
    Structure,
}

/// Outbound notification for the UI layer. Drained once per frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReactionEvent {
    /// A new run was composed and started.
    RunStarted { title: String },
    /// A step finished outside explanation mode.
    StepNotice { number: usize, text: String },
    /// A step finished in explanation mode; playback waits for `continue`.
    Explanation {
        number: usize,
        title: String,
        explanation: String,
    },
    /// The timeline reached its end.
    Completed,
    /// A generation or load attempt failed. Nothing was rendered.
    Failed { error: ErrorKind, message: String },
    /// The transport changed state.
    StateChanged { state: PlaybackState },
}

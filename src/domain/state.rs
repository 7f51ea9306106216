use std::fmt;

/// Lifecycle of one harvest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Idle,
    Running,
    /// The feed stopped moving or its container disappeared.
    Stalled,
    Cancelled,
    /// Fatal startup failure (shared buffer not readable).
    Aborted,
}

impl EngineState {
    pub fn is_running(&self) -> bool {
        matches!(self, EngineState::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EngineState::Stalled | EngineState::Cancelled | EngineState::Aborted
        )
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EngineState::Idle => "idle",
            EngineState::Running => "running",
            EngineState::Stalled => "stalled",
            EngineState::Cancelled => "cancelled",
            EngineState::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

/// Why a run left the `Running` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Scroll offset stopped changing for the configured number of passes.
    Exhausted,
    ContainerMissing,
    Cancelled,
}

impl StopReason {
    pub fn terminal_state(&self) -> EngineState {
        match self {
            StopReason::Exhausted | StopReason::ContainerMissing => EngineState::Stalled,
            StopReason::Cancelled => EngineState::Cancelled,
        }
    }
}

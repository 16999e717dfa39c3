/// Progress of one clearance attempt.
///
/// Entered at `Idle`; a positive listing verdict drives the attempt through
/// `Authenticating → Authenticated → ClearanceRequested` and ends in `Done`
/// or `Failed`. Terminal states are diagnostics only and never change the
/// caller-visible detection response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearanceState {
    Idle,
    Authenticating,
    Authenticated,
    ClearanceRequested,
    Done,
    Failed,
}

impl ClearanceState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClearanceState::Done | ClearanceState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClearanceState::Idle => "idle",
            ClearanceState::Authenticating => "authenticating",
            ClearanceState::Authenticated => "authenticated",
            ClearanceState::ClearanceRequested => "clearance_requested",
            ClearanceState::Done => "done",
            ClearanceState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ClearanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a clearance attempt, recorded for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearanceOutcome {
    /// Whether a trigger was attempted at all (false for negative verdicts).
    pub attempted: bool,
    /// Whether the clearance request completed with a 2xx status.
    pub succeeded: bool,
    /// HTTP status of the clearance call, when one was received.
    pub http_status: Option<u16>,
}

impl ClearanceOutcome {
    /// No attempt was made (negative verdict).
    pub fn skipped() -> Self {
        Self {
            attempted: false,
            succeeded: false,
            http_status: None,
        }
    }

    pub fn succeeded(status: u16) -> Self {
        Self {
            attempted: true,
            succeeded: true,
            http_status: Some(status),
        }
    }

    pub fn failed(status: Option<u16>) -> Self {
        Self {
            attempted: true,
            succeeded: false,
            http_status: status,
        }
    }
}

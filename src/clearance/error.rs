use thiserror::Error;

/// Failures on the downstream notification path.
///
/// These are contained by [`ClearanceClient::trigger`](super::ClearanceClient::trigger)
/// and logged; they never reach the detection response.
#[derive(Debug, Error)]
pub enum ClearanceError {
    #[error("login request failed: {0}")]
    LoginFailed(#[source] reqwest::Error),

    #[error("login rejected with status {status}")]
    LoginRejected { status: u16 },

    #[error("login succeeded but no token was returned")]
    MissingToken,

    #[error("clearance request failed: {0}")]
    RequestFailed(#[source] reqwest::Error),

    #[error("clearance rejected with status {status}")]
    ClearanceRejected { status: u16 },
}

impl ClearanceError {
    /// HTTP status observed on the failing call, when one was received.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ClearanceError::LoginRejected { status }
            | ClearanceError::ClearanceRejected { status } => Some(*status),
            _ => None,
        }
    }
}

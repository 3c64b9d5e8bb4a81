//! Error type shared by the data layer.

use thiserror::Error;

/// Failures surfaced by the remote client, the orchestrator and the explore
/// subsystem.
///
/// Orchestrator actions never let these escape as panics: every failure is
/// written into the owning slice as a message and also returned as a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoachError {
    /// The request could not complete, or the server answered with a
    /// non-success status.
    #[error("request failed: {0}")]
    Network(String),

    /// The response body could not be decoded into the endpoint schema.
    #[error("malformed response from {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },

    /// Location lookup or the nearby-place search failed.
    ///
    /// Only the explore subsystem produces this; it never reaches the
    /// transaction, feedback or trends slices.
    #[error("{0}")]
    GeoUnavailable(String),

    /// Caller supplied something unusable (bad month key, bad upload file).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl CoachError {
    pub fn malformed(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        CoachError::Malformed {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }
}

pub type CoachResult<T> = Result<T, CoachError>;

/// Job state definitions for tracking scheduler progress
///
/// This module defines every state a submitted job can be in.
use std::fmt;

/// Represents the current state of a scheduled job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    // ===== Active States =====
    /// Job is submitted and waiting for a concurrency permit
    Queued,

    /// Job is opening its fetch
    Fetching,

    /// The completion handler is consuming the job's results
    Streaming,

    // ===== Terminal States =====
    /// The completion handler returned successfully
    Completed,

    /// The fetch could not be opened, or the completion handler reported an
    /// error or panicked
    Failed,
}

impl JobState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if the job still counts as outstanding
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Fetching | Self::Streaming)
    }

    /// Returns true if the job currently holds a concurrency permit
    pub fn holds_permit(&self) -> bool {
        matches!(self, Self::Fetching | Self::Streaming)
    }

    /// Short lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Streaming => "streaming",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible job states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Queued,
            Self::Fetching,
            Self::Streaming,
            Self::Completed,
            Self::Failed,
        ]
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

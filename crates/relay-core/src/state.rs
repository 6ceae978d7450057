//! Commit status states reported to the remote host.

use serde::{Deserialize, Serialize};

/// Status value posted against a commit.
///
/// Serialized names match the commit-status states of the GitLab API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CommitState {
    /// Build is queued but has not started.
    Pending,

    /// Build is currently executing.
    Running,

    /// Build finished successfully.
    Success,

    /// Build finished with a failure.
    Failed,

    /// Build was canceled before completion.
    Canceled,
}

impl CommitState {
    /// Get the wire name of the state as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitState::Pending => "pending",
            CommitState::Running => "running",
            CommitState::Success => "success",
            CommitState::Failed => "failed",
            CommitState::Canceled => "canceled",
        }
    }

    /// Whether this state marks the end of a build.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CommitState::Success | CommitState::Failed | CommitState::Canceled
        )
    }
}

impl std::fmt::Display for CommitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

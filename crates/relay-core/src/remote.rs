//! Remote project service interface.
//!
//! Abstraction over the hosting API the orchestrator talks to. A concrete
//! implementation (e.g. the GitLab REST client) lives outside this crate;
//! tests use recording mocks.

use crate::state::CommitState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Context string attached to every posted commit status.
pub const STATUS_CONTEXT: &str = "build";

/// Identifier a remote project is addressed by in API calls.
///
/// Either a `namespace/project` path used directly, or an opaque server-side
/// id obtained through [`RemoteProjectService::lookup_project_id`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(String);

impl ProjectId {
    /// Create a project id from a path or server-assigned id.
    pub fn new(id: impl Into<String>) -> Self {
        ProjectId(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors from remote project service calls.
#[derive(Error, Debug)]
pub enum RemoteServiceError {
    /// The project/commit combination does not exist on the remote.
    #[error("project or commit not found")]
    NotFound,

    /// Resolving a namespaced path to a server-side id failed.
    #[error("project lookup failed for '{path}': {reason}")]
    Lookup { path: String, reason: String },

    /// The status update call was rejected by the remote.
    #[error("status update failed: {0}")]
    Update(String),

    /// Transport-level failure (connection, TLS, serialization).
    #[error("transport error: {0}")]
    Transport(String),
}

/// A commit status update request.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    /// Status being reported.
    pub state: CommitState,

    /// Source branch the build was triggered for, absent for non-webhook builds.
    pub branch: Option<String>,

    /// Status context name shown by the remote host.
    pub context: String,

    /// Externally visible URL of the build.
    pub target_url: String,

    /// Optional free-form description.
    pub description: Option<String>,
}

impl StatusUpdate {
    /// Build a status update with the default context and no description.
    pub fn new(state: CommitState, branch: Option<String>, target_url: String) -> Self {
        Self {
            state,
            branch,
            context: STATUS_CONTEXT.to_string(),
            target_url,
            description: None,
        }
    }
}

/// Hosting API operations the orchestrator depends on.
///
/// Implementations must be safe to share across propagation runs: either
/// stateless or internally synchronized.
#[async_trait]
pub trait RemoteProjectService: Send + Sync {
    /// Whether the given commit exists on the given project.
    ///
    /// A remote "not found" answer maps to `Ok(false)`, not an error.
    async fn commit_exists(
        &self,
        project: &ProjectId,
        sha: &str,
    ) -> Result<bool, RemoteServiceError>;

    /// Resolve a namespaced path to the server-side project id.
    async fn lookup_project_id(&self, path: &str) -> Result<ProjectId, RemoteServiceError>;

    /// Post a commit status against a project/commit pair.
    async fn update_status(
        &self,
        project: &ProjectId,
        sha: &str,
        update: &StatusUpdate,
    ) -> Result<(), RemoteServiceError>;
}

//! relay-core - commit status propagation for GitLab-compatible hosts
//!
//! Provides the propagation orchestrator that:
//! - Resolves a build's remote URLs to hosted project identifiers
//! - Verifies the built commit exists on each project
//! - Posts the build's status per project, isolating per-project failures
//!
//! The hosting API itself is consumed through the [`RemoteProjectService`]
//! trait; see `relay-gitlab` for the GitLab REST implementation.

pub mod build;
pub mod propagate;
pub mod remote;
pub mod resolver;
pub mod state;

// Re-export key types
pub use build::{expand_placeholders, BuildContext, BuildMetadataError, BuildSnapshot};
pub use propagate::{OutcomeKind, ProjectOutcome, PropagationReport, StatusPropagator};
pub use remote::{
    ProjectId, RemoteProjectService, RemoteServiceError, StatusUpdate, STATUS_CONTEXT,
};
pub use resolver::{resolve_project_path, ResolveError};
pub use state::CommitState;

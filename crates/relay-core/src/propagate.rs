//! Status propagation orchestration.
//!
//! One propagation run takes a build and a target commit state, resolves every
//! remote URL on the build to a project, verifies the built commit exists on
//! that project, and posts the status. Failures are isolated to the smallest
//! affected unit: a bad remote or a failing project never blocks the others,
//! and the run itself never returns an error to the caller.

use crate::build::{expand_placeholders, BuildContext, BuildMetadataError};
use crate::remote::{ProjectId, RemoteProjectService, RemoteServiceError, StatusUpdate};
use crate::resolver::resolve_project_path;
use crate::state::CommitState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How processing ended for a single project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// The status update was posted.
    Updated,

    /// The built commit does not exist on this project (expected for
    /// out-of-sync mirrors).
    CommitMissing,

    /// Resolving the namespaced path to a server-side id failed.
    LookupFailed(String),

    /// The status update call failed.
    UpdateFailed(String),
}

/// Outcome record for one project in a propagation run.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectOutcome {
    /// Project id or namespaced path the outcome applies to.
    pub project: String,

    /// How processing ended.
    pub kind: OutcomeKind,

    /// When the outcome was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Result of a complete propagation run.
#[derive(Debug, Clone, Serialize)]
pub struct PropagationReport {
    /// Run id, attributed on every log line of the run.
    pub run_id: Uuid,

    /// Per-project outcomes, in processing order.
    pub outcomes: Vec<ProjectOutcome>,

    /// Remote URLs that did not resolve to a recognized hosting path.
    pub unresolved_remotes: Vec<String>,

    /// Set when reading build metadata failed and the run was cut short.
    pub aborted: Option<String>,
}

impl PropagationReport {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            outcomes: Vec::new(),
            unresolved_remotes: Vec::new(),
            aborted: None,
        }
    }

    fn record(&mut self, project: impl Into<String>, kind: OutcomeKind) {
        self.outcomes.push(ProjectOutcome {
            project: project.into(),
            kind,
            recorded_at: Utc::now(),
        });
    }

    /// Number of projects whose status was updated.
    pub fn updated_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.kind == OutcomeKind::Updated)
            .count()
    }

    /// Number of projects where a remote call failed.
    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o.kind,
                    OutcomeKind::LookupFailed(_) | OutcomeKind::UpdateFailed(_)
                )
            })
            .count()
    }
}

/// Commit status propagation orchestrator.
pub struct StatusPropagator;

impl StatusPropagator {
    /// Execute one propagation run for a build and a target commit state.
    ///
    /// Never returns an error: absence of configuration is a normal early
    /// return, per-remote failures are recorded and skipped, and metadata
    /// read failures abort the remainder of the run but are only logged.
    pub async fn propagate(build: &dyn BuildContext, state: CommitState) -> PropagationReport {
        let run_id = Uuid::new_v4();
        let mut report = PropagationReport::new(run_id);

        let Some(service) = build.remote_service() else {
            info!(run_id = %run_id, "no remote connection configured, skipping status propagation");
            return report;
        };

        let sha = match build.last_built_sha() {
            Ok(sha) => sha,
            Err(e) => return Self::abort(report, e),
        };
        let build_url = match build.build_url() {
            Ok(url) => url,
            Err(e) => return Self::abort(report, e),
        };

        info!(run_id = %run_id, sha = %sha, state = %state, "starting status propagation");

        let projects = match Self::resolve_projects(build, service.as_ref(), &mut report).await {
            Ok(projects) => projects,
            Err(e) => return Self::abort(report, e),
        };

        let update = StatusUpdate::new(state, build.trigger_source_branch(), build_url);

        for project in projects {
            match service.commit_exists(&project, &sha).await {
                Ok(true) => match service.update_status(&project, &sha, &update).await {
                    Ok(()) => {
                        info!(run_id = %run_id, project = %project, state = %state, "commit status updated");
                        report.record(project.as_str(), OutcomeKind::Updated);
                    }
                    Err(e) => {
                        warn!(run_id = %run_id, project = %project, error = %e, "failed to update commit status");
                        report.record(project.as_str(), OutcomeKind::UpdateFailed(e.to_string()));
                    }
                },
                Ok(false) | Err(RemoteServiceError::NotFound) => {
                    debug!(run_id = %run_id, project = %project, sha = %sha, "project and commit combination not found");
                    report.record(project.as_str(), OutcomeKind::CommitMissing);
                }
                Err(e) => {
                    warn!(run_id = %run_id, project = %project, error = %e, "failed to check commit existence");
                    report.record(project.as_str(), OutcomeKind::UpdateFailed(e.to_string()));
                }
            }
        }

        info!(
            run_id = %run_id,
            updated = report.updated_count(),
            failed = report.failed_count(),
            "status propagation finished"
        );
        report
    }

    /// Resolve the build's remote URLs to the project ids to update.
    ///
    /// Unresolvable remotes are skipped: not every remote on a build is the
    /// one being tracked. A path containing a literal `.` is treated as a
    /// host-qualified name and resolved server-side. Ids are deduplicated,
    /// order preserved.
    async fn resolve_projects(
        build: &dyn BuildContext,
        service: &dyn RemoteProjectService,
        report: &mut PropagationReport,
    ) -> Result<Vec<ProjectId>, BuildMetadataError> {
        let env = build.environment()?;
        let run_id = report.run_id;

        let mut projects = Vec::new();
        for remote in build.remote_urls()? {
            let expanded = expand_placeholders(&remote, &env);
            let path = match resolve_project_path(&expanded) {
                Ok(path) => path,
                Err(e) => {
                    debug!(run_id = %run_id, remote = %expanded, error = %e, "remote is not a recognized hosting remote, skipping");
                    report.unresolved_remotes.push(expanded);
                    continue;
                }
            };

            let id = if path.contains('.') {
                match service.lookup_project_id(&path).await {
                    Ok(id) => id,
                    Err(e) => {
                        warn!(run_id = %run_id, path = %path, error = %e, "failed to look up project id");
                        report.record(path, OutcomeKind::LookupFailed(e.to_string()));
                        continue;
                    }
                }
            } else {
                ProjectId::new(path)
            };

            if !projects.contains(&id) {
                projects.push(id);
            }
        }
        Ok(projects)
    }

    fn abort(mut report: PropagationReport, error: BuildMetadataError) -> PropagationReport {
        warn!(run_id = %report.run_id, error = %error, "failed to read build metadata, aborting status propagation");
        report.aborted = Some(error.to_string());
        report
    }
}

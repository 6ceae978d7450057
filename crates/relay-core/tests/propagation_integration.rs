//! Integration tests for status propagation with a recording mock service.

use async_trait::async_trait;
use relay_core::{
    BuildSnapshot, CommitState, ProjectId, RemoteProjectService, RemoteServiceError,
    StatusPropagator, StatusUpdate,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Recording mock of the hosting API: scripted lookups and commit existence,
/// per-project update failures, and a full call log.
#[derive(Default)]
struct RecordingService {
    lookups: HashMap<String, String>,
    existing_commits: HashSet<String>,
    failing_updates: HashSet<String>,
    updates: Mutex<Vec<(String, String, StatusUpdate)>>,
    calls: Mutex<Vec<String>>,
}

impl RecordingService {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn updates(&self) -> Vec<(String, String, StatusUpdate)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteProjectService for RecordingService {
    async fn commit_exists(
        &self,
        project: &ProjectId,
        sha: &str,
    ) -> Result<bool, RemoteServiceError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("exists:{project}:{sha}"));
        Ok(self.existing_commits.contains(project.as_str()))
    }

    async fn lookup_project_id(&self, path: &str) -> Result<ProjectId, RemoteServiceError> {
        self.calls.lock().unwrap().push(format!("lookup:{path}"));
        match self.lookups.get(path) {
            Some(id) => Ok(ProjectId::new(id.clone())),
            None => Err(RemoteServiceError::Lookup {
                path: path.to_string(),
                reason: "unknown path".to_string(),
            }),
        }
    }

    async fn update_status(
        &self,
        project: &ProjectId,
        sha: &str,
        update: &StatusUpdate,
    ) -> Result<(), RemoteServiceError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("update:{project}"));
        if self.failing_updates.contains(project.as_str()) {
            return Err(RemoteServiceError::Update(
                "500 Internal Server Error".to_string(),
            ));
        }
        self.updates.lock().unwrap().push((
            project.as_str().to_string(),
            sha.to_string(),
            update.clone(),
        ));
        Ok(())
    }
}

/// Test: one tracked remote with an existing commit gets exactly one update
/// carrying the nested group path.
#[tokio::test]
async fn test_single_remote_success() {
    let service = Arc::new(RecordingService {
        existing_commits: HashSet::from(["group/sub/project".to_string()]),
        ..Default::default()
    });

    let build = BuildSnapshot::new("1f2e3d4c", "https://ci.example.com/builds/12")
        .with_remote("git@gitlab.example.com:group/sub/project.git")
        .with_branch("main")
        .with_service(service.clone());

    let report = StatusPropagator::propagate(&build, CommitState::Success).await;

    assert_eq!(report.updated_count(), 1, "Exactly one update should happen");
    assert_eq!(report.failed_count(), 0, "No project should fail");

    let updates = service.updates();
    assert_eq!(updates.len(), 1);
    let (project, sha, update) = &updates[0];
    assert_eq!(project, "group/sub/project");
    assert_eq!(sha, "1f2e3d4c");
    assert_eq!(update.state, CommitState::Success);
    assert_eq!(update.branch.as_deref(), Some("main"));
    assert_eq!(update.target_url, "https://ci.example.com/builds/12");
    assert_eq!(update.context, "build");
}

/// Test: mixed remotes — unresolvable ones are skipped, commit-less projects
/// are not updated, and only resolved+existing projects get an update.
#[tokio::test]
async fn test_mixed_remotes_update_only_where_commit_exists() {
    let service = Arc::new(RecordingService {
        existing_commits: HashSet::from(["group/present".to_string()]),
        ..Default::default()
    });

    let build = BuildSnapshot::new("abc123", "https://ci.example.com/builds/13")
        .with_remote("not-a-url")
        .with_remote("git@host:group/present.git")
        .with_remote("git@host:group/missing.git")
        .with_service(service.clone());

    let report = StatusPropagator::propagate(&build, CommitState::Failed).await;

    assert_eq!(report.unresolved_remotes, vec!["not-a-url"]);
    assert_eq!(report.updated_count(), 1, "Only the present project updates");
    assert_eq!(report.outcomes.len(), 2, "Both resolved projects reported");

    let calls = service.calls();
    assert!(calls.contains(&"exists:group/present:abc123".to_string()));
    assert!(calls.contains(&"exists:group/missing:abc123".to_string()));
    assert_eq!(
        calls.iter().filter(|c| c.starts_with("update:")).count(),
        1,
        "No update for the project missing the commit"
    );
}

/// Test: a failing update on one project does not block the next project.
#[tokio::test]
async fn test_failure_isolation_across_projects() {
    let service = Arc::new(RecordingService {
        existing_commits: HashSet::from(["org/alpha".to_string(), "org/beta".to_string()]),
        failing_updates: HashSet::from(["org/alpha".to_string()]),
        ..Default::default()
    });

    let build = BuildSnapshot::new("abc123", "https://ci.example.com/builds/14")
        .with_remote("git@host:org/alpha.git")
        .with_remote("git@host:org/beta.git")
        .with_service(service.clone());

    let report = StatusPropagator::propagate(&build, CommitState::Success).await;

    assert_eq!(report.failed_count(), 1, "Alpha's failure is recorded");
    assert_eq!(report.updated_count(), 1, "Beta is still updated");

    let updates = service.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, "org/beta");
}

/// Test: dotted path goes through server-side lookup and all subsequent calls
/// use the looked-up id, not the raw path.
#[tokio::test]
async fn test_dotted_path_uses_looked_up_id() {
    let service = Arc::new(RecordingService {
        lookups: HashMap::from([("ns.project".to_string(), "1234".to_string())]),
        existing_commits: HashSet::from(["1234".to_string()]),
        ..Default::default()
    });

    let build = BuildSnapshot::new("abc123", "https://ci.example.com/builds/15")
        .with_remote("https://gitlab.example.com/ns.project.git")
        .with_service(service.clone());

    let report = StatusPropagator::propagate(&build, CommitState::Success).await;

    assert_eq!(report.updated_count(), 1);
    assert_eq!(
        service.calls(),
        vec![
            "lookup:ns.project".to_string(),
            "exists:1234:abc123".to_string(),
            "update:1234".to_string(),
        ],
        "Existence check and update must use the looked-up id"
    );
}

/// Test: with no configured service nothing is called and nothing is raised.
#[tokio::test]
async fn test_no_connection_is_silent_noop() {
    let build = BuildSnapshot::new("abc123", "https://ci.example.com/builds/16")
        .with_remote("git@host:group/project.git");

    let report = StatusPropagator::propagate(&build, CommitState::Canceled).await;

    assert!(report.outcomes.is_empty(), "No project should be processed");
    assert!(report.aborted.is_none(), "Missing config is not an error");
}

/// Test: builds without a webhook cause post statuses without a branch ref.
#[tokio::test]
async fn test_non_webhook_build_omits_branch() {
    let service = Arc::new(RecordingService {
        existing_commits: HashSet::from(["group/project".to_string()]),
        ..Default::default()
    });

    let build = BuildSnapshot::new("abc123", "https://ci.example.com/builds/17")
        .with_remote("git@host:group/project.git")
        .with_service(service.clone());

    StatusPropagator::propagate(&build, CommitState::Running).await;

    let updates = service.updates();
    assert_eq!(updates.len(), 1);
    assert!(updates[0].2.branch.is_none(), "No webhook, no branch ref");
}

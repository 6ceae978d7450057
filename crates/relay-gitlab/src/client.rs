//! GitLab REST v4 client.
//!
//! Implements [`RemoteProjectService`] over the three API calls the
//! orchestrator needs: commit lookup, project-by-path lookup, and the
//! commit-status POST.

use crate::config::GitLabConfig;
use async_trait::async_trait;
use relay_core::{ProjectId, RemoteProjectService, RemoteServiceError, StatusUpdate};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// GitLab API client for commit status updates.
pub struct GitLabClient {
    config: GitLabConfig,
    http: reqwest::Client,
}

/// Project lookup response body (only the fields we read).
#[derive(Deserialize)]
struct ProjectBody {
    id: u64,
}

/// Commit status POST body.
#[derive(Serialize)]
struct StatusBody<'a> {
    state: &'a str,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
    context: &'a str,
    target_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl<'a> StatusBody<'a> {
    fn from_update(update: &'a StatusUpdate) -> Self {
        StatusBody {
            state: update.state.as_str(),
            branch: update.branch.as_deref(),
            context: &update.context,
            target_url: &update.target_url,
            description: update.description.as_deref(),
        }
    }
}

impl GitLabClient {
    /// Create a new client for a GitLab instance.
    pub fn new(config: GitLabConfig) -> Result<Self, RemoteServiceError> {
        let http = reqwest::Client::builder()
            .user_agent("relay-gitlab/0.2.0")
            .build()
            .map_err(|e| RemoteServiceError::Transport(e.to_string()))?;

        Ok(GitLabClient { config, http })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self, RemoteServiceError> {
        Self::new(GitLabConfig::from_env())
    }

    /// Build an API URL under `/api/v4/`.
    fn api_url(&self, tail: &str) -> String {
        format!(
            "{}/api/v4/{}",
            self.config.base_url.trim_end_matches('/'),
            tail
        )
    }

    /// Build a project-scoped API URL. Namespaced paths are percent-encoded
    /// so `group/project` addresses one project, not a nested route.
    fn project_url(&self, project: &str, tail: &str) -> String {
        let encoded = urlencoding::encode(project);
        if tail.is_empty() {
            self.api_url(&format!("projects/{encoded}"))
        } else {
            self.api_url(&format!("projects/{encoded}/{tail}"))
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.config.token {
            Some(token) => builder.header("PRIVATE-TOKEN", token),
            None => builder,
        }
    }
}

#[async_trait]
impl RemoteProjectService for GitLabClient {
    async fn commit_exists(
        &self,
        project: &ProjectId,
        sha: &str,
    ) -> Result<bool, RemoteServiceError> {
        let url = self.project_url(project.as_str(), &format!("repository/commits/{sha}"));
        debug!(project = %project, sha = %sha, "checking commit existence");

        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(|e| RemoteServiceError::Transport(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(RemoteServiceError::Transport(format!(
                "commit check returned {status}"
            ))),
        }
    }

    async fn lookup_project_id(&self, path: &str) -> Result<ProjectId, RemoteServiceError> {
        let url = self.project_url(path, "");
        debug!(path = %path, "looking up project id");

        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(|e| RemoteServiceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RemoteServiceError::Lookup {
                path: path.to_string(),
                reason: format!("lookup returned {}", response.status()),
            });
        }

        let body: ProjectBody =
            response
                .json()
                .await
                .map_err(|e| RemoteServiceError::Lookup {
                    path: path.to_string(),
                    reason: e.to_string(),
                })?;

        Ok(ProjectId::new(body.id.to_string()))
    }

    async fn update_status(
        &self,
        project: &ProjectId,
        sha: &str,
        update: &StatusUpdate,
    ) -> Result<(), RemoteServiceError> {
        let url = self.project_url(project.as_str(), &format!("statuses/{sha}"));
        debug!(project = %project, sha = %sha, state = %update.state, "posting commit status");

        let response = self
            .request(Method::POST, &url)
            .json(&StatusBody::from_update(update))
            .send()
            .await
            .map_err(|e| RemoteServiceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteServiceError::Update(format!(
                "status post returned {status}: {body}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::CommitState;

    fn client(base_url: &str) -> GitLabClient {
        GitLabClient::new(GitLabConfig::new(base_url)).expect("client build failed")
    }

    #[test]
    fn test_api_url_strips_trailing_slash() {
        let client = client("https://gitlab.example.com/");
        assert_eq!(
            client.api_url("projects/42"),
            "https://gitlab.example.com/api/v4/projects/42"
        );
    }

    #[test]
    fn test_project_url_encodes_namespaced_path() {
        let client = client("https://gitlab.example.com");
        assert_eq!(
            client.project_url("group/sub/project", "repository/commits/abc"),
            "https://gitlab.example.com/api/v4/projects/group%2Fsub%2Fproject/repository/commits/abc"
        );
    }

    #[test]
    fn test_project_url_without_tail() {
        let client = client("https://gitlab.example.com");
        assert_eq!(
            client.project_url("ns.project", ""),
            "https://gitlab.example.com/api/v4/projects/ns.project"
        );
    }

    #[test]
    fn test_numeric_id_passes_through_unencoded() {
        let client = client("https://gitlab.example.com");
        assert_eq!(
            client.project_url("1234", "statuses/abc"),
            "https://gitlab.example.com/api/v4/projects/1234/statuses/abc"
        );
    }

    #[test]
    fn test_status_body_serialization() {
        let update = StatusUpdate::new(
            CommitState::Success,
            Some("main".to_string()),
            "https://ci.example.com/builds/42".to_string(),
        );
        let body = serde_json::to_value(StatusBody::from_update(&update)).unwrap();

        assert_eq!(body["state"], "success");
        assert_eq!(body["ref"], "main");
        assert_eq!(body["context"], "build");
        assert_eq!(body["target_url"], "https://ci.example.com/builds/42");
        assert!(
            body.get("description").is_none(),
            "null description must be omitted"
        );
    }

    #[test]
    fn test_status_body_omits_absent_branch() {
        let update = StatusUpdate::new(
            CommitState::Canceled,
            None,
            "https://ci.example.com/builds/43".to_string(),
        );
        let body = serde_json::to_value(StatusBody::from_update(&update)).unwrap();

        assert_eq!(body["state"], "canceled");
        assert!(body.get("ref").is_none(), "no webhook branch, no ref field");
    }
}

//! GitLab connection configuration.

use serde::{Deserialize, Serialize};

/// GitLab connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabConfig {
    /// Base URL of the GitLab instance
    pub base_url: String,
    /// Private token (optional for anonymous read access)
    pub token: Option<String>,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        GitLabConfig {
            base_url: std::env::var("GITLAB_URL")
                .unwrap_or_else(|_| "https://gitlab.com".to_string()),
            token: std::env::var("GITLAB_TOKEN").ok(),
        }
    }
}

impl GitLabConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific GitLab instance
    pub fn new(base_url: &str) -> Self {
        GitLabConfig {
            base_url: base_url.to_string(),
            token: None,
        }
    }

    /// Set the private token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}

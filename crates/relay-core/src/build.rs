//! Read-only view of the host build system.
//!
//! The orchestrator never talks to a build-system object graph directly; it
//! reads everything it needs through the narrow [`BuildContext`] interface.
//! [`BuildSnapshot`] is a plain-value implementation hosts (and tests) can
//! fill in.

use crate::remote::RemoteProjectService;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors reading build metadata from the host.
///
/// These are run-fatal: without build metadata no remote can be correctly
/// resolved or reported, so the propagation run stops (but still does not
/// propagate the error to its caller).
#[derive(Error, Debug, Clone)]
pub enum BuildMetadataError {
    /// The build's remote URL list could not be read.
    #[error("failed to read build remotes: {0}")]
    Remotes(String),

    /// The built revision could not be read.
    #[error("failed to read built revision: {0}")]
    Revision(String),

    /// The build's externally visible URL could not be determined.
    #[error("failed to read build url: {0}")]
    BuildUrl(String),

    /// The build environment could not be read.
    #[error("failed to read build environment: {0}")]
    Environment(String),
}

/// Read-only build state supplied by the host build system.
pub trait BuildContext: Send + Sync {
    /// Remote repository URLs associated with the build.
    fn remote_urls(&self) -> Result<Vec<String>, BuildMetadataError>;

    /// SHA of the most recently built revision.
    fn last_built_sha(&self) -> Result<String, BuildMetadataError>;

    /// Externally visible URL of this build.
    fn build_url(&self) -> Result<String, BuildMetadataError>;

    /// Source branch from the webhook trigger cause, if any.
    fn trigger_source_branch(&self) -> Option<String>;

    /// Build environment, used to expand placeholders in remote URLs.
    fn environment(&self) -> Result<HashMap<String, String>, BuildMetadataError>;

    /// The configured remote project service, if status propagation is
    /// enabled for this build's project.
    fn remote_service(&self) -> Option<Arc<dyn RemoteProjectService>>;
}

/// Plain-value [`BuildContext`] implementation.
#[derive(Clone, Default)]
pub struct BuildSnapshot {
    sha: String,
    build_url: String,
    branch: Option<String>,
    remotes: Vec<String>,
    env: HashMap<String, String>,
    service: Option<Arc<dyn RemoteProjectService>>,
}

impl BuildSnapshot {
    /// Create a snapshot for a built revision and its build URL.
    pub fn new(sha: impl Into<String>, build_url: impl Into<String>) -> Self {
        Self {
            sha: sha.into(),
            build_url: build_url.into(),
            ..Self::default()
        }
    }

    /// Add a remote URL.
    pub fn with_remote(mut self, url: impl Into<String>) -> Self {
        self.remotes.push(url.into());
        self
    }

    /// Set the webhook trigger source branch.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Add a build environment variable.
    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Attach the configured remote project service.
    pub fn with_service(mut self, service: Arc<dyn RemoteProjectService>) -> Self {
        self.service = Some(service);
        self
    }
}

impl BuildContext for BuildSnapshot {
    fn remote_urls(&self) -> Result<Vec<String>, BuildMetadataError> {
        Ok(self.remotes.clone())
    }

    fn last_built_sha(&self) -> Result<String, BuildMetadataError> {
        Ok(self.sha.clone())
    }

    fn build_url(&self) -> Result<String, BuildMetadataError> {
        Ok(self.build_url.clone())
    }

    fn trigger_source_branch(&self) -> Option<String> {
        self.branch.clone()
    }

    fn environment(&self) -> Result<HashMap<String, String>, BuildMetadataError> {
        Ok(self.env.clone())
    }

    fn remote_service(&self) -> Option<Arc<dyn RemoteProjectService>> {
        self.service.clone()
    }
}

/// Expand `${VAR}` and `$VAR` placeholders against the build environment.
///
/// Unknown variables are left verbatim, matching host expansion semantics.
pub fn expand_placeholders(input: &str, env: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' && i + 1 < bytes.len() {
            if bytes[i + 1] == b'{' {
                if let Some(end) = input[i + 2..].find('}') {
                    let name = &input[i + 2..i + 2 + end];
                    match env.get(name) {
                        Some(value) => out.push_str(value),
                        None => out.push_str(&input[i..i + 3 + end]),
                    }
                    i += 3 + end;
                    continue;
                }
            } else {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len()
                    && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                if end > start {
                    let name = &input[start..end];
                    match env.get(name) {
                        Some(value) => out.push_str(value),
                        None => out.push_str(&input[i..end]),
                    }
                    i = end;
                    continue;
                }
            }
        }
        if let Some(ch) = input[i..].chars().next() {
            out.push(ch);
            i += ch.len_utf8();
        } else {
            break;
        }
    }
    out
}

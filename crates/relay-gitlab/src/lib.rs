//! relay-gitlab - GitLab REST v4 backend for relay-core.
//!
//! Wraps the GitLab API calls the status propagation orchestrator needs:
//! commit existence, project lookup by namespaced path, and commit-status
//! updates.

pub mod client;
pub mod config;

// Re-export key types
pub use client::GitLabClient;
pub use config::GitLabConfig;

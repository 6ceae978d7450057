//! Remote URL to project path resolution.
//!
//! Maps a git remote URL (scp-style SSH, scheme URLs, or local paths) to the
//! `namespace/project` path the hosting API addresses the project by. Pure
//! string work, no I/O.

use thiserror::Error;

/// Errors from resolving a remote URL to a project path.
///
/// These are recoverable per-URL failures: callers skip the offending URL
/// and continue with the remaining remotes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The URL does not match any recognized hosting shape.
    #[error("remote url does not match a recognized hosting shape: '{0}'")]
    UnrecognizedShape(String),

    /// The URL parsed, but the project path portion is empty.
    #[error("remote url has an empty project path: '{0}'")]
    EmptyPath(String),
}

/// Resolve a remote URL to its `namespace/project` path.
///
/// Recognized shapes:
/// - scp-style SSH: `git@host:group/project.git`
/// - scheme URLs: `ssh://`, `git://`, `http(s)://`, `file://`, with optional
///   `user@` and `:port` in the authority
/// - local paths: `/srv/git/group/project.git`
///
/// The scheme, authority, leading `/`, trailing `/` and a trailing `.git`
/// suffix are stripped; nested group segments are preserved. Deterministic
/// for identical input.
pub fn resolve_project_path(url: &str) -> Result<String, ResolveError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ResolveError::UnrecognizedShape(url.to_string()));
    }

    let path = if let Some((scheme, rest)) = trimmed.split_once("://") {
        if scheme.is_empty() || !is_scheme(scheme) {
            return Err(ResolveError::UnrecognizedShape(url.to_string()));
        }
        // rest = [user@]host[:port]/path (empty authority for file://)
        match rest.split_once('/') {
            Some((_authority, path)) => path,
            None => return Err(ResolveError::EmptyPath(url.to_string())),
        }
    } else if is_scp_like(trimmed) {
        // user@host:path or host:path
        trimmed
            .split_once(':')
            .map(|(_, path)| path)
            .unwrap_or_default()
    } else if trimmed.contains('/') {
        // Local-path-style remote.
        trimmed
    } else {
        return Err(ResolveError::UnrecognizedShape(url.to_string()));
    };

    let normalized = normalize(path);
    if normalized.is_empty() {
        return Err(ResolveError::EmptyPath(url.to_string()));
    }
    Ok(normalized.to_string())
}

/// Whether a candidate scheme looks like a URL scheme (`ssh`, `git+ssh`, ...).
fn is_scheme(scheme: &str) -> bool {
    scheme
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

/// Whether a scheme-less URL is scp-style, i.e. the first `:` comes before
/// any `/` (`user@host:path`).
fn is_scp_like(url: &str) -> bool {
    match url.find(':') {
        Some(colon) if colon > 0 => match url.find('/') {
            Some(slash) => colon < slash,
            None => true,
        },
        _ => false,
    }
}

/// Strip surrounding slashes and a trailing `.git` suffix.
fn normalize(path: &str) -> &str {
    let path = path.trim_matches('/');
    path.strip_suffix(".git").unwrap_or(path)
}

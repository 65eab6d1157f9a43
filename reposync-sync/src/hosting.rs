//! Hosting-provider commit lookup.
//!
//! One authenticated `GET {api}/repos/{owner}/{repo}/commits/{branch}` per
//! run; the JSON body's `sha` field is the remote branch tip.

use std::time::Duration;

use serde::Deserialize;

use reposync_core::{RepoSlug, SyncConfig};

use crate::error::RemoteLookupError;

const USER_AGENT: &str = concat!("reposync/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/vnd.github+json";

/// Resolves the commit id at the tip of a remote branch.
pub trait CommitLookup {
    fn latest_commit(&self, slug: &RepoSlug, branch: &str) -> Result<String, RemoteLookupError>;
}

impl<T: CommitLookup + ?Sized> CommitLookup for &T {
    fn latest_commit(&self, slug: &RepoSlug, branch: &str) -> Result<String, RemoteLookupError> {
        (**self).latest_commit(slug, branch)
    }
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: Option<String>,
}

impl CommitResponse {
    /// The trimmed `sha`, if present and non-blank.
    fn into_sha(self) -> Option<String> {
        self.sha
            .map(|sha| sha.trim().to_owned())
            .filter(|sha| !sha.is_empty())
    }
}

/// GitHub (or GitHub Enterprise) REST client.
pub struct GitHubClient {
    agent: ureq::Agent,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            api_url: api_url.into().trim_end_matches('/').to_owned(),
            token,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            config.api_url.clone(),
            config.token.clone(),
            config.http_timeout,
        )
    }

    pub fn commit_url(&self, slug: &RepoSlug, branch: &str) -> String {
        format!(
            "{}/repos/{}/{}/commits/{}",
            self.api_url, slug.owner, slug.repo, branch
        )
    }
}

impl CommitLookup for GitHubClient {
    fn latest_commit(&self, slug: &RepoSlug, branch: &str) -> Result<String, RemoteLookupError> {
        let url = self.commit_url(slug, branch);
        tracing::debug!(%url, authenticated = self.token.is_some(), "looking up remote commit");

        let mut request = self
            .agent
            .get(&url)
            .set("User-Agent", USER_AGENT)
            .set("Accept", ACCEPT);
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("token {token}"));
        }

        let response = match request.call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(RemoteLookupError::Status { url, status });
            }
            Err(err) => {
                return Err(RemoteLookupError::Transport {
                    url,
                    message: err.to_string(),
                });
            }
        };

        let commit: CommitResponse = match response.into_json() {
            Ok(commit) => commit,
            Err(err) => {
                return Err(RemoteLookupError::Body {
                    url,
                    message: err.to_string(),
                });
            }
        };
        commit
            .into_sha()
            .ok_or(RemoteLookupError::MissingSha { url })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

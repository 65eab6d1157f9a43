//! Remote URL parsing.
//!
//! Accepted shapes:
//!
//! ```text
//! https://github.com/<owner>/<repo>[.git][/]
//! ssh://git@github.com/<owner>/<repo>[.git]
//! git@github.com:<owner>/<repo>[.git]
//! /srv/mirrors/<owner>/<repo>[.git]          (local path, last two segments)
//! file:///srv/mirrors/<owner>/<repo>[.git]   (local path, last two segments)
//! ```
//!
//! Hosted URLs must carry exactly two path segments after the host.

use std::fmt;

use crate::error::InvalidRepositoryUrl;

/// The `{owner, repo}` pair the hosting API is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl RepoSlug {
    /// Extract `{owner, repo}` from a clone URL.
    pub fn parse(url: &str) -> Result<Self, InvalidRepositoryUrl> {
        let invalid = |reason| InvalidRepositoryUrl {
            url: url.to_owned(),
            reason,
        };

        let trimmed = url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(invalid("URL is empty"));
        }
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

        let (path, hosted) = if let Some((scheme, rest)) = trimmed.split_once("://") {
            if scheme.eq_ignore_ascii_case("file") {
                (rest, false)
            } else {
                match rest.split_once('/') {
                    Some((_authority, path)) => (path, true),
                    None => return Err(invalid("URL has no repository path after the host")),
                }
            }
        } else if let Some(path) = scp_path(trimmed) {
            (path, true)
        } else {
            (trimmed, false)
        };

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (owner, repo) = match (hosted, segments.as_slice()) {
            (true, [owner, repo]) => (*owner, *repo),
            (true, _) => return Err(invalid("expected exactly <owner>/<repo> after the host")),
            (false, [.., owner, repo]) => (*owner, *repo),
            (false, _) => return Err(invalid("expected <owner>/<repo> as the last two path segments")),
        };

        if owner.chars().chain(repo.chars()).any(char::is_whitespace) {
            return Err(invalid("owner and repository must not contain whitespace"));
        }

        Ok(Self {
            owner: owner.to_owned(),
            repo: repo.to_owned(),
        })
    }
}

/// `user@host:path`: the part after the colon, if `url` has that shape.
fn scp_path(url: &str) -> Option<&str> {
    let (host, path) = url.split_once(':')?;
    // A single letter before the colon is a Windows drive, not a host.
    if host.len() < 2 || host.contains('/') {
        return None;
    }
    Some(path)
}

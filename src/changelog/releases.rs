//! Version ranges and tag matching shared by the changelog providers.

use url::Url;

use super::ChangelogError;
use crate::datasource::Release;
use crate::versioning::VersionScheme;

/// A version inside the requested range, with the one released before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VersionStep {
    pub previous: Option<String>,
    pub version: String,
}

/// Versions with `from < v <= to`, ascending, each paired with its predecessor.
///
/// Invalid versions are skipped. When the release list does not contain
/// `to` at all, `to` alone is returned with `from` as its predecessor.
pub(crate) fn releases_in_range(
    releases: &[Release],
    scheme: &dyn VersionScheme,
    from: &str,
    to: &str,
) -> Vec<VersionStep> {
    let mut versions: Vec<&str> = releases
        .iter()
        .map(|r| r.version.as_str())
        .filter(|v| scheme.is_valid(v))
        .collect();
    versions.sort_by(|a, b| scheme.compare(a, b));
    versions.dedup_by(|a, b| scheme.equals(a, b));

    if !versions.iter().any(|v| scheme.equals(v, to)) {
        return vec![VersionStep {
            previous: Some(from.to_string()),
            version: to.to_string(),
        }];
    }

    let mut steps = Vec::new();
    let mut previous: Option<&str> = None;
    for version in versions {
        let after_from = scheme.compare(version, from).is_gt();
        let until_to = scheme.compare(version, to).is_le();
        if after_from && until_to {
            steps.push(VersionStep {
                previous: previous.map(str::to_string),
                version: version.to_string(),
            });
        }
        previous = Some(version);
    }
    steps
}

/// Whether a git tag names `version`.
///
/// Accepts `1.2.3`, `v1.2.3`, and prefixed forms used by monorepos such as
/// `pkg@1.2.3`, `pkg-v1.2.3`, `pkg_1.2.3` and `pkg/v1.2.3`.
pub(crate) fn tag_matches(tag: &str, version: &str) -> bool {
    let bare = version.strip_prefix('v').unwrap_or(version);
    if tag == bare || tag.strip_prefix('v') == Some(bare) {
        return true;
    }
    ['@', '-', '_', '/'].iter().any(|sep| {
        tag.rsplit_once(*sep).is_some_and(|(prefix, rest)| {
            !prefix.is_empty() && (rest == bare || rest.strip_prefix('v') == Some(bare))
        })
    })
}

/// Derive the tag of `previous` from the tag naming `version`.
pub(crate) fn sibling_tag(tag: &str, version: &str, previous: &str) -> String {
    let bare = version.strip_prefix('v').unwrap_or(version);
    let previous = previous.strip_prefix('v').unwrap_or(previous);
    match tag.rfind(bare) {
        Some(idx) => format!("{}{}{}", &tag[..idx], previous, &tag[idx + bare.len()..]),
        None => previous.to_string(),
    }
}

/// A repository URL split into its host-level base and project path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RepoLocation {
    /// `scheme://host[:port]`
    pub base_url: String,
    pub host: String,
    /// `owner/repo`, or the full group path on GitLab.
    pub path: String,
}

impl RepoLocation {
    pub fn repository_url(&self) -> String {
        format!("{}/{}", self.base_url, self.path)
    }
}

pub(crate) fn split_repo_url(source_url: &str) -> Result<RepoLocation, ChangelogError> {
    let invalid = || ChangelogError::InvalidSourceUrl(source_url.to_string());
    let url = Url::parse(source_url).map_err(|_| invalid())?;
    let host = url.host_str().ok_or_else(invalid)?.to_ascii_lowercase();
    let path = url
        .path()
        .trim_matches('/')
        .trim_end_matches(".git")
        .to_string();
    if !path.contains('/') {
        return Err(invalid());
    }

    let base_url = match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    };
    Ok(RepoLocation {
        base_url,
        host,
        path,
    })
}

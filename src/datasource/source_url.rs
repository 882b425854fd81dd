//! Source URL normalization.
//!
//! Registries report repository locations in many shapes: `git+https://`,
//! `git+ssh://`, scp-style `git@host:owner/repo.git`, bare `host/path`. They are
//! all reduced to one canonical `https://` (or, when the input was plain http,
//! `http://`) URL with no credentials, query, fragment, or `.git` suffix.

use tracing::debug;
use url::Url;

/// Code hosts whose URLs are rewritten to `https://host/<repository path>`.
const KNOWN_HOSTS: [&str; 3] = ["github.com", "gitlab.com", "bitbucket.org"];

/// Schemes accepted with an explicit `scheme://` prefix.
const SUPPORTED_SCHEMES: [&str; 4] = ["http", "https", "git", "ssh"];

/// Rebuild passes allowed before the output must be stable.
const MAX_REBUILDS: usize = 4;

/// Normalize a raw repository reference into a canonical URL.
///
/// Returns `None` for absent input, unsupported schemes, and input that does
/// not parse as a URL even after scp-style rewriting. Idempotent:
/// `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    let candidate = to_url_candidate(raw)?;
    let url = match Url::parse(&candidate) {
        Ok(url) => url,
        Err(err) => {
            debug!(source_url = raw, error = %err, "unparseable source url");
            return None;
        }
    };

    // ssh and git URLs keep backslashes, dot segments and encoded hosts that
    // an http(s) parse rewrites, so rebuild until the output reparses to itself
    let mut current = rebuild(&url)?;
    for _ in 0..MAX_REBUILDS {
        let next = rebuild(&Url::parse(&current).ok()?)?;
        if next == current {
            return Some(current);
        }
        current = next;
    }
    debug!(source_url = raw, "source url did not settle");
    None
}

/// Canonical `http(s)://host[:port]/path` for a parsed URL.
fn rebuild(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    let bare_host = host.strip_prefix("www.").unwrap_or(&host);

    if KNOWN_HOSTS.contains(&bare_host) {
        let path = repository_path(bare_host, url.path());
        return Some(format!("https://{}{}", bare_host, strip_git_suffix(&path)));
    }

    let path = strip_git_suffix(url.path());
    Some(match url.scheme() {
        "http" => format!("http://{}{}", with_port(&host, url.port()), path),
        "https" => format!("https://{}{}", with_port(&host, url.port()), path),
        // ssh and git ports are not https ports
        _ => format!("https://{}{}", host, path),
    })
}

/// Turn the raw reference into something `Url::parse` understands.
fn to_url_candidate(raw: &str) -> Option<String> {
    let raw = raw.strip_prefix("git+").unwrap_or(raw);

    match raw.split_once("://") {
        Some((scheme, rest)) => {
            let scheme = scheme.to_ascii_lowercase();
            if !SUPPORTED_SCHEMES.contains(&scheme.as_str()) {
                debug!(source_url = raw, "unsupported source url scheme");
                return None;
            }
            if scheme == "http" || scheme == "https" {
                Some(raw.to_string())
            } else {
                Some(format!("{}://{}", scheme, authority_path(rest, false)))
            }
        }
        // scp shorthand (`[user@]host:path`) or a bare `host/path`
        None => Some(format!("ssh://{}", authority_path(raw, true))),
    }
}

/// Rewrite `host:path` into `host/path`, keeping `host:2222/path` as a port.
///
/// In scp shorthand `host:123` names a repository, so digits are only a port
/// when a path follows them.
fn authority_path(spec: &str, scp: bool) -> String {
    match spec.split_once(':') {
        Some((authority, path)) if !authority.contains('/') => {
            let port_len = path.bytes().take_while(|b| b.is_ascii_digit()).count();
            let rest = &path[port_len..];
            let is_port = port_len > 0 && (rest.starts_with('/') || (!scp && rest.is_empty()));
            if is_port {
                spec.to_string()
            } else {
                format!("{}/{}", authority, path.trim_start_matches('/'))
            }
        }
        _ => spec.to_string(),
    }
}

/// Keep only the part of the path that names the repository.
fn repository_path(host: &str, path: &str) -> String {
    if host == "gitlab.com" {
        // GitLab allows nested groups, so cut at the first UI route instead
        let cut = ["/-/", "/tree/", "/blob/"]
            .iter()
            .filter_map(|marker| path.find(marker))
            .min()
            .unwrap_or(path.len());
        return path[..cut].to_string();
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).take(2).collect();
    if segments.is_empty() {
        String::new()
    } else {
        format!("/{}", segments.join("/"))
    }
}

fn with_port(host: &str, port: Option<u16>) -> String {
    match port {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Strip trailing slashes and `.git` from a path until neither remains.
fn strip_git_suffix(path: &str) -> String {
    let mut s = path;
    loop {
        let trimmed = s.trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
        if trimmed.len() == s.len() {
            return trimmed.to_string();
        }
        s = trimmed;
    }
}

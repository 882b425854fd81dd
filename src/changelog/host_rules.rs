//! Host-type overrides keyed by URL.

use serde::{Deserialize, Serialize};
use url::Url;

use super::ProviderId;

/// Maps URLs to the provider that serves them.
pub trait HostTypeResolver: Send + Sync {
    fn resolve_host_type(&self, url: &str) -> Option<ProviderId>;
}

/// One override: URLs on `match_host` are served by `host_type`.
///
/// `match_host` is either a hostname (matching the host and its subdomains)
/// or a URL prefix such as `https://git.example.com/mirrors/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRule {
    pub match_host: String,
    pub host_type: ProviderId,
}

impl HostRule {
    fn matches(&self, url: &str, host: Option<&str>) -> bool {
        if self.match_host.contains("://") {
            return url.starts_with(&self.match_host);
        }
        let wanted = self.match_host.to_ascii_lowercase();
        host.is_some_and(|host| {
            host == wanted
                || host
                    .strip_suffix(wanted.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

/// Ordered host rules; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct HostRules {
    rules: Vec<HostRule>,
}

impl HostRules {
    pub fn new(rules: Vec<HostRule>) -> Self {
        Self { rules }
    }
}

impl HostTypeResolver for HostRules {
    fn resolve_host_type(&self, url: &str) -> Option<ProviderId> {
        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase));
        self.rules
            .iter()
            .find(|rule| rule.matches(url, host.as_deref()))
            .map(|rule| rule.host_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> HostRules {
        HostRules::new(vec![
            HostRule {
                match_host: "https://code.example.com/mirrors/".to_string(),
                host_type: ProviderId::GitHub,
            },
            HostRule {
                match_host: "code.example.com".to_string(),
                host_type: ProviderId::GitLab,
            },
        ])
    }

    #[test]
    fn test_hostname_rule() {
        let rules = rules();
        assert_eq!(
            rules.resolve_host_type("https://code.example.com/team/app"),
            Some(ProviderId::GitLab)
        );
        assert_eq!(
            rules.resolve_host_type("https://git.code.example.com/team/app"),
            Some(ProviderId::GitLab)
        );
        assert_eq!(rules.resolve_host_type("https://notcode.example.com/team/app"), None);
    }

    #[test]
    fn test_prefix_rule_wins_when_first() {
        assert_eq!(
            rules().resolve_host_type("https://code.example.com/mirrors/tool"),
            Some(ProviderId::GitHub)
        );
    }

    #[test]
    fn test_unparseable_url() {
        assert_eq!(rules().resolve_host_type("not a url"), None);
    }

    #[test]
    fn test_rule_toml_shape() {
        let rule: HostRule =
            toml::from_str("match_host = \"git.example.com\"\nhost_type = \"gitlab\"").unwrap();
        assert_eq!(rule.host_type, ProviderId::GitLab);
    }
}

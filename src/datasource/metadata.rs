//! Metadata enrichment applied once to every freshly fetched release result.

use tracing::debug;

use super::client::ReleaseResult;
use super::source_url;

/// Repositories for packages whose registry metadata omits or misstates them.
const MANUAL_SOURCE_URLS: &[(&str, &str, &str)] = &[
    ("pypi", "coverage", "https://github.com/nedbat/coveragepy"),
    ("pypi", "mkdocs", "https://github.com/mkdocs/mkdocs"),
    ("pypi", "mypy", "https://github.com/python/mypy"),
    ("npm", "node", "https://github.com/nodejs/node"),
    ("npm", "typescript", "https://github.com/microsoft/TypeScript"),
    ("go", "gopkg.in/yaml.v2", "https://github.com/go-yaml/yaml"),
];

/// Changelogs that live outside the repository's release notes.
const MANUAL_CHANGELOG_URLS: &[(&str, &str, &str)] = &[
    ("pypi", "django", "https://github.com/django/django/tree/master/docs/releases"),
    ("pypi", "flake8", "https://flake8.pycqa.org/en/latest/release-notes/index.html"),
    ("pypi", "pip", "https://pip.pypa.io/en/stable/news/"),
    ("pypi", "sqlalchemy", "https://docs.sqlalchemy.org/en/latest/changelog/"),
];

const DEPRECATED_EVERYWHERE: &str = "all published releases are deprecated";

fn manual_lookup(
    table: &[(&str, &str, &str)],
    datasource: &str,
    lookup_name: &str,
) -> Option<String> {
    table
        .iter()
        .find(|(ds, name, _)| *ds == datasource && name.eq_ignore_ascii_case(lookup_name))
        .map(|(_, _, url)| url.to_string())
}

fn is_code_host(url: &str) -> bool {
    source_url::normalize(Some(url)).is_some_and(|normalized| {
        normalized.starts_with("https://github.com/") || normalized.starts_with("https://gitlab.com/")
    })
}

/// Fill in and clean up source, changelog, and deprecation metadata.
pub fn add_metadata(result: &mut ReleaseResult, datasource: &str, lookup_name: &str) {
    if let Some(url) = manual_lookup(MANUAL_CHANGELOG_URLS, datasource, lookup_name) {
        result.changelog_url = Some(url);
    }

    if let Some(url) = manual_lookup(MANUAL_SOURCE_URLS, datasource, lookup_name) {
        result.source_url = Some(url);
    }

    if result.source_url.is_none()
        && let Some(homepage) = result.homepage.as_deref()
        && is_code_host(homepage)
    {
        debug!(datasource, lookup = lookup_name, "using homepage as source url");
        result.source_url = Some(homepage.to_string());
    }

    if result.source_url.is_some() {
        result.source_url = source_url::normalize(result.source_url.as_deref());
    }

    if result.deprecation_message.is_none()
        && !result.releases.is_empty()
        && result.releases.iter().all(|r| r.is_deprecated)
    {
        result.deprecation_message = Some(DEPRECATED_EVERYWHERE.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::Release;

    fn django_like() -> ReleaseResult {
        ReleaseResult {
            releases: vec![
                Release::new("2.0.0"),
                Release::new("2.0.0.dev1"),
                Release::new("2.1.0"),
                Release::new("2.2.0"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_manual_changelog_url() {
        let mut dep = django_like();
        add_metadata(&mut dep, "pypi", "django");
        assert_eq!(
            dep.changelog_url.as_deref(),
            Some("https://github.com/django/django/tree/master/docs/releases")
        );
        assert!(dep.source_url.is_none());
    }

    #[test]
    fn test_manual_source_url() {
        let mut dep = django_like();
        add_metadata(&mut dep, "pypi", "Coverage");
        assert_eq!(
            dep.source_url.as_deref(),
            Some("https://github.com/nedbat/coveragepy")
        );
    }

    #[test]
    fn test_manual_tables_are_per_datasource() {
        let mut dep = django_like();
        add_metadata(&mut dep, "npm", "django");
        assert!(dep.changelog_url.is_none());
    }

    #[test]
    fn test_source_url_cleanup() {
        let mut dep = django_like();
        dep.source_url = Some("https://github.com/carltongibson/django-filter/tree/master".to_string());
        add_metadata(&mut dep, "pypi", "django-filter");
        assert_eq!(
            dep.source_url.as_deref(),
            Some("https://github.com/carltongibson/django-filter")
        );

        let mut dep = django_like();
        dep.source_url = Some("https://gitlab.com/meno/dropzone/tree/master".to_string());
        add_metadata(&mut dep, "npm", "dropzone");
        assert_eq!(dep.source_url.as_deref(), Some("https://gitlab.com/meno/dropzone"));
    }

    #[test]
    fn test_http_www_github() {
        let mut dep = ReleaseResult {
            source_url: Some("http://www.github.com/mockk/mockk/".to_string()),
            releases: vec![Release::new("1.9.3")],
            ..Default::default()
        };
        add_metadata(&mut dep, "maven", "io.mockk:mockk");
        assert_eq!(dep.source_url.as_deref(), Some("https://github.com/mockk/mockk"));
    }

    #[test]
    fn test_homepage_backfills_source_url() {
        let mut dep = ReleaseResult {
            homepage: Some("https://github.com/sindresorhus/got#readme".to_string()),
            releases: vec![Release::new("1.0.0")],
            ..Default::default()
        };
        add_metadata(&mut dep, "npm", "got");
        assert_eq!(dep.source_url.as_deref(), Some("https://github.com/sindresorhus/got"));

        let mut dep = ReleaseResult {
            homepage: Some("https://got.example.com".to_string()),
            releases: vec![Release::new("1.0.0")],
            ..Default::default()
        };
        add_metadata(&mut dep, "npm", "got");
        assert!(dep.source_url.is_none());
    }

    #[test]
    fn test_all_deprecated() {
        let mut dep = ReleaseResult {
            releases: vec![
                Release {
                    is_deprecated: true,
                    ..Release::new("1.0.0")
                },
                Release {
                    is_deprecated: true,
                    ..Release::new("1.1.0")
                },
            ],
            ..Default::default()
        };
        add_metadata(&mut dep, "npm", "request");
        assert_eq!(dep.deprecation_message.as_deref(), Some(DEPRECATED_EVERYWHERE));

        let mut dep = django_like();
        dep.releases[0].is_deprecated = true;
        add_metadata(&mut dep, "pypi", "django");
        assert!(dep.deprecation_message.is_none());
    }
}

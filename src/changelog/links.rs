//! Markdown links describing an upgraded dependency.

/// Where an upgraded dependency lives.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpgradeMetadata<'a> {
    pub dep_name: &'a str,
    pub homepage: Option<&'a str>,
    pub source_url: Option<&'a str>,
    /// Package directory inside a monorepo.
    pub source_directory: Option<&'a str>,
    pub changelog_url: Option<&'a str>,
}

/// Rendered links for an upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeLinks {
    /// `[name](homepage)` with `([source](..), [changelog](..))` appended.
    pub dep_name_linked: String,
    /// `[homepage](..), [source](..), [changelog](..)`, whichever exist.
    pub references: String,
}

impl UpgradeLinks {
    pub fn build(meta: &UpgradeMetadata<'_>) -> Self {
        let homepage = meta.homepage.filter(|s| !s.is_empty());
        let source_url = meta.source_url.filter(|s| !s.is_empty());
        let changelog_url = meta.changelog_url.filter(|s| !s.is_empty());

        let mut dep_name_linked = match homepage.or(source_url) {
            Some(link) => format!("[{}]({})", meta.dep_name, link),
            None => meta.dep_name.to_string(),
        };

        let mut other_links = Vec::new();
        if let (Some(_), Some(source)) = (homepage, source_url) {
            other_links.push(format!("[source]({})", source));
        }
        if let Some(changelog) = changelog_url {
            other_links.push(format!("[changelog]({})", changelog));
        }
        if !other_links.is_empty() {
            dep_name_linked.push_str(&format!(" ({})", other_links.join(", ")));
        }

        let mut references = Vec::new();
        if let Some(homepage) = homepage {
            references.push(format!("[homepage]({})", homepage));
        }
        if let Some(source) = source_url {
            let full_url = match meta.source_directory.map(|d| d.trim_start_matches('/')) {
                Some(dir) if !dir.is_empty() => {
                    format!("{}/tree/HEAD/{}", source.trim_end_matches('/'), dir)
                }
                _ => source.to_string(),
            };
            references.push(format!("[source]({})", full_url));
        }
        if let Some(changelog) = changelog_url {
            references.push(format!("[changelog]({})", changelog));
        }

        Self {
            dep_name_linked,
            references: references.join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_links() {
        let links = UpgradeLinks::build(&UpgradeMetadata {
            dep_name: "react",
            homepage: Some("https://react.dev"),
            source_url: Some("https://github.com/facebook/react"),
            source_directory: Some("/packages/react"),
            changelog_url: Some("https://github.com/facebook/react/blob/main/CHANGELOG.md"),
        });
        assert_eq!(
            links.dep_name_linked,
            "[react](https://react.dev) ([source](https://github.com/facebook/react), \
             [changelog](https://github.com/facebook/react/blob/main/CHANGELOG.md))"
        );
        assert_eq!(
            links.references,
            "[homepage](https://react.dev), \
             [source](https://github.com/facebook/react/tree/HEAD/packages/react), \
             [changelog](https://github.com/facebook/react/blob/main/CHANGELOG.md)"
        );
    }

    #[test]
    fn test_source_only() {
        let links = UpgradeLinks::build(&UpgradeMetadata {
            dep_name: "left-pad",
            source_url: Some("https://github.com/stevemao/left-pad"),
            ..Default::default()
        });
        assert_eq!(links.dep_name_linked, "[left-pad](https://github.com/stevemao/left-pad)");
        assert_eq!(links.references, "[source](https://github.com/stevemao/left-pad)");
    }

    #[test]
    fn test_no_links() {
        let links = UpgradeLinks::build(&UpgradeMetadata {
            dep_name: "internal",
            ..Default::default()
        });
        assert_eq!(links.dep_name_linked, "internal");
        assert_eq!(links.references, "");
    }
}

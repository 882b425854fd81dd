//! Strict semantic versioning, tolerating a leading `v` or `=`.

use std::cmp::Ordering;

use ::semver::Version;

use super::VersionScheme;

pub struct Semver;

fn parse(version: &str) -> Option<Version> {
    let v = version.trim();
    let v = v
        .strip_prefix('v')
        .or_else(|| v.strip_prefix('='))
        .unwrap_or(v);
    Version::parse(v).ok()
}

impl VersionScheme for Semver {
    fn id(&self) -> &'static str {
        "semver"
    }

    fn is_valid(&self, version: &str) -> bool {
        parse(version).is_some()
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        match (parse(a), parse(b)) {
            (Some(a), Some(b)) => a.cmp(&b),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    }
}

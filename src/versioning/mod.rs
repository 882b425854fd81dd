//! Version schemes: validity checks and ordering for families of version strings.
//!
//! Release lists coming out of a datasource are opaque strings. A scheme decides
//! which of them are versions at all and how they sort.

#![allow(dead_code)]

mod loose;
mod semver;

pub use self::loose::Loose;
pub use self::semver::Semver;

use std::cmp::Ordering;

use tracing::warn;

/// Scheme used when a query does not name one.
pub const DEFAULT_SCHEME: &str = "semver";

/// A comparator and validator for one family of version strings.
pub trait VersionScheme: Send + Sync {
    /// Identifier used to select this scheme (e.g. `"semver"`).
    fn id(&self) -> &'static str;

    /// Whether `version` belongs to this scheme.
    fn is_valid(&self, version: &str) -> bool;

    /// Total order over versions. Only meaningful when both sides are valid;
    /// invalid strings sort before valid ones.
    fn compare(&self, a: &str, b: &str) -> Ordering;

    /// Equality under the scheme, which may differ from string equality
    /// (`1.0` and `1.0.0` are equal for the loose scheme).
    fn equals(&self, a: &str, b: &str) -> bool {
        if self.is_valid(a) && self.is_valid(b) {
            self.compare(a, b) == Ordering::Equal
        } else {
            a == b
        }
    }
}

static SEMVER: Semver = Semver;
static LOOSE: Loose = Loose;

/// Look up a scheme by id.
pub fn lookup(id: &str) -> Option<&'static dyn VersionScheme> {
    match id {
        "semver" => Some(&SEMVER),
        "loose" => Some(&LOOSE),
        _ => None,
    }
}

/// Get a scheme by id, falling back to semver for unknown ids.
pub fn get(id: &str) -> &'static dyn VersionScheme {
    lookup(id).unwrap_or_else(|| {
        warn!(versioning = id, "unknown version scheme, using {}", DEFAULT_SCHEME);
        &SEMVER
    })
}

/// Ids of every built-in scheme.
pub fn available() -> &'static [&'static str] {
    &["semver", "loose"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_schemes() {
        for id in available() {
            assert_eq!(lookup(id).map(|s| s.id()), Some(*id));
        }
    }

    #[test]
    fn test_unknown_scheme_falls_back_to_semver() {
        assert!(lookup("calver").is_none());
        assert_eq!(get("calver").id(), "semver");
    }

    #[test]
    fn test_equals_falls_back_to_string_equality() {
        let scheme = get("semver");
        assert!(scheme.equals("latest", "latest"));
        assert!(!scheme.equals("latest", "1.0.0"));
    }
}

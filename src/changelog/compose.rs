//! Renders provider output into one markdown document and makes it safe to
//! post on a code host.
//!
//! Sanitization is an ordered list of pure string transforms. Later steps undo
//! parts of earlier ones, so the order in [`PIPELINE`] is load-bearing.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::ChangeLogResult;
use crate::versioning::VersionScheme;

/// Zero-width space as an HTML entity. Breaks auto-linking of `#123` and `@user`.
pub const ZERO_WIDTH_SPACE: &str = "&#8203;";

/// Placed between the notes of consecutive versions.
pub const SECTION_DELIMITER: &str = "\n\n---\n\n";

/// A named string transform.
pub struct Transform {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

/// Sanitization steps, applied first to last.
pub const PIPELINE: &[Transform] = &[
    Transform {
        name: "collapse_double_v",
        apply: collapse_double_v,
    },
    Transform {
        name: "break_issue_refs",
        apply: break_issue_refs,
    },
    Transform {
        name: "break_mentions",
        apply: break_mentions,
    },
    Transform {
        name: "restore_code_mentions",
        apply: restore_code_mentions,
    },
    Transform {
        name: "restore_package_specs",
        apply: restore_package_specs,
    },
    Transform {
        name: "restore_compare_base",
        apply: restore_compare_base,
    },
    Transform {
        name: "restore_compare_head",
        apply: restore_compare_head,
    },
    Transform {
        name: "unescape_backticks",
        apply: unescape_backticks,
    },
    Transform {
        name: "strip_code_span_separators",
        apply: strip_code_span_separators,
    },
];

static DOUBLE_V: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(### \[?`)vv").expect("valid regex"));
static CODE_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(`\[?@)&#8203;").expect("valid regex"));
static PACKAGE_SPEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([a-z]@)&#8203;").expect("valid regex"));
static COMPARE_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(/compare/[^\s)]*?)\.\.\.@&#8203;").expect("valid regex"));
static ESCAPED_BACKTICKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#x60;([^/]*?)&#x60;").expect("valid regex"));
static CODE_SPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`\n]*`").expect("valid regex"));

/// Template double-prefixing turns `v1.0.0` headers into `vv1.0.0`.
pub fn collapse_double_v(text: &str) -> String {
    DOUBLE_V.replace_all(text, "${1}v").into_owned()
}

/// `#12` becomes `#&#8203;12`. A `#` that is part of an entity is left alone.
pub fn break_issue_refs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '#' && prev != Some('&') && chars.peek().is_some_and(char::is_ascii_digit) {
            out.push_str(ZERO_WIDTH_SPACE);
        }
        prev = Some(c);
    }
    out
}

pub fn break_mentions(text: &str) -> String {
    text.replace('@', &format!("@{}", ZERO_WIDTH_SPACE))
}

/// `` `@scope/pkg` `` and `` `[@user` `` stay intact.
pub fn restore_code_mentions(text: &str) -> String {
    CODE_MENTION.replace_all(text, "${1}").into_owned()
}

/// `pkg@1.2.3` and email addresses stay intact.
pub fn restore_package_specs(text: &str) -> String {
    PACKAGE_SPEC.replace_all(text, "${1}").into_owned()
}

pub fn restore_compare_base(text: &str) -> String {
    text.replace(&format!("/compare/@{}", ZERO_WIDTH_SPACE), "/compare/@")
}

/// The head ref of a compare link: `/compare/@a...@b`.
pub fn restore_compare_head(text: &str) -> String {
    COMPARE_HEAD.replace_all(text, "${1}...@").into_owned()
}

pub fn unescape_backticks(text: &str) -> String {
    ESCAPED_BACKTICKS.replace_all(text, "`${1}`").into_owned()
}

pub fn strip_code_span_separators(text: &str) -> String {
    CODE_SPAN
        .replace_all(text, |caps: &Captures| caps[0].replace(ZERO_WIDTH_SPACE, ""))
        .into_owned()
}

/// Run every pipeline step in order.
pub fn sanitize(text: &str) -> String {
    PIPELINE
        .iter()
        .fold(text.to_string(), |acc, step| (step.apply)(&acc))
}

/// Newest-first markdown sections, one per version. Not yet sanitized.
pub fn render_sections(result: &ChangeLogResult, scheme: &dyn VersionScheme) -> String {
    let mut entries: Vec<_> = result.entries.iter().collect();
    entries.sort_by(|a, b| scheme.compare(&b.version, &a.version));

    entries
        .iter()
        .map(|entry| {
            let header = match &entry.compare_url {
                Some(url) => format!("### [`v{}`]({})", entry.version, url),
                None => format!("### `v{}`", entry.version),
            };
            format!("{}\n\n{}", header, entry.notes_markdown.trim())
        })
        .collect::<Vec<_>>()
        .join(SECTION_DELIMITER)
}

/// The complete, sanitized release notes document.
pub fn compose(result: &ChangeLogResult, scheme: &dyn VersionScheme) -> String {
    sanitize(&render_sections(result, scheme))
}

//! Loose dotted-numeric versions (`1`, `1.2`, `1.2.3.4`, `2.0.0.dev1`).
//!
//! Missing trailing segments count as zero, so `1.0` equals `1.0.0`. A suffix
//! after the numeric part marks a pre-release and sorts before the bare release.

use std::cmp::Ordering;

use super::VersionScheme;

pub struct Loose;

#[derive(Debug, PartialEq, Eq)]
struct LooseVersion<'a> {
    release: Vec<u64>,
    suffix: Option<&'a str>,
}

fn parse(version: &str) -> Option<LooseVersion<'_>> {
    let v = version.trim();
    let v = v.strip_prefix(['v', 'V']).unwrap_or(v);

    let end = v
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(v.len());
    let (numeric, rest) = v.split_at(end);

    let numeric = match numeric.strip_suffix('.') {
        Some(trimmed) if !rest.is_empty() => trimmed,
        Some(_) => return None,
        None => numeric,
    };
    if numeric.is_empty() {
        return None;
    }

    let release = numeric
        .split('.')
        .map(|segment| segment.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;

    let suffix = rest.trim_start_matches(['-', '+', '_']);
    if suffix.is_empty() {
        if !rest.is_empty() {
            return None;
        }
        return Some(LooseVersion {
            release,
            suffix: None,
        });
    }

    if !suffix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_'))
    {
        return None;
    }

    Some(LooseVersion {
        release,
        suffix: Some(suffix),
    })
}

fn compare_release(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

impl VersionScheme for Loose {
    fn id(&self) -> &'static str {
        "loose"
    }

    fn is_valid(&self, version: &str) -> bool {
        parse(version).is_some()
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        let (pa, pb) = match (parse(a), parse(b)) {
            (Some(pa), Some(pb)) => (pa, pb),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (None, None) => return a.cmp(b),
        };

        compare_release(&pa.release, &pb.release).then_with(|| match (pa.suffix, pb.suffix) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => x.cmp(y),
        })
    }
}

//! Slug generation for link types
//!
//! Names are normalised to lower-kebab-case; when the slug is already taken the
//! next free numeric suffix is appended (`cross-sell`, `cross-sell-2`, ...).

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const SEPARATOR: char = '-';

fn disallowed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^-\p{L}\p{N}\s]+").expect("static regex"))
}

fn separators() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-\s]+").expect("static regex"))
}

/// Normalise a human-readable name into a slug.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase().replace('_', "-").replace('@', " at ");
    let stripped = disallowed().replace_all(&lowered, "");
    let joined = separators().replace_all(&stripped, "-");
    joined.trim_matches(SEPARATOR).to_string()
}

/// Pick a slug derived from `base` that does not collide with `taken`.
///
/// `taken` only needs to contain slugs equal to `base` or starting with `base-`;
/// anything else is ignored.
pub fn unique_slug<S: AsRef<str>>(base: &str, taken: &[S]) -> String {
    if !taken.iter().any(|s| s.as_ref() == base) {
        return base.to_string();
    }

    let prefix = format!("{base}{SEPARATOR}");
    let suffixes: HashSet<u64> = taken
        .iter()
        .filter_map(|s| s.as_ref().strip_prefix(prefix.as_str()))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .collect();

    let highest = suffixes.iter().copied().max().unwrap_or(1).max(1);
    let next = match highest.checked_add(1) {
        Some(next) => next,
        // Suffix space exhausted at the top; take the lowest gap instead.
        None => (2..).find(|n| !suffixes.contains(n)).unwrap_or(2),
    };

    format!("{base}{SEPARATOR}{next}")
}

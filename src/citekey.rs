use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::record::Record;

const TITLE_SLUG_LEN: usize = 30;
const SUFFIX_SLUG_LEN: usize = 12;

/// Lowercase `text`, keep only word characters, whitespace and hyphens, and turn every run of
/// whitespace, underscores or hyphens into a single hyphen.
pub fn slugify(text: &str) -> String {
    static STRIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
    static SEP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_-]+").unwrap());

    let kept = STRIP_RE.replace_all(text, "");
    let lowered = kept.trim().to_lowercase();
    SEP_RE.replace_all(&lowered, "-").into_owned()
}

fn truncate(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Derive the citation key for `record`.
///
/// The key is `<surname><year><title slug>`, suffixed with a slug of the DOI or, failing
/// that, of the EID. A record with none of those gets `ref<today>`. Two records that share
/// surname, year and title prefix and carry neither identifier end up with the same key.
pub fn citekey(record: &Record, today: NaiveDate) -> String {
    let first_author = record
        .authors
        .first()
        .and_then(|name| name.split_whitespace().last())
        .map(slugify)
        .unwrap_or_default();
    let year = record.year.as_deref().unwrap_or_default();
    let title = slugify(record.title.as_deref().unwrap_or_default());
    let title = truncate(&title, TITLE_SLUG_LEN);

    let base = format!("{first_author}{year}{title}");
    let base = base.trim_matches('-');

    let suffix = record
        .doi
        .as_deref()
        .filter(|d| !d.is_empty())
        .or_else(|| record.eid.as_deref().filter(|e| !e.is_empty()));
    match suffix {
        Some(id) => format!("{base}_{}", truncate(&slugify(id), SUFFIX_SLUG_LEN)),
        None if !base.is_empty() => base.to_string(),
        None => format!("ref{}", today.format("%Y%m%d")),
    }
}

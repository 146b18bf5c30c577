use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::identifier::Identifier;

/// An ORCID iD in its bare `NNNN-NNNN-NNNN-NNNX` form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Orcid(String);

static ORCID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{4}-\d{4}-\d{3}[\dX]$").unwrap());

impl Orcid {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether an ORCID found in fetched metadata denotes this researcher.
    ///
    /// Metadata may carry the iD as a URL or with a lowercase check character.
    pub fn matches(&self, embedded: &str) -> bool {
        strip_prefixes(embedded).eq_ignore_ascii_case(self.as_str())
    }
}

fn strip_prefixes(s: &str) -> &str {
    let s = s.trim();
    let s = s
        .strip_prefix("https://orcid.org/")
        .or_else(|| s.strip_prefix("http://orcid.org/"))
        .or_else(|| s.strip_prefix("orcid.org/"))
        .or_else(|| s.strip_prefix("orcid:"))
        .or_else(|| s.strip_prefix("ORCID:"))
        .unwrap_or(s);
    s.trim_matches('/').trim()
}

impl Identifier for Orcid {
    const KIND: &'static str = "ORCID iD";

    fn parse(identifier: &str) -> Option<Self> {
        let s = strip_prefixes(identifier).to_ascii_uppercase();
        ORCID_RE.is_match(&s).then_some(Orcid(s))
    }
}

impl fmt::Display for Orcid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

use std::fmt;

use crate::identifier::Identifier;

/// A Scopus author identifier (`AU-ID`), a plain run of digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AuthorId(String);

impl AuthorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Identifier for AuthorId {
    const KIND: &'static str = "Scopus author id";

    fn parse(identifier: &str) -> Option<Self> {
        let mut s = identifier.trim();
        if let Some(rest) = s
            .strip_prefix("AU-ID:")
            .or_else(|| s.strip_prefix("au-id:"))
        {
            s = rest.trim_start();
        }
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(AuthorId(s.to_string()))
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

use std::fmt::Display;

pub mod author;
pub mod orcid;

pub use author::AuthorId;
pub use orcid::Orcid;

pub trait Identifier: Sized + Display {
    /// Human-readable name of the identifier scheme, for diagnostics.
    const KIND: &'static str;

    fn parse(identifier: &str) -> Option<Self>;
}

/// Parse every non-blank input, logging and dropping the ones that are not valid `I`s.
///
/// Order is preserved and repeats are removed, so the same identifier given twice is only
/// queried once.
pub fn parse_all<I, S>(inputs: &[S]) -> Vec<I>
where
    I: Identifier + PartialEq,
    S: AsRef<str>,
{
    let mut out: Vec<I> = Vec::new();
    for raw in inputs.iter().map(AsRef::as_ref) {
        if raw.trim().is_empty() {
            continue;
        }
        match I::parse(raw) {
            Some(id) if !out.contains(&id) => out.push(id),
            Some(_) => {}
            None => tracing::warn!(input = raw, "ignoring malformed {}", I::KIND),
        }
    }
    out
}

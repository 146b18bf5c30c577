use std::collections::HashSet;

use crate::record::Record;

/// Keep the identifiers not yet in `seen`, in order, and remember them.
pub fn first_seen<I>(ids: I, seen: &mut HashSet<String>) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

/// Drop repeated documents: first by EID, then by (case-insensitive) DOI.
///
/// The first occurrence wins in both passes. Records without a DOI are never dropped by the
/// second pass.
pub fn dedupe(records: Vec<Record>) -> Vec<Record> {
    let mut eids = HashSet::new();
    let mut dois = HashSet::new();
    records
        .into_iter()
        .filter(|r| match &r.eid {
            Some(eid) => eids.insert(eid.clone()),
            None => true,
        })
        .filter(|r| match r.doi.as_deref().map(str::trim) {
            Some(doi) if !doi.is_empty() => dois.insert(doi.to_lowercase()),
            _ => true,
        })
        .collect()
}

/// Newest first; undated records last; ties by title, ignoring case.
pub fn sort(records: &mut [Record]) {
    records.sort_by_cached_key(|r| {
        (
            std::cmp::Reverse(r.year_number()),
            r.title.as_deref().unwrap_or_default().to_lowercase(),
        )
    });
}

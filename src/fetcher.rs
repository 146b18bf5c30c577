use std::collections::HashSet;

use chrono::NaiveDate;
use indicatif::ProgressBar;

use crate::{
    dedup::first_seen,
    identifier::AuthorId,
    normalize::normalize,
    record::Record,
    source::{Query, Source, SourceError},
};

/// A document that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub eid: String,
    pub reason: String,
}

/// What fetching one author's documents produced.
#[derive(Debug, Default)]
pub struct Batch {
    pub records: Vec<Record>,
    pub failures: Vec<Failure>,
}

/// Fetch and normalise every document attributed to `author`.
///
/// Documents whose EID is already in `seen` (fetched for an earlier author) are skipped. A
/// document that fails to fetch is logged and recorded in [`Batch::failures`]; only a failure
/// of the search itself is returned as an error.
pub fn fetch_author<S: Source>(
    source: &S,
    author: &AuthorId,
    seen: &mut HashSet<String>,
    today: NaiveDate,
    progress: &ProgressBar,
) -> Result<Batch, SourceError> {
    let all = source.search(&Query::Author(author.clone()))?;
    let found = all.len();
    let eids = first_seen(all, seen);
    tracing::info!(%author, found, new = eids.len(), "fetching documents");

    progress.inc_length(eids.len() as u64);
    let mut batch = Batch::default();
    for eid in eids {
        progress.set_message(eid.clone());
        match source.document(&eid) {
            Ok(doc) => batch.records.push(normalize(&eid, &doc, today)),
            Err(e) => {
                let failure = Failure {
                    eid,
                    reason: e.to_string(),
                };
                progress.suspend(|| {
                    tracing::warn!(eid = %failure.eid, error = %failure.reason, "skipping document")
                });
                batch.failures.push(failure);
            }
        }
        progress.inc(1);
    }
    Ok(batch)
}

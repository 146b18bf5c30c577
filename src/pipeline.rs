use std::collections::HashSet;

use chrono::NaiveDate;
use indicatif::ProgressBar;
use thiserror::Error;

use crate::{
    dedup,
    fetcher::{Failure, fetch_author},
    identifier::{AuthorId, Identifier, Orcid},
    record::Record,
    resolver::resolve_orcids,
    source::{Source, SourceError},
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(
        "no Scopus author identifiers to export: set SCOPUS_AUTHOR_IDS, or ORCID_IDS that resolve to Scopus authors"
    )]
    NoAuthorIds,
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Who to export.
#[derive(Debug, Default)]
pub struct Inputs {
    pub author_ids: Vec<AuthorId>,
    /// Only consulted when `author_ids` is empty.
    pub orcids: Vec<Orcid>,
}

/// The deduplicated, sorted records of a run plus the documents that were skipped.
#[derive(Debug, Default)]
pub struct Outcome {
    pub authors: Vec<AuthorId>,
    pub records: Vec<Record>,
    pub failures: Vec<Failure>,
}

/// Work out which authors to export.
pub fn author_ids<S: Source>(source: &S, inputs: &Inputs) -> Result<Vec<AuthorId>, PipelineError> {
    if !inputs.author_ids.is_empty() {
        return Ok(inputs.author_ids.clone());
    }
    if inputs.orcids.is_empty() {
        return Err(PipelineError::NoAuthorIds);
    }
    let resolved: Vec<AuthorId> = resolve_orcids(source, &inputs.orcids)?
        .iter()
        .filter_map(|id| AuthorId::parse(id))
        .collect();
    if resolved.is_empty() {
        return Err(PipelineError::NoAuthorIds);
    }
    tracing::info!(
        ids = %resolved.iter().map(ToString::to_string).collect::<Vec<_>>().join(","),
        "resolved Scopus author ids from ORCID"
    );
    Ok(resolved)
}

/// Resolve authors, fetch their documents, and return the records in output order.
pub fn run<S: Source>(
    source: &S,
    inputs: &Inputs,
    today: NaiveDate,
    progress: &ProgressBar,
) -> Result<Outcome, PipelineError> {
    let authors = author_ids(source, inputs)?;

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    let mut failures = Vec::new();
    for author in &authors {
        let batch = fetch_author(source, author, &mut seen, today, progress)?;
        records.extend(batch.records);
        failures.extend(batch.failures);
    }

    let fetched = records.len();
    let mut records = dedup::dedupe(records);
    if records.len() < fetched {
        tracing::info!(dropped = fetched - records.len(), "dropped duplicate DOIs");
    }
    dedup::sort(&mut records);

    Ok(Outcome {
        authors,
        records,
        failures,
    })
}

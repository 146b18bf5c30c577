use std::collections::BTreeSet;

use crate::{
    identifier::Orcid,
    source::{Query, Source, SourceError},
};

/// Find the Scopus author identifiers behind a set of ORCID iDs.
///
/// Every document tagged with one of the iDs is fetched and its author list scanned for the
/// entry carrying that iD. A document that cannot be fetched is skipped; a search that fails
/// is returned as an error.
pub fn resolve_orcids<S: Source>(
    source: &S,
    orcids: &[Orcid],
) -> Result<BTreeSet<String>, SourceError> {
    let mut found = BTreeSet::new();
    for orcid in orcids {
        let eids = source.search(&Query::Orcid(orcid.clone()))?;
        tracing::debug!(%orcid, documents = eids.len(), "resolving ORCID");
        let before = found.len();
        for eid in eids {
            let doc = match source.document(&eid) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::debug!(%eid, error = %e, "skipping document during ORCID lookup");
                    continue;
                }
            };
            found.extend(
                doc.authors
                    .into_iter()
                    .filter(|a| a.orcid.as_deref().is_some_and(|o| orcid.matches(o)))
                    .filter_map(|a| a.auid),
            );
        }
        if found.len() == before {
            tracing::warn!(%orcid, "no new Scopus author id found for ORCID");
        }
    }
    Ok(found)
}

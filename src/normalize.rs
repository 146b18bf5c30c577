use chrono::NaiveDate;

use crate::{
    citekey::citekey,
    record::{EntryType, Record},
    source::{Document, DocumentAuthor},
};

/// Turn fetched metadata into a keyed [`Record`].
///
/// `eid` is the identifier the document was requested under; it stands in when the metadata
/// does not repeat it. `today` only matters for records that end up with a date-based key.
pub fn normalize(eid: &str, doc: &Document, today: NaiveDate) -> Record {
    let mut record = Record {
        entry_type: EntryType::from_aggregation(doc.aggregation_type.as_deref()),
        title: clean(doc.title.as_deref()),
        authors: doc.authors.iter().filter_map(full_name).collect(),
        year: year(doc.cover_date.as_deref()),
        venue: clean(doc.publication_name.as_deref()),
        volume: clean(doc.volume.as_deref()),
        number: clean(doc.issue.as_deref()),
        pages: pages(doc),
        doi: clean(doc.doi.as_deref()),
        url: clean(doc.web_url.as_deref()).or_else(|| clean(doc.api_url.as_deref())),
        eid: clean(doc.eid.as_deref()).or_else(|| clean(Some(eid))),
        citekey: String::new(),
    };
    record.citekey = citekey(&record, today);
    record
}

fn clean(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// "Given Surname", or the indexed name turned around when the parts are missing.
fn full_name(author: &DocumentAuthor) -> Option<String> {
    let parts: Vec<String> = [author.given_name.as_deref(), author.surname.as_deref()]
        .into_iter()
        .filter_map(clean)
        .collect();
    if parts.is_empty() {
        clean(author.indexed_name.as_deref()).map(|name| from_indexed(&name))
    } else {
        Some(parts.join(" "))
    }
}

/// Indexed names read "Surname I.", so the initials move to the front.
fn from_indexed(name: &str) -> String {
    match name.rsplit_once(char::is_whitespace) {
        Some((surname, initials)) => format!("{initials} {}", surname.trim_end()),
        None => name.to_string(),
    }
}

fn year(cover_date: Option<&str>) -> Option<String> {
    let date = cover_date?.trim();
    let year = date.get(..4)?;
    year.bytes().all(|b| b.is_ascii_digit()).then(|| year.to_string())
}

fn pages(doc: &Document) -> Option<String> {
    if let Some(range) = clean(doc.page_range.as_deref()) {
        return Some(range);
    }
    match (
        clean(doc.starting_page.as_deref()),
        clean(doc.ending_page.as_deref()),
    ) {
        (Some(start), Some(end)) if start != end => Some(format!("{start}-{end}")),
        (Some(start), _) => Some(start),
        (None, _) => None,
    }
}

//! In-memory source for tests.

use std::{cell::RefCell, collections::HashMap};

use crate::source::{Document, DocumentAuthor, Query, Source, SourceError};

#[derive(Default)]
pub struct StaticSource {
    searches: HashMap<String, Vec<String>>,
    documents: HashMap<String, Document>,
    broken: Vec<String>,
    /// Every EID passed to `document`, in call order.
    pub fetched: RefCell<Vec<String>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, query: &str, eids: &[&str]) -> Self {
        self.searches
            .insert(query.to_string(), eids.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_document(mut self, eid: &str, doc: Document) -> Self {
        self.documents.insert(eid.to_string(), doc);
        self
    }

    /// Make fetching `eid` fail.
    pub fn with_broken(mut self, eid: &str) -> Self {
        self.broken.push(eid.to_string());
        self
    }
}

impl Source for StaticSource {
    fn search(&self, query: &Query) -> Result<Vec<String>, SourceError> {
        self.searches
            .get(&query.to_string())
            .cloned()
            .ok_or_else(|| SourceError::Malformed(format!("no such query: {query}")))
    }

    fn document(&self, eid: &str) -> Result<Document, SourceError> {
        self.fetched.borrow_mut().push(eid.to_string());
        if self.broken.iter().any(|b| b == eid) {
            return Err(SourceError::Malformed(format!("{eid} is broken")));
        }
        self.documents
            .get(eid)
            .cloned()
            .ok_or_else(|| SourceError::Malformed(format!("no such document: {eid}")))
    }
}

/// A document with the fields most tests care about.
pub fn doc(eid: &str, title: &str, year: &str, doi: Option<&str>, authors: &[&str]) -> Document {
    Document {
        eid: Some(eid.to_string()),
        title: Some(title.to_string()),
        cover_date: Some(format!("{year}-01-01")),
        doi: doi.map(str::to_string),
        aggregation_type: Some("Journal".into()),
        publication_name: Some("J. Testing".into()),
        authors: authors
            .iter()
            .map(|&name| {
                let (given, surname) = name.rsplit_once(' ').unwrap_or(("", name));
                DocumentAuthor {
                    given_name: Some(given.to_string()).filter(|s| !s.is_empty()),
                    surname: Some(surname.to_string()),
                    ..DocumentAuthor::default()
                }
            })
            .collect(),
        ..Document::default()
    }
}

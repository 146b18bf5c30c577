//! Access to the bibliographic database.
//!
//! Everything downstream talks to a [`Source`], constructed once in `main` and borrowed
//! read-only for the rest of the run. [`scopus::ScopusClient`] is the real implementation;
//! tests use an in-memory one.

use std::fmt;

use thiserror::Error;

use crate::identifier::{AuthorId, Orcid};

pub mod scopus;

#[cfg(test)]
pub mod mock;

/// A document search the database understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Documents attributed to a Scopus author.
    Author(AuthorId),
    /// Documents whose author metadata carries an ORCID iD.
    Orcid(Orcid),
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Author(id) => write!(f, "AU-ID({})", id.as_str()),
            Query::Orcid(id) => write!(f, "ORCID({})", id.as_str()),
        }
    }
}

/// Metadata of one document, as returned by the database.
///
/// Fields are whatever the database had; nothing here is validated yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub eid: Option<String>,
    pub title: Option<String>,
    pub publication_name: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub page_range: Option<String>,
    pub starting_page: Option<String>,
    pub ending_page: Option<String>,
    pub doi: Option<String>,
    pub cover_date: Option<String>,
    pub aggregation_type: Option<String>,
    /// Link to the document's page on the database's website.
    pub web_url: Option<String>,
    /// Link to the document's API record.
    pub api_url: Option<String>,
    pub authors: Vec<DocumentAuthor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentAuthor {
    /// The database's author identifier.
    pub auid: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub indexed_name: Option<String>,
    pub orcid: Option<String>,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no API key configured (set SCOPUS_API_KEY or pass --api-key)")]
    MissingApiKey,
    #[error("invalid API base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Http(#[from] ureq::Error),
    #[error("failed to decode response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected response: {0}")]
    Malformed(String),
}

pub trait Source {
    /// Identifiers (EIDs) of every document matching `query`, in the database's order.
    fn search(&self, query: &Query) -> Result<Vec<String>, SourceError>;

    /// Full metadata of the document `eid`.
    fn document(&self, eid: &str) -> Result<Document, SourceError>;
}

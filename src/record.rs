use std::fmt;

/// One publication in the shape the bibliography is written from.
///
/// Records come out of [`crate::normalize`] complete, citekey included, and are not modified
/// afterwards; the deduplicator only drops or reorders them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub entry_type: EntryType,
    pub title: Option<String>,
    /// Full names ("given surname") in the order the database lists them.
    pub authors: Vec<String>,
    pub year: Option<String>,
    pub venue: Option<String>,
    pub volume: Option<String>,
    pub number: Option<String>,
    pub pages: Option<String>,
    pub doi: Option<String>,
    pub url: Option<String>,
    /// Scopus document identifier.
    pub eid: Option<String>,
    pub citekey: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryType {
    #[default]
    Article,
    InProceedings,
}

impl EntryType {
    /// Classify a Scopus aggregation type ("Journal", "Conference Proceeding", ...).
    pub fn from_aggregation(aggregation: Option<&str>) -> Self {
        let Some(agg) = aggregation else {
            return EntryType::Article;
        };
        let agg = agg.to_lowercase();
        if agg.contains("conference") || agg.contains("proceeding") {
            EntryType::InProceedings
        } else {
            EntryType::Article
        }
    }

    /// Name of the field the venue is written to.
    pub fn venue_field(self) -> &'static str {
        match self {
            EntryType::Article => "journal",
            EntryType::InProceedings => "booktitle",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryType::Article => "article",
            EntryType::InProceedings => "inproceedings",
        })
    }
}

impl Record {
    /// Year as a number for ordering; missing or unparsable years count as 0.
    pub fn year_number(&self) -> i32 {
        self.year
            .as_deref()
            .and_then(|y| y.trim().parse().ok())
            .unwrap_or(0)
    }
}

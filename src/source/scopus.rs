use std::{collections::HashMap, time::Duration};

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Deserialize;
use url::Url;

use crate::source::{Document, DocumentAuthor, Query, Source, SourceError};

const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Results requested per search page. The COMPLETE view caps `count` at 25 (STANDARD at 200),
/// so this page size is accepted whichever view the key is entitled to.
const PAGE_SIZE: usize = 25;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub inst_token: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

/// Client for the Elsevier Scopus Search and Abstract Retrieval APIs.
pub struct ScopusClient {
    agent: ureq::Agent,
    base: Url,
    api_key: String,
    inst_token: Option<String>,
}

impl ScopusClient {
    pub fn new(config: &ClientConfig) -> Result<Self, SourceError> {
        let api_key = config.api_key.clone().ok_or(SourceError::MissingApiKey)?;

        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)?;

        let cfg = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .build();

        Ok(ScopusClient {
            agent: ureq::Agent::new_with_config(cfg),
            base,
            api_key,
            inst_token: config.inst_token.clone(),
        })
    }

    fn search_url(&self, query: &Query, start: usize) -> Result<Url, SourceError> {
        let mut url = self.base.join("content/search/scopus")?;
        url.query_pairs_mut()
            .append_pair("query", &query.to_string())
            .append_pair("field", "eid")
            .append_pair("start", &start.to_string())
            .append_pair("count", &PAGE_SIZE.to_string());
        Ok(url)
    }

    fn abstract_url(&self, eid: &str) -> Result<Url, SourceError> {
        let enc = utf8_percent_encode(eid.trim(), PATH_SEGMENT_ENCODE_SET).to_string();
        let mut url = self.base.join(&format!("content/abstract/eid/{enc}"))?;
        url.query_pairs_mut().append_pair("view", "FULL");
        Ok(url)
    }

    fn get(&self, url: &Url) -> Result<String, SourceError> {
        tracing::debug!(%url, "GET");
        let mut req = self
            .agent
            .get(url.as_str())
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .header("X-ELS-APIKey", self.api_key.as_str());
        if let Some(token) = &self.inst_token {
            req = req.header("X-ELS-Insttoken", token.as_str());
        }
        let body = req.call()?.body_mut().read_to_string()?;
        Ok(body)
    }
}

impl Source for ScopusClient {
    fn search(&self, query: &Query) -> Result<Vec<String>, SourceError> {
        let mut eids = Vec::new();
        let mut start = 0;
        loop {
            let body = self.get(&self.search_url(query, start)?)?;
            let page = decode_search(&body)?;
            let received = page.eids.len();
            eids.extend(page.eids);
            start += PAGE_SIZE;
            if received == 0 || start >= page.total {
                break;
            }
        }
        tracing::debug!(%query, count = eids.len(), "search finished");
        Ok(eids)
    }

    fn document(&self, eid: &str) -> Result<Document, SourceError> {
        let body = self.get(&self.abstract_url(eid)?)?;
        decode_abstract(&body)
    }
}

/// One page of search results.
#[derive(Debug, PartialEq, Eq)]
struct SearchPage {
    total: usize,
    eids: Vec<String>,
}

fn decode_search(body: &str) -> Result<SearchPage, SourceError> {
    let envelope: SearchEnvelope = serde_json::from_str(body)?;
    let results = envelope.results;
    let total = match results.total {
        Some(t) => t
            .into_string()
            .trim()
            .parse()
            .map_err(|_| SourceError::Malformed("non-numeric opensearch:totalResults".into()))?,
        None => 0,
    };

    let mut eids = Vec::new();
    for entry in results.entry.map(OneOrMany::into_vec).unwrap_or_default() {
        match (entry.eid, entry.error) {
            (Some(eid), _) => eids.push(eid.into_string()),
            // An empty result set is reported as a single entry carrying this error.
            (None, Some(err)) if err.eq_ignore_ascii_case("Result set was empty") => {}
            (None, Some(err)) => return Err(SourceError::Malformed(err)),
            (None, None) => return Err(SourceError::Malformed("search entry without eid".into())),
        }
    }
    Ok(SearchPage { total, eids })
}

fn decode_abstract(body: &str) -> Result<Document, SourceError> {
    let envelope: AbstractEnvelope = serde_json::from_str(body)?;
    let response = envelope.response;
    let core = response
        .coredata
        .ok_or_else(|| SourceError::Malformed("abstract without coredata".into()))?;

    // ORCIDs live on the per-affiliation author groups, not on the author list.
    let grouped: Vec<WireAuthor> = response
        .item
        .and_then(|i| i.bibrecord)
        .and_then(|b| b.head)
        .and_then(|h| h.author_group)
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .flat_map(|g| g.author.map(OneOrMany::into_vec).unwrap_or_default())
        .collect();
    let grouped: Vec<DocumentAuthor> = grouped.into_iter().map(WireAuthor::into_author).collect();

    let orcids: HashMap<String, String> = grouped
        .iter()
        .filter_map(|a| Some((a.auid.clone()?, a.orcid.clone()?)))
        .collect();

    let listed = response
        .authors
        .and_then(|a| a.author)
        .map(OneOrMany::into_vec)
        .unwrap_or_default();

    let authors = if listed.is_empty() {
        // Without an author list, fall back to the groups, one entry per author.
        let mut seen = Vec::new();
        grouped
            .into_iter()
            .filter(|a| match &a.auid {
                Some(id) if seen.contains(id) => false,
                Some(id) => {
                    seen.push(id.clone());
                    true
                }
                None => true,
            })
            .collect()
    } else {
        listed
            .into_iter()
            .map(|a| {
                let mut author = a.into_author();
                if author.orcid.is_none() {
                    author.orcid = author.auid.as_ref().and_then(|id| orcids.get(id).cloned());
                }
                author
            })
            .collect()
    };

    let links = core.link.map(OneOrMany::into_vec).unwrap_or_default();
    let web_url = links
        .into_iter()
        .find(|l| l.rel.as_deref() == Some("scopus"))
        .and_then(|l| l.href);

    Ok(Document {
        eid: text(core.eid),
        title: text(core.title),
        publication_name: text(core.publication_name),
        volume: text(core.volume),
        issue: text(core.issue),
        page_range: text(core.page_range),
        starting_page: text(core.starting_page),
        ending_page: text(core.ending_page),
        doi: text(core.doi),
        cover_date: text(core.cover_date),
        aggregation_type: text(core.aggregation_type),
        web_url,
        api_url: text(core.url),
        authors,
    })
}

fn text(t: Option<Text>) -> Option<String> {
    t.map(Text::into_string)
}

/// A scalar the API sends either as a JSON string or as a bare number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Text {
    Str(String),
    Num(serde_json::Number),
}

impl Text {
    fn into_string(self) -> String {
        match self {
            Text::Str(s) => s,
            Text::Num(n) => n.to_string(),
        }
    }
}

/// The API collapses single-element arrays into a bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(v) => v,
            OneOrMany::One(t) => vec![t],
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(rename = "search-results")]
    results: SearchResults,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(rename = "opensearch:totalResults")]
    total: Option<Text>,
    entry: Option<OneOrMany<SearchEntry>>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    eid: Option<Text>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AbstractEnvelope {
    #[serde(rename = "abstracts-retrieval-response")]
    response: AbstractResponse,
}

#[derive(Debug, Deserialize)]
struct AbstractResponse {
    coredata: Option<CoreData>,
    authors: Option<AuthorList>,
    item: Option<WireItem>,
}

#[derive(Debug, Deserialize)]
struct CoreData {
    eid: Option<Text>,
    #[serde(rename = "dc:title")]
    title: Option<Text>,
    #[serde(rename = "prism:publicationName")]
    publication_name: Option<Text>,
    #[serde(rename = "prism:volume")]
    volume: Option<Text>,
    #[serde(rename = "prism:issueIdentifier")]
    issue: Option<Text>,
    #[serde(rename = "prism:pageRange")]
    page_range: Option<Text>,
    #[serde(rename = "prism:startingPage")]
    starting_page: Option<Text>,
    #[serde(rename = "prism:endingPage")]
    ending_page: Option<Text>,
    #[serde(rename = "prism:doi")]
    doi: Option<Text>,
    #[serde(rename = "prism:coverDate")]
    cover_date: Option<Text>,
    #[serde(rename = "prism:aggregationType")]
    aggregation_type: Option<Text>,
    #[serde(rename = "prism:url")]
    url: Option<Text>,
    link: Option<OneOrMany<Link>>,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@rel")]
    rel: Option<String>,
    #[serde(rename = "@href")]
    href: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthorList {
    author: Option<OneOrMany<WireAuthor>>,
}

#[derive(Debug, Deserialize)]
struct WireItem {
    bibrecord: Option<BibRecord>,
}

#[derive(Debug, Deserialize)]
struct BibRecord {
    head: Option<Head>,
}

#[derive(Debug, Deserialize)]
struct Head {
    #[serde(rename = "author-group")]
    author_group: Option<OneOrMany<AuthorGroup>>,
}

#[derive(Debug, Deserialize)]
struct AuthorGroup {
    author: Option<OneOrMany<WireAuthor>>,
}

#[derive(Debug, Deserialize)]
struct WireAuthor {
    #[serde(rename = "@auid")]
    auid: Option<Text>,
    #[serde(rename = "@orcid")]
    orcid: Option<Text>,
    #[serde(rename = "ce:given-name")]
    given_name: Option<Text>,
    #[serde(rename = "ce:surname")]
    surname: Option<Text>,
    #[serde(rename = "ce:indexed-name")]
    indexed_name: Option<Text>,
    #[serde(rename = "preferred-name")]
    preferred: Option<PreferredName>,
}

#[derive(Debug, Deserialize)]
struct PreferredName {
    #[serde(rename = "ce:given-name")]
    given_name: Option<Text>,
    #[serde(rename = "ce:surname")]
    surname: Option<Text>,
}

impl WireAuthor {
    fn into_author(self) -> DocumentAuthor {
        let (pref_given, pref_surname) = match self.preferred {
            Some(p) => (text(p.given_name), text(p.surname)),
            None => (None, None),
        };
        DocumentAuthor {
            auid: text(self.auid),
            given_name: pref_given.or_else(|| text(self.given_name)),
            surname: pref_surname.or_else(|| text(self.surname)),
            indexed_name: text(self.indexed_name),
            orcid: text(self.orcid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::{AuthorId, Identifier};
    use mockito::Matcher;

    fn client(base: &str) -> ScopusClient {
        ScopusClient::new(&ClientConfig {
            api_key: Some("key".into()),
            inst_token: None,
            base_url: base.into(),
            timeout: Duration::from_secs(5),
        })
        .expect("client")
    }

    #[test]
    fn new_requires_api_key() {
        let err = ScopusClient::new(&ClientConfig {
            api_key: None,
            inst_token: None,
            base_url: "https://api.elsevier.com".into(),
            timeout: Duration::from_secs(5),
        })
        .err()
        .expect("should fail");
        assert!(matches!(err, SourceError::MissingApiKey));
    }

    #[test]
    fn new_rejects_bad_base_url() {
        let err = ScopusClient::new(&ClientConfig {
            api_key: Some("key".into()),
            inst_token: None,
            base_url: "not a url".into(),
            timeout: Duration::from_secs(5),
        })
        .err()
        .expect("should fail");
        assert!(matches!(err, SourceError::BaseUrl(_)));
    }

    #[test]
    fn search_url_carries_query_and_paging() {
        let c = client("https://api.elsevier.com");
        let q = Query::Author(AuthorId::parse("7004212771").unwrap());
        let url = c.search_url(&q, 50).unwrap();
        assert_eq!(url.path(), "/content/search/scopus");
        let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["query"], "AU-ID(7004212771)");
        assert_eq!(pairs["start"], "50");
        assert_eq!(pairs["count"], "25");
        assert_eq!(pairs["field"], "eid");
    }

    #[test]
    fn abstract_url_keeps_base_path_and_encodes_eid() {
        let c = client("http://localhost:8080/proxy");
        let url = c.abstract_url("2-s2.0-850 12/3").unwrap();
        assert_eq!(url.path(), "/proxy/content/abstract/eid/2-s2.0-850%2012%2F3");
        assert_eq!(url.query(), Some("view=FULL"));
    }

    fn eid_page(range: std::ops::Range<usize>, total: usize) -> String {
        let entries: Vec<_> = range.map(|i| serde_json::json!({ "eid": format!("e{i}") })).collect();
        serde_json::json!({
            "search-results": { "opensearch:totalResults": total.to_string(), "entry": entries }
        })
        .to_string()
    }

    #[test]
    fn search_follows_total_results_across_pages() {
        let mut server = mockito::Server::new();
        let first = server
            .mock("GET", "/content/search/scopus")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "AU-ID(7004212771)".into()),
                Matcher::UrlEncoded("start".into(), "0".into()),
            ]))
            .match_header("X-ELS-APIKey", "key")
            .match_header("X-ELS-Insttoken", "token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(eid_page(0..25, 27))
            .expect(1)
            .create();
        let second = server
            .mock("GET", "/content/search/scopus")
            .match_query(Matcher::UrlEncoded("start".into(), "25".into()))
            .match_header("X-ELS-APIKey", "key")
            .match_header("X-ELS-Insttoken", "token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(eid_page(25..27, 27))
            .expect(1)
            .create();

        let c = ScopusClient::new(&ClientConfig {
            api_key: Some("key".into()),
            inst_token: Some("token".into()),
            base_url: server.url(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        let eids = c
            .search(&Query::Author(AuthorId::parse("7004212771").unwrap()))
            .unwrap();

        first.assert();
        second.assert();
        assert_eq!(eids.len(), 27);
        assert_eq!(eids.first().map(String::as_str), Some("e0"));
        assert_eq!(eids.last().map(String::as_str), Some("e26"));
    }

    #[test]
    fn error_status_is_an_http_error() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/content/abstract/eid/2-s2.0-1")
            .match_query(Matcher::UrlEncoded("view".into(), "FULL".into()))
            .with_status(500)
            .with_body("internal error")
            .create();

        let res = client(&server.url()).document("2-s2.0-1");

        mock.assert();
        assert!(matches!(res, Err(SourceError::Http(_))), "got {res:?}");
    }

    #[test]
    fn decode_search_page() {
        let body = r#"{"search-results": {
            "opensearch:totalResults": "27",
            "opensearch:startIndex": "0",
            "entry": [{"eid": "2-s2.0-1"}, {"eid": "2-s2.0-2"}]
        }}"#;
        let page = decode_search(body).unwrap();
        assert_eq!(page.total, 27);
        assert_eq!(page.eids, vec!["2-s2.0-1", "2-s2.0-2"]);
    }

    #[test]
    fn decode_empty_search() {
        let body = r#"{"search-results": {
            "opensearch:totalResults": "0",
            "entry": [{"@_fa": "true", "error": "Result set was empty"}]
        }}"#;
        let page = decode_search(body).unwrap();
        assert_eq!(page, SearchPage { total: 0, eids: vec![] });
    }

    #[test]
    fn decode_search_rejects_other_errors() {
        let body = r#"{"search-results": {
            "opensearch:totalResults": "1",
            "entry": [{"error": "Something broke"}]
        }}"#;
        assert!(matches!(decode_search(body), Err(SourceError::Malformed(_))));
    }

    const FULL_ABSTRACT: &str = r#"{"abstracts-retrieval-response": {
        "coredata": {
            "eid": "2-s2.0-85100000001",
            "dc:title": "Fast Caching Systems",
            "prism:publicationName": "J. Systems",
            "prism:volume": "12",
            "prism:issueIdentifier": 3,
            "prism:pageRange": "100-110",
            "prism:doi": "10.1/X",
            "prism:coverDate": "2021-05-01",
            "prism:aggregationType": "Journal",
            "prism:url": "https://api.elsevier.com/content/abstract/scopus_id/85100000001",
            "link": [
                {"@rel": "self", "@href": "https://api.elsevier.com/content/abstract/scopus_id/85100000001"},
                {"@rel": "scopus", "@href": "https://www.scopus.com/inward/record.uri?eid=2-s2.0-85100000001"}
            ]
        },
        "authors": {"author": [
            {"@auid": "111", "ce:given-name": "J.", "ce:surname": "Doe", "ce:indexed-name": "Doe J.",
             "preferred-name": {"ce:given-name": "Jane", "ce:surname": "Doe"}},
            {"@auid": "222", "ce:given-name": "Rui", "ce:surname": "Li", "ce:indexed-name": "Li R."}
        ]},
        "item": {"bibrecord": {"head": {"author-group": [
            {"author": {"@auid": "111", "@orcid": "0000-0002-1825-0097", "ce:surname": "Doe"}},
            {"author": [{"@auid": "222", "ce:surname": "Li"}]}
        ]}}}
    }}"#;

    #[test]
    fn decode_full_abstract() {
        let doc = decode_abstract(FULL_ABSTRACT).unwrap();
        assert_eq!(doc.eid.as_deref(), Some("2-s2.0-85100000001"));
        assert_eq!(doc.title.as_deref(), Some("Fast Caching Systems"));
        assert_eq!(doc.issue.as_deref(), Some("3"));
        assert_eq!(doc.doi.as_deref(), Some("10.1/X"));
        assert_eq!(
            doc.web_url.as_deref(),
            Some("https://www.scopus.com/inward/record.uri?eid=2-s2.0-85100000001")
        );
        assert_eq!(doc.authors.len(), 2);
        assert_eq!(doc.authors[0].given_name.as_deref(), Some("Jane"));
        assert_eq!(doc.authors[0].orcid.as_deref(), Some("0000-0002-1825-0097"));
        assert_eq!(doc.authors[1].surname.as_deref(), Some("Li"));
        assert_eq!(doc.authors[1].orcid, None);
    }

    #[test]
    fn decode_sparse_abstract() {
        let body = r#"{"abstracts-retrieval-response": {
            "coredata": {"dc:title": "Lonely", "prism:doi": null, "link": {"@rel": "scopus", "@href": "https://x"}},
            "authors": null,
            "item": {"bibrecord": {"head": {"author-group": {"author": [
                {"@auid": "9", "@orcid": "0000-0001-0000-0000", "ce:given-name": "A", "ce:surname": "B"},
                {"@auid": "9", "ce:given-name": "A", "ce:surname": "B"}
            ]}}}}
        }}"#;
        let doc = decode_abstract(body).unwrap();
        assert_eq!(doc.doi, None);
        assert_eq!(doc.web_url.as_deref(), Some("https://x"));
        assert_eq!(doc.authors.len(), 1);
        assert_eq!(doc.authors[0].orcid.as_deref(), Some("0000-0001-0000-0000"));
    }

    #[test]
    fn decode_abstract_without_coredata_fails() {
        let body = r#"{"abstracts-retrieval-response": {}}"#;
        assert!(matches!(decode_abstract(body), Err(SourceError::Malformed(_))));
    }

    #[test]
    fn decode_garbage_fails() {
        assert!(matches!(decode_abstract("<html>"), Err(SourceError::Json(_))));
    }
}

//! HTTP search against the Revit API documentation site

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::error::{EntryError, SearchError};

pub const BASE_URL: &str = "https://www.revitapidocs.com";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Status and body of a completed GET request.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: StatusCode,
    pub body: String,
}

/// Issues the GET requests for [`SearchClient`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpReply, SearchError>;
}

/// [`HttpTransport`] backed by a shared reqwest client. No timeout is set;
/// callers bound requests with their cancellation token.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, SearchError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpReply, SearchError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        // The body of an error response is never decoded, so a failed read
        // must not turn it into a transport error.
        if status != StatusCode::OK {
            return Ok(HttpReply {
                status,
                body: String::new(),
            });
        }
        let body = response.text().await?;
        Ok(HttpReply { status, body })
    }
}

/// Envelope returned by `/{version}/search`.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    max_result: i64,
    #[serde(default)]
    query: Option<String>,
    results: Vec<Value>,
    #[serde(deserialize_with = "string_or_number")]
    target_year: String,
    #[serde(default)]
    total_results: i64,
    #[serde(default)]
    truncated: bool,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// One search result, ready to be rendered and opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub subtitle: String,
    pub autocomplete_text: String,
    /// Absolute page URL built from the response's target year and the entry's href.
    pub url: Url,
}

/// String value of a required entry field. Non-string JSON values use their
/// JSON text; absent or null fields are an error.
fn entry_field(entry: &Map<String, Value>, key: &'static str) -> Result<String, EntryError> {
    match entry.get(key) {
        None | Some(Value::Null) => Err(EntryError::MissingField(key)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
    }
}

pub struct SearchClient {
    base_url: Url,
    transport: Arc<dyn HttpTransport>,
}

impl SearchClient {
    /// Client for the public documentation site.
    pub fn new() -> Result<Self, SearchError> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, SearchError> {
        let transport = Arc::new(ReqwestTransport::new()?);
        Self::with_transport(Url::parse(base_url)?, transport)
    }

    pub fn with_transport(
        mut base_url: Url,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, SearchError> {
        if base_url.cannot_be_a_base() {
            return Err(SearchError::UnusableBase(base_url.to_string()));
        }
        // Relative joins below need a trailing slash to keep any path prefix.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            transport,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/{version}/search?query={text}` with every component percent-encoded.
    pub fn request_url(&self, text: &str, version: &str) -> Result<Url, SearchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SearchError::UnusableBase(self.base_url.to_string()))?
            .pop_if_empty()
            .push(version)
            .push("search");
        url.set_query(Some(&format!("query={}", urlencoding::encode(text))));
        Ok(url)
    }

    fn page_url(&self, target_year: &str, href: &str) -> Result<Url, url::ParseError> {
        self.base_url
            .join(&format!("{}/{}", target_year, href.trim_start_matches('/')))
    }

    /// Searches the documentation for `input` in the given version.
    ///
    /// Blank input returns no hits without touching the network. Non-200
    /// responses and bodies that are not a search envelope also yield no hits.
    /// A fired `cancel` token yields [`SearchError::Cancelled`].
    pub async fn query(
        &self,
        input: &str,
        version: &str,
        cancel: CancellationToken,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let text = input.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.request_url(&text, version)?;
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        debug!("Searching {url}");

        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SearchError::Cancelled),
            reply = self.transport.get(&url) => reply?,
        };

        if reply.status != StatusCode::OK {
            debug!("Search for {:?} returned {}", text, reply.status);
            return Ok(Vec::new());
        }

        let response: SearchResponse = match serde_json::from_str(&reply.body) {
            Ok(response) => response,
            Err(e) => {
                debug!("Search response for {:?} is not a result envelope: {}", text, e);
                return Ok(Vec::new());
            }
        };

        debug!(
            "Query {:?} matched {} results (max {}, truncated: {})",
            response.query.as_deref().unwrap_or(&text),
            response.total_results,
            response.max_result,
            response.truncated
        );

        Ok(self.hits(&response))
    }

    fn hits(&self, response: &SearchResponse) -> Vec<SearchHit> {
        response
            .results
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| match self.hit(&response.target_year, entry) {
                Ok(hit) => Some(hit),
                Err(e) => {
                    warn!("Skipping malformed search result #{i}: {e}");
                    None
                }
            })
            .collect()
    }

    fn hit(&self, target_year: &str, entry: &Value) -> Result<SearchHit, EntryError> {
        let entry = entry.as_object().ok_or(EntryError::NotAnObject)?;
        let href = entry_field(entry, "href")?;
        Ok(SearchHit {
            title: entry_field(entry, "title")?,
            subtitle: entry_field(entry, "description")?,
            autocomplete_text: entry_field(entry, "short_title")?,
            url: self.page_url(target_year, &href)?,
        })
    }
}

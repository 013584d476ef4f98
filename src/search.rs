use std::fmt;

use itertools::Itertools;
use serde::Deserialize;
use url::Url;

use crate::downloader::{HttpFetcher, Response};
use crate::error::{Error, ResolveError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://pixabay.com/api/";

const IMAGE_TYPE: &str = "photo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    query: String,
    desired_count: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, desired_count: usize) -> Result<Self> {
        let query = query.into();

        if query.trim().is_empty() {
            return Err(Error::config("search query must not be empty"));
        }

        if desired_count == 0 {
            return Err(Error::config("requested image count must be at least 1"));
        }

        Ok(Self {
            query,
            desired_count,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn desired_count(&self) -> usize {
        self.desired_count
    }
}

/// Direct link to one full-size image, as returned by the search API.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference(String);

impl ImageReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "totalHits")]
    total_hits: Option<u64>,
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "largeImageURL")]
    large_image_url: String,
}

pub struct Resolver<T: HttpFetcher> {
    fetcher: T,
    api_key: String,
    endpoint: Url,
}

impl<T> Resolver<T>
where
    T: HttpFetcher,
{
    pub fn with_fetcher(
        api_key: impl Into<String>,
        endpoint: &str,
        fetcher: T,
    ) -> std::result::Result<Self, ResolveError> {
        Ok(Resolver {
            fetcher,
            api_key: api_key.into(),
            endpoint: Url::parse(endpoint)?,
        })
    }

    /// Full query URL, API key included.
    pub fn request_url(&self, request: &SearchRequest) -> Url {
        let mut url = self.endpoint.clone();

        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("q", request.query())
            .append_pair("image_type", IMAGE_TYPE)
            .append_pair("per_page", &request.desired_count().to_string());

        url
    }

    /// Runs the search once.
    ///
    /// A non-200 answer is logged and yields an empty list. Transport errors
    /// and unparseable bodies are returned as errors and nothing is resolved.
    pub fn resolve(
        &self,
        request: &SearchRequest,
    ) -> std::result::Result<Vec<ImageReference>, ResolveError> {
        let url = self.request_url(request);

        tracing::debug!(url = %redacted(&url), "Querying search API");

        match self.fetcher.fetch(url.as_str()) {
            Response::Ok(body) => {
                let response: SearchResponse = serde_json::from_slice(&body)?;

                if let Some(total_hits) = response.total_hits {
                    tracing::debug!(query = request.query(), total_hits, "Search matched");
                }

                let references = response
                    .hits
                    .into_iter()
                    .take(request.desired_count())
                    .map(|hit| ImageReference::new(hit.large_image_url))
                    .collect_vec();

                tracing::info!(
                    query = request.query(),
                    found = references.len(),
                    requested = request.desired_count(),
                    "Search resolved"
                );

                Ok(references)
            }

            Response::Status(status) => {
                tracing::warn!(query = request.query(), status, "Search API returned an error status");
                Ok(Vec::new())
            }

            Response::InvalidBody => Err(ResolveError::InvalidBody),

            Response::NetworkError(message) => Err(ResolveError::Network(self.scrub(&message))),
        }
    }

    // Transport messages may quote the request URL.
    fn scrub(&self, message: &str) -> String {
        if self.api_key.is_empty() {
            return message.to_string();
        }

        let encoded: String = url::form_urlencoded::byte_serialize(self.api_key.as_bytes()).collect();

        message
            .replace(&self.api_key, "REDACTED")
            .replace(&encoded, "REDACTED")
    }
}

fn redacted(url: &Url) -> Url {
    let pairs = url
        .query_pairs()
        .map(|(name, value)| {
            let value = if name == "key" {
                "REDACTED".to_string()
            } else {
                value.into_owned()
            };
            (name.into_owned(), value)
        })
        .collect_vec();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::dates::to_api_date;
use crate::models::NewsRecord;

pub const DEFAULT_API_URL: &str = "https://servicodados.ibge.gov.br/api/v3/noticias/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("the search term cannot be empty")]
    EmptyTerm,
    #[error("the start date {start} cannot be after the end date {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },
}

/// A validated query. Construct through [`SearchQuery::term`] or
/// [`SearchQuery::date_range`] so invalid input never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    Term(String),
    DateRange { start: NaiveDate, end: NaiveDate },
}

impl SearchQuery {
    pub fn term(term: &str) -> Result<Self, QueryError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(QueryError::EmptyTerm);
        }
        Ok(SearchQuery::Term(term.to_string()))
    }

    /// Inclusive range; `start == end` searches a single day
    pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<Self, QueryError> {
        if start > end {
            return Err(QueryError::StartAfterEnd { start, end });
        }
        Ok(SearchQuery::DateRange { start, end })
    }

    /// Upstream query parameters
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            SearchQuery::Term(term) => vec![("q", term.clone())],
            SearchQuery::DateRange { start, end } => {
                vec![("de", to_api_date(*start)), ("ate", to_api_date(*end))]
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SearchQuery::Term(term) => format!("term \"{}\"", term),
            SearchQuery::DateRange { start, end } => format!("period {} to {}", start, end),
        }
    }
}

/// Anything that can answer a [`SearchQuery`] with news records
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Records come back in upstream order; an empty vec is not an error
    async fn search(&self, query: &SearchQuery) -> Result<Vec<NewsRecord>>;
}

#[derive(Debug, Deserialize)]
struct IbgeResponse {
    items: Vec<NewsRecord>,
}

/// Parse an API response body into records
pub fn parse_items(body: &str) -> Result<Vec<NewsRecord>> {
    let response: IbgeResponse =
        serde_json::from_str(body).context("Failed to parse IBGE API response")?;
    Ok(response.items)
}

pub struct IbgeClient {
    client: Client,
    base_url: Url,
}

impl IbgeClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid IBGE API URL: {}", base_url))?;

        Ok(Self { client, base_url })
    }

    fn request_url(&self, query: &SearchQuery) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().extend_pairs(query.params());
        url
    }
}

#[async_trait]
impl NewsSource for IbgeClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<NewsRecord>> {
        let url = self.request_url(query);
        tracing::debug!(%url, "Fetching news from IBGE");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch news from the IBGE API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("IBGE API returned error: {} - {}", status, error_text);
        }

        let body = response
            .text()
            .await
            .context("Failed to read IBGE API response body")?;

        let records = parse_items(&body)?;
        tracing::debug!(count = records.len(), query = %query.describe(), "Search complete");

        Ok(records)
    }
}

//! Tavily search API client.

use super::{SearchHit, SearchProvider};
use crate::config::SearchConfig;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";
const TAVILY_TIMEOUT: Duration = Duration::from_secs(30);

pub struct TavilyClient {
    api_key: String,
    search_depth: String,
    client: Client,
}

impl TavilyClient {
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let api_key = config.api_key()?;
        let client = Client::builder()
            .timeout(TAVILY_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            search_depth: config.search_depth.clone(),
            client,
        })
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let request = SearchRequest {
            api_key: &self.api_key,
            query,
            search_depth: &self.search_depth,
        };
        debug!(query, depth = %self.search_depth, "sending search request");

        let response = self
            .client
            .post(TAVILY_SEARCH_URL)
            .json(&request)
            .send()
            .await
            .context("Failed to connect to Tavily")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Tavily search failed with status {}: {}",
                status,
                body.trim()
            ));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .context("Failed to parse Tavily response")?;

        Ok(parsed.results.into_iter().map(SearchHit::from).collect())
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: String,
    #[serde(default)]
    content: String,
}

impl From<TavilyResult> for SearchHit {
    fn from(result: TavilyResult) -> Self {
        Self {
            url: result.url,
            content: result.content,
        }
    }
}

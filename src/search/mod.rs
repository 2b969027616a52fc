//! Web-search summarization mode.
//!
//! A query is sent to a search provider, the results are packed into a
//! bounded context string and the LLM summarizes that context.

pub mod tavily;

pub use tavily::TavilyClient;

use crate::llm::{ChatCompletion, ChatMessage, CompletionParams};
use crate::ui;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncBufRead;
use tracing::{debug, info, warn};

/// Rough characters-per-token ratio used to bound the context.
const CHARS_PER_TOKEN: usize = 4;

/// One hit returned by the search provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub url: String,
    pub content: String,
}

/// Context gathered for a query, ready to be summarized.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub query: String,
    pub context: String,
}

#[async_trait]
pub trait SearchProvider {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}

/// Pack hits into a JSON array, keeping whole hits while the serialized
/// size stays within `max_tokens`.
pub fn build_context(hits: &[SearchHit], max_tokens: usize) -> String {
    let budget = max_tokens.saturating_mul(CHARS_PER_TOKEN);
    let mut kept: Vec<&SearchHit> = Vec::new();
    let mut used = 2;

    for hit in hits {
        let size = serde_json::to_string(hit).map(|s| s.len() + 2).unwrap_or(0);
        if used + size > budget {
            break;
        }
        used += size;
        kept.push(hit);
    }

    serde_json::to_string(&kept).unwrap_or_else(|_| "[]".to_string())
}

pub fn summary_prompt(context: &str) -> String {
    format!("Summarize the following information: {}", context)
}

pub struct SearchSession<S, C> {
    provider: S,
    client: C,
    params: CompletionParams,
    max_tokens: usize,
}

impl<S, C> SearchSession<S, C>
where
    S: SearchProvider,
    C: ChatCompletion,
{
    pub fn new(provider: S, client: C, params: CompletionParams, max_tokens: usize) -> Self {
        Self {
            provider,
            client,
            params,
            max_tokens,
        }
    }

    pub async fn gather(&self, query: &str) -> Result<SearchResult> {
        let hits = self.provider.search(query).await?;
        debug!(query, hits = hits.len(), "search returned");
        Ok(SearchResult {
            query: query.to_string(),
            context: build_context(&hits, self.max_tokens),
        })
    }

    /// Search for `query` and return the model's summary of the results.
    pub async fn summarize(&self, query: &str) -> Result<String> {
        let result = self.gather(query).await?;
        let messages = [ChatMessage::user(summary_prompt(&result.context))];
        self.client.complete(&messages, &self.params).await
    }

    pub async fn run<R>(&self, mut input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        info!("Search session started");

        loop {
            ui::print_prompt("Search:> ");
            let Some(line) = ui::read_line(&mut input).await else {
                break;
            };

            let query = line.trim();
            if query.eq_ignore_ascii_case("exit") {
                break;
            }
            if query.is_empty() {
                continue;
            }

            match self.summarize(query).await {
                Ok(summary) => ui::print_section("Summary:", &summary),
                Err(e) => {
                    warn!("Search failed: {:#}", e);
                    ui::print_error(&format!("An error occurred during the search: {:#}", e));
                }
            }
        }

        ui::print_note("Exiting search mode.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::tests::ScriptedCompletion;
    use anyhow::anyhow;
    use std::sync::Mutex;

    struct FixedSearch {
        hits: Option<Vec<SearchHit>>,
        queries: Mutex<Vec<String>>,
    }

    impl FixedSearch {
        fn new(hits: Option<Vec<SearchHit>>) -> Self {
            Self {
                hits,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SearchProvider for FixedSearch {
        async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
            self.queries.lock().unwrap().push(query.to_string());
            self.hits.clone().ok_or_else(|| anyhow!("quota exceeded"))
        }
    }

    fn hit(url: &str, content: &str) -> SearchHit {
        SearchHit {
            url: url.to_string(),
            content: content.to_string(),
        }
    }

    fn params() -> CompletionParams {
        CompletionParams::from_llm_config(&crate::config::LlmConfig::default())
    }

    #[test]
    fn test_context_includes_url_and_content() {
        let context = build_context(&[hit("https://a.example", "alpha")], 100);
        let parsed: serde_json::Value = serde_json::from_str(&context).unwrap();
        assert_eq!(parsed[0]["url"], "https://a.example");
        assert_eq!(parsed[0]["content"], "alpha");
    }

    #[test]
    fn test_context_respects_budget() {
        let hits = vec![
            hit("https://a.example", &"a".repeat(30)),
            hit("https://b.example", &"b".repeat(30)),
        ];
        // 20 tokens is 80 chars: room for the first hit only.
        let context = build_context(&hits, 20);
        assert!(context.len() <= 80);
        assert!(context.contains("a.example"));
        assert!(!context.contains("b.example"));

        assert_eq!(build_context(&hits, 0), "[]");
    }

    #[tokio::test]
    async fn test_summarize_sends_context() {
        let provider = FixedSearch::new(Some(vec![hit("https://rust-lang.org", "Rust 1.80")]));
        let client = ScriptedCompletion::new(vec![Some("Rust 1.80 is out.")]);
        let session = SearchSession::new(provider, client, params(), 1500);

        let summary = session.summarize("latest rust").await.unwrap();
        assert_eq!(summary, "Rust 1.80 is out.");

        let requests = session.client.requests.lock().unwrap();
        let prompt = &requests[0][0].content;
        assert!(prompt.starts_with("Summarize the following information: "));
        assert!(prompt.contains("https://rust-lang.org"));
    }

    #[tokio::test]
    async fn test_search_error_skips_summary() {
        let provider = FixedSearch::new(None);
        let client = ScriptedCompletion::new(vec![]);
        let session = SearchSession::new(provider, client, params(), 1500);

        assert!(session.summarize("anything").await.is_err());
        assert!(session.client.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_continues_after_errors() {
        let provider = FixedSearch::new(None);
        let client = ScriptedCompletion::new(vec![]);
        let session = SearchSession::new(provider, client, params(), 1500);
        let input: &[u8] = b"one\n\ntwo\nEXIT\nthree\n";

        session.run(input).await.unwrap();

        let queries = session.provider.queries.lock().unwrap();
        assert_eq!(*queries, vec!["one".to_string(), "two".to_string()]);
    }

    #[tokio::test]
    async fn test_run_survives_invalid_utf8() {
        let provider = FixedSearch::new(None);
        let client = ScriptedCompletion::new(vec![]);
        let session = SearchSession::new(provider, client, params(), 1500);
        let input: &[u8] = b"\xff\xfe\nrust news\nexit\n";

        session.run(input).await.unwrap();

        let queries = session.provider.queries.lock().unwrap();
        assert_eq!(queries.last().map(String::as_str), Some("rust news"));
    }
}

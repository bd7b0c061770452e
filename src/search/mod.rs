//! Web search boundary.

pub mod tavily;

use async_trait::async_trait;

use crate::errors::SearchError;

pub use tavily::TavilySearch;

/// One search result candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// Provider of web search and page content extraction.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run a web search, returning up to `max_results` candidate hits.
    async fn search(&self, query: &str, max_results: usize)
        -> Result<Vec<SearchHit>, SearchError>;

    /// Fetch the readable text content of a single page.
    async fn extract(&self, url: &str) -> Result<String, SearchError>;
}

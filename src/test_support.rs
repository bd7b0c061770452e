//! Shared test doubles: a scripted oracle with queued completions and a
//! scripted search provider. Compiled only for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::{OracleError, SearchError};
use crate::oracle::Oracle;
use crate::search::{SearchHit, SearchProvider};

/// Oracle double that replays a queue of canned completions. Once the queue
/// runs dry it keeps repeating the last output, so a scenario only needs to
/// script up to its final distinct response. Every prompt is recorded for
/// assertions.
pub struct ScriptedOracle {
    outputs: Mutex<VecDeque<String>>,
    last: Mutex<Option<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn new<I, S>(outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            outputs: Mutex::new(outputs.into_iter().map(Into::into).collect()),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// All prompts seen so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.outputs.lock().unwrap().pop_front();
        match next {
            Some(output) => {
                *self.last.lock().unwrap() = Some(output.clone());
                Ok(output)
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .ok_or(OracleError::EmptyResponse),
        }
    }
}

/// Oracle double whose every call fails.
pub struct FailingOracle;

#[async_trait]
impl Oracle for FailingOracle {
    async fn complete(&self, _prompt: &str) -> Result<String, OracleError> {
        Err(OracleError::EmptyResponse)
    }
}

pub fn hit(url: &str) -> SearchHit {
    SearchHit {
        url: url.to_string(),
        title: format!("title for {url}"),
        snippet: format!("snippet for {url}"),
    }
}

/// Search double that replays one canned hit list per search call and serves
/// page content from a url-keyed map.
#[derive(Default)]
pub struct ScriptedSearch {
    hit_lists: Mutex<VecDeque<Vec<SearchHit>>>,
    pages: Mutex<HashMap<String, String>>,
}

impl ScriptedSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_hits(&self, hits: Vec<SearchHit>) {
        self.hit_lists.lock().unwrap().push_back(hits);
    }

    pub fn set_page(&self, url: &str, content: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), content.to_string());
    }
}

#[async_trait]
impl SearchProvider for ScriptedSearch {
    async fn search(
        &self,
        _query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let mut hits = self
            .hit_lists
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();
        hits.truncate(max_results);
        Ok(hits)
    }

    async fn extract(&self, url: &str) -> Result<String, SearchError> {
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_oracle_repeats_last_output_when_drained() {
        let oracle = ScriptedOracle::new(["one", "two"]);
        assert_eq!(oracle.complete("a").await.unwrap(), "one");
        assert_eq!(oracle.complete("b").await.unwrap(), "two");
        assert_eq!(oracle.complete("c").await.unwrap(), "two");
        assert_eq!(oracle.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn scripted_oracle_with_no_outputs_errors() {
        let oracle = ScriptedOracle::new(Vec::<String>::new());
        assert!(oracle.complete("a").await.is_err());
    }

    #[tokio::test]
    async fn scripted_search_replays_queued_hits_then_empties() {
        let search = ScriptedSearch::new();
        search.queue_hits(vec![hit("https://a.example")]);

        let first = search.search("q", 7).await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(search.search("q", 7).await.unwrap().is_empty());
    }
}

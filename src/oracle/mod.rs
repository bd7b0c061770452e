//! Decision oracle boundary.
//!
//! Everything that needs a language-model judgment goes through the
//! [`Oracle`] trait. Implementors provide a single `complete` method; the
//! contract operations (decompose, score, rank, extract, ...) are provided
//! on top of it so test doubles only need to script raw completions.

pub mod openai;
pub mod parse;
pub mod prompts;

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::warn;

use crate::errors::OracleError;
use prompts::DecisionContext;

pub use openai::OpenAiOracle;

/// Neutral score applied when the oracle's quality judgment is unparseable.
const NEUTRAL_SCORE: u8 = 5;

#[async_trait]
pub trait Oracle: Send + Sync {
    /// Send one prompt, get one raw text completion.
    async fn complete(&self, prompt: &str) -> Result<String, OracleError>;

    /// Ask for the next supervisor action. Returns the raw response; the
    /// supervisor normalizes and validates it against its constraints.
    async fn decide_action(&self, ctx: &DecisionContext) -> Result<String, OracleError> {
        self.complete(&prompts::decide_action(ctx)).await
    }

    /// Decompose a step goal into atomic, searchable sub-task queries.
    async fn decompose(
        &self,
        goal: &str,
        prev_failure: Option<&str>,
    ) -> Result<Vec<String>, OracleError> {
        let raw = self.complete(&prompts::decompose(goal, prev_failure)).await?;
        Ok(parse::parse_numbered_list(&raw))
    }

    /// Rewrite an over-long sub-task query to fit under `limit` characters.
    async fn shorten_query(&self, subtask: &str, limit: usize) -> Result<String, OracleError> {
        let raw = self.complete(&prompts::shorten(subtask, limit)).await?;
        Ok(raw.trim().trim_matches('"').to_string())
    }

    /// Pick the `n` most relevant URLs for a sub-task, as 0-based indices
    /// into `urls`. Falls back to the first `n` candidates in order when the
    /// oracle call fails or returns nothing usable.
    async fn rank_urls(&self, subtask: &str, urls: &[String], n: usize) -> Vec<usize> {
        let fallback = || (0..urls.len().min(n)).collect::<Vec<_>>();
        if urls.is_empty() {
            return Vec::new();
        }
        match self.complete(&prompts::rank_urls(subtask, urls, n)).await {
            Ok(raw) => parse::parse_index_list(&raw, n, urls.len()).unwrap_or_else(|| {
                warn!(response = %raw.trim(), "unparseable URL ranking, using first candidates");
                fallback()
            }),
            Err(err) => {
                warn!(error = %err, "URL ranking failed, using first candidates");
                fallback()
            }
        }
    }

    /// Extract a cleaned, subtask-relevant summary from raw page content.
    async fn extract_summary(&self, subtask: &str, content: &str) -> Result<String, OracleError> {
        let raw = self
            .complete(&prompts::extract_summary(subtask, content))
            .await?;
        Ok(raw.trim().to_string())
    }

    /// Score a sub-task result on the 0-10 quality scale. Never fails; an
    /// unusable judgment gets the neutral score.
    async fn score(&self, subtask: &str, result: &str) -> u8 {
        match self.complete(&prompts::score(subtask, result)).await {
            Ok(raw) => parse::parse_score(&raw).unwrap_or_else(|| {
                warn!(response = %raw.trim(), "unparseable score, using neutral default");
                NEUTRAL_SCORE
            }),
            Err(err) => {
                warn!(error = %err, "scoring failed, using neutral default");
                NEUTRAL_SCORE
            }
        }
    }

    /// Extract declared entity types from evidence text. Never fails; every
    /// declared type is present in the result, empty on any trouble.
    async fn extract_entities(
        &self,
        declared: &[String],
        text: &str,
    ) -> HashMap<String, Vec<String>> {
        if declared.is_empty() {
            return HashMap::new();
        }
        match self.complete(&prompts::extract_entities(declared, text)).await {
            Ok(raw) => parse::parse_entity_map(&raw, declared),
            Err(err) => {
                warn!(error = %err, "entity extraction failed, returning empty lists");
                declared.iter().map(|t| (t.clone(), Vec::new())).collect()
            }
        }
    }

    /// Produce a hedged best-effort estimate when real evidence is missing.
    async fn estimate(&self, subtask: &str) -> Result<String, OracleError> {
        let raw = self.complete(&prompts::estimate(subtask)).await?;
        Ok(raw.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingOracle, ScriptedOracle};

    #[tokio::test]
    async fn decompose_parses_numbered_output() {
        let oracle = ScriptedOracle::new(["1. alpha query\n2. beta query"]);
        let subtasks = oracle.decompose("goal", None).await.unwrap();
        assert_eq!(subtasks, vec!["alpha query", "beta query"]);
    }

    #[tokio::test]
    async fn score_falls_back_to_neutral_on_garbage() {
        let oracle = ScriptedOracle::new(["definitely an eight"]);
        assert_eq!(oracle.score("s", "r").await, NEUTRAL_SCORE);
    }

    #[tokio::test]
    async fn score_falls_back_to_neutral_on_error() {
        assert_eq!(FailingOracle.score("s", "r").await, NEUTRAL_SCORE);
    }

    #[tokio::test]
    async fn rank_urls_falls_back_to_first_n() {
        let urls: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let oracle = ScriptedOracle::new(["none of these look right"]);
        assert_eq!(oracle.rank_urls("s", &urls, 3).await, vec![0, 1, 2]);

        let oracle = ScriptedOracle::new(["3,1"]);
        assert_eq!(oracle.rank_urls("s", &urls, 3).await, vec![2, 0]);
    }

    #[tokio::test]
    async fn rank_urls_empty_candidates_short_circuits() {
        assert!(FailingOracle.rank_urls("s", &[], 3).await.is_empty());
    }

    #[tokio::test]
    async fn extract_entities_errors_yield_declared_empty_lists() {
        let declared = vec!["trails".to_string()];
        let map = FailingOracle.extract_entities(&declared, "text").await;
        assert_eq!(map.len(), 1);
        assert!(map["trails"].is_empty());
    }
}

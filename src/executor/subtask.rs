//! Sub-task runner: one atomic query, end to end.
//!
//! search -> rank URLs -> fetch -> clean -> score, keeping the single best
//! summary. Every leaf call is fault-isolated; the runner never fails, it
//! degrades to the sentinel result instead.

use tracing::{debug, warn};

use crate::config::Config;
use crate::oracle::Oracle;
use crate::search::SearchProvider;

/// Emitted when search or extraction produced nothing usable. Scores as the
/// lowest quality so estimate substitution can kick in downstream.
pub const NO_RESULTS_SENTINEL: &str = "No results were found for this subtask.";

/// Outcome of one sub-task: the best summary found and its quality score.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtaskResult {
    pub text: String,
    pub score: u8,
}

impl SubtaskResult {
    fn sentinel() -> Self {
        Self {
            text: NO_RESULTS_SENTINEL.to_string(),
            score: 0,
        }
    }
}

/// Run one sub-task query to completion. Infallible by contract; any
/// provider or oracle trouble resolves to the sentinel result.
pub async fn run_subtask(
    oracle: &dyn Oracle,
    search: &dyn SearchProvider,
    config: &Config,
    subtask: &str,
) -> SubtaskResult {
    let query = fit_query(oracle, subtask, config.query_length_limit).await;

    let hits = match search.search(&query, config.search_max_results).await {
        Ok(hits) => hits,
        Err(err) => {
            warn!(%query, error = %err, "search failed");
            return SubtaskResult::sentinel();
        }
    };
    if hits.is_empty() {
        debug!(%query, "search returned no candidates");
        return SubtaskResult::sentinel();
    }

    let urls: Vec<String> = hits.iter().map(|h| h.url.clone()).collect();
    let selected = oracle.rank_urls(subtask, &urls, config.top_n_urls).await;

    let mut best: Option<SubtaskResult> = None;
    for idx in selected {
        let url = &urls[idx];
        let mut content = match search.extract(url).await {
            Ok(content) => content,
            Err(err) => {
                warn!(%url, error = %err, "content extraction failed");
                continue;
            }
        };
        if content.trim().is_empty() {
            continue;
        }
        truncate_at_char_boundary(&mut content, config.max_content_chars);

        let summary = match oracle.extract_summary(subtask, &content).await {
            Ok(summary) if !summary.is_empty() => summary,
            Ok(_) => continue,
            Err(err) => {
                warn!(%url, error = %err, "summary extraction failed");
                continue;
            }
        };

        let score = oracle.score(subtask, &summary).await;
        debug!(%url, score, "scored candidate summary");
        // strict comparison keeps the first seen on ties
        if best.as_ref().is_none_or(|b| score > b.score) {
            best = Some(SubtaskResult {
                text: summary,
                score,
            });
        }
    }

    best.unwrap_or_else(SubtaskResult::sentinel)
}

/// Shorten an over-long sub-task into a searchable query, falling back to a
/// hard truncation when the oracle cannot help.
async fn fit_query(oracle: &dyn Oracle, subtask: &str, limit: usize) -> String {
    if subtask.chars().count() <= limit {
        return subtask.to_string();
    }
    match oracle.shorten_query(subtask, limit).await {
        Ok(short) if !short.is_empty() => short,
        _ => subtask.chars().take(limit).collect(),
    }
}

fn truncate_at_char_boundary(s: &mut String, max_bytes: usize) {
    if s.len() <= max_bytes {
        return;
    }
    let mut cut = max_bytes;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}

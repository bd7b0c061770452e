//! Query clarity scoring and clarification.
//!
//! A vague query gets one chance at a clarification question before
//! planning. Scoring trouble always resolves toward "clear enough": a run
//! should never stall on the clarity gate because of a bad oracle response.

use tracing::{debug, warn};

use crate::oracle::parse::parse_clarity;
use crate::oracle::{prompts, Oracle};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClarityAssessment {
    pub score: f32,
    pub needed: bool,
}

pub struct Clarifier<'a> {
    oracle: &'a dyn Oracle,
}

impl<'a> Clarifier<'a> {
    pub fn new(oracle: &'a dyn Oracle) -> Self {
        Self { oracle }
    }

    /// Score the query's clarity against the threshold.
    pub async fn assess(&self, query: &str, threshold: f32) -> ClarityAssessment {
        let score = match self.oracle.complete(&prompts::clarity(query)).await {
            Ok(raw) => parse_clarity(&raw).unwrap_or_else(|| {
                warn!(response = %raw.trim(), "unparseable clarity score, treating query as clear");
                1.0
            }),
            Err(err) => {
                warn!(error = %err, "clarity scoring failed, treating query as clear");
                1.0
            }
        };
        debug!(score, threshold, "clarity assessed");
        ClarityAssessment {
            score,
            needed: score < threshold,
        }
    }

    /// Ask for the single most critical clarification question. `None` when
    /// the oracle declines or is unavailable.
    pub async fn question(&self, query: &str) -> Option<String> {
        match self.oracle.complete(&prompts::clarification_question(query)).await {
            Ok(raw) => {
                let question = raw.trim().trim_matches('"').to_string();
                if question.is_empty() || question.contains(prompts::NO_CLARIFICATION_NEEDED) {
                    None
                } else {
                    Some(question)
                }
            }
            Err(err) => {
                warn!(error = %err, "clarification question failed, proceeding unclarified");
                None
            }
        }
    }
}

/// Fold the user's answer into the query that drives planning and reporting.
pub fn clarified_query(query: &str, question: &str, answer: &str) -> String {
    format!("{query}\n\nClarification: {question}\nAnswer: {answer}")
}

//! Step executor: decompose a plan step into sub-tasks, fan them out with
//! bounded concurrency, and fold the results back into evidence and
//! entities.

pub mod subtask;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::entities::dedupe_extracted;
use crate::errors::ExecutorError;
use crate::oracle::Oracle;
use crate::search::SearchProvider;
use crate::state::{pad_evidence, ResearchState, StateUpdate};

use subtask::{run_subtask, SubtaskResult};

/// Marker prefixed to synthetic evidence so report consumers can tell it
/// apart from real findings.
pub const ESTIMATE_MARKER: &str = "ESTIMATED EVIDENCE:";

pub struct Executor<'a> {
    oracle: &'a dyn Oracle,
    search: &'a dyn SearchProvider,
    config: &'a Config,
}

impl<'a> Executor<'a> {
    pub fn new(
        oracle: &'a dyn Oracle,
        search: &'a dyn SearchProvider,
        config: &'a Config,
    ) -> Self {
        Self {
            oracle,
            search,
            config,
        }
    }

    /// Execute the current plan step and return the resulting update:
    /// per-sub-task evidence at the step's index, merged entities, and the
    /// advanced step index.
    pub async fn execute_step(&self, state: &ResearchState) -> Result<StateUpdate, ExecutorError> {
        let idx = state.current_step_idx;
        let step = state
            .current_step()
            .ok_or(ExecutorError::NoCurrentStep { idx })?;

        let prev_failure = state.latest_failure_reason(&step.id);
        let subtasks = self
            .oracle
            .decompose(step.effective_goal(), prev_failure.as_deref())
            .await
            .map_err(|source| ExecutorError::Decomposition {
                step_id: step.id.clone(),
                source,
            })?;
        if subtasks.is_empty() {
            return Err(ExecutorError::EmptyDecomposition {
                step_id: step.id.clone(),
            });
        }
        info!(step_id = %step.id, count = subtasks.len(), "decomposed step into sub-tasks");

        // results come back in sub-task order regardless of completion order
        let outcomes: Vec<SubtaskResult> = stream::iter(subtasks.iter())
            .map(|subtask| run_subtask(self.oracle, self.search, self.config, subtask))
            .buffered(self.config.subtask_concurrency)
            .collect()
            .await;

        let mut results = Vec::with_capacity(outcomes.len());
        for (subtask, outcome) in subtasks.iter().zip(outcomes) {
            results.push(self.finalize_result(subtask, outcome, state).await);
        }

        let mut entities = state.entities.clone();
        if !step.produces_entities.is_empty() {
            for result in &results {
                let extracted = self
                    .oracle
                    .extract_entities(&step.produces_entities, result)
                    .await;
                entities.merge(dedupe_extracted(extracted), self.config.entity_value_cap);
            }
        }

        let mut evidence_store = state.evidence_store.clone();
        pad_evidence(&mut evidence_store, idx);
        evidence_store[idx] = results;

        debug!(step_id = %step.id, idx, "step execution complete");
        Ok(StateUpdate {
            evidence_store: Some(evidence_store),
            entities: Some(entities),
            current_step_idx: Some(idx + 1),
            ..StateUpdate::default()
        })
    }

    /// Substitute a marked synthetic estimate for low-quality results when
    /// estimate mode is on.
    async fn finalize_result(
        &self,
        subtask: &str,
        outcome: SubtaskResult,
        state: &ResearchState,
    ) -> String {
        if !state.use_estimates || outcome.score > self.config.low_quality_threshold {
            return outcome.text;
        }
        match self.oracle.estimate(subtask).await {
            Ok(estimate) => {
                info!(score = outcome.score, "substituting estimate for low-quality result");
                format!("{ESTIMATE_MARKER} {estimate}")
            }
            Err(err) => {
                warn!(error = %err, "estimate generation failed, keeping original result");
                outcome.text
            }
        }
    }
}

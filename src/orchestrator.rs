//! Run loop: Planner -> Supervisor -> (Executor | Planner | Renderer).
//!
//! The loop owns the state snapshot and is the only place updates are
//! merged. Component failures become failure records and feed back into the
//! next supervisor turn; only planning validation errors abort the run.

use tracing::{info, warn};

use crate::clarify::{clarified_query, Clarifier, ClarityAssessment};
use crate::config::Config;
use crate::errors::PlanError;
use crate::executor::Executor;
use crate::oracle::Oracle;
use crate::plan::FailureRecord;
use crate::planner::Planner;
use crate::report::ReportRenderer;
use crate::search::SearchProvider;
use crate::state::{ResearchState, StateUpdate};
use crate::supervisor::{Action, Supervisor};

pub struct Orchestrator<'a> {
    oracle: &'a dyn Oracle,
    search: &'a dyn SearchProvider,
    config: &'a Config,
}

impl<'a> Orchestrator<'a> {
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

    /// Score query clarity and, when needed, produce the question to put to
    /// the user. The command layer collects the answer interactively.
    pub async fn clarify(&self, query: &str) -> (ClarityAssessment, Option<String>) {
        let clarifier = Clarifier::new(self.oracle);
        let assessment = clarifier.assess(query, self.config.clarity_threshold).await;
        if !assessment.needed {
            return (assessment, None);
        }
        let question = clarifier.question(query).await;
        (assessment, question)
    }

    /// Fold a clarity assessment and an answered question into the state.
    pub fn apply_clarification(
        &self,
        state: ResearchState,
        assessment: ClarityAssessment,
        answered: Option<(&str, &str)>,
    ) -> ResearchState {
        let clarified = answered
            .map(|(question, answer)| clarified_query(&state.user_query, question, answer));
        state.apply(StateUpdate {
            clarity_score: Some(assessment.score),
            clarification_needed: Some(assessment.needed),
            clarified_query: clarified,
            ..StateUpdate::default()
        })
    }

    /// Plan for the query held in `state`, then drive the control loop to
    /// termination. Returns the final state, report included.
    pub async fn run(&self, state: ResearchState) -> Result<ResearchState, PlanError> {
        let planner = Planner::new(self.oracle);
        let supervisor = Supervisor::new(self.oracle);
        let executor = Executor::new(self.oracle, self.search, self.config);
        let renderer = ReportRenderer::new(self.oracle);

        let plan = planner.initial_plan(state.query()).await?;
        let mut state = state.apply(StateUpdate {
            plan: Some(plan),
            ..StateUpdate::default()
        });
        info!(run_id = %state.run_id, steps = state.plan.len(), "run started");

        loop {
            let update = match supervisor.decide(&state).await {
                Ok(update) => update,
                Err(err) => {
                    // unresolvable entity requirements count against the
                    // step's retry budget like any other failure
                    warn!(error = %err, "supervisor dispatch failed");
                    let step_id = state
                        .current_step()
                        .map(|s| s.id.clone())
                        .unwrap_or_default();
                    state = state.apply(StateUpdate::failure(FailureRecord::new(
                        &step_id,
                        &err.to_string(),
                    )));
                    continue;
                }
            };
            state = state.apply(update);

            match state.supervisor_decision {
                Some(Action::Execute) | Some(Action::Retry) => {
                    match executor.execute_step(&state).await {
                        Ok(update) => state = state.apply(update),
                        Err(err) => {
                            warn!(error = %err, "step execution failed");
                            let step_id = state
                                .current_step()
                                .map(|s| s.id.clone())
                                .unwrap_or_default();
                            state = state.apply(StateUpdate::failure(FailureRecord::new(
                                &step_id,
                                &err.to_string(),
                            )));
                        }
                    }
                }
                Some(Action::Skip) => {
                    info!(idx = state.current_step_idx, "step skipped");
                }
                Some(Action::Replan) => {
                    let Some(request) = state.replan_request.clone() else {
                        warn!("replan decision without a pending request");
                        continue;
                    };
                    let update = planner.replan(&state, &request).await?;
                    state = state.apply(update);
                }
                Some(Action::Terminate) => {
                    info!(reason = ?state.termination_reason, "run terminating");
                    let update = renderer.render(&state).await;
                    state = state.apply(update);
                    return Ok(state);
                }
                None => {
                    // decide() always sets a decision; treat absence as done
                    warn!("missing supervisor decision, terminating");
                    let update = renderer.render(&state).await;
                    state = state.apply(update);
                    return Ok(state);
                }
            }
        }
    }
}

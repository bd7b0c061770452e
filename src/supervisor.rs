//! Supervisor: the per-turn decision point of the run loop.
//!
//! Each invocation inspects the current state snapshot, consults the decision
//! oracle under hard budget constraints, and returns a partial update
//! carrying the chosen action and its side effects. A malformed or
//! non-compliant oracle response never crashes the loop; a deterministic
//! fallback policy takes over instead.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::SupervisorError;
use crate::oracle::parse::normalize_token;
use crate::oracle::prompts::DecisionContext;
use crate::oracle::Oracle;
use crate::plan::{PlanStep, ReplanRequest};
use crate::state::{ResearchState, StateUpdate};

/// How many of the current step's failure records the oracle gets to see.
const FAILURE_WINDOW: usize = 3;
/// How many upcoming steps the oracle gets to see.
const PLAN_WINDOW: usize = 6;

pub const REASON_NO_PLAN: &str = "no plan available";
pub const REASON_PLAN_COMPLETED: &str = "plan completed";
pub const REASON_PLAN_FINISHED: &str = "plan finished";
pub const REASON_NO_CURRENT_STEP: &str = "no valid current step";
pub const REASON_BUDGETS_EXHAUSTED: &str = "budgets exhausted; cannot progress safely";
pub const REASON_SUPERVISOR_CHOICE: &str = "terminated by supervisor decision";

/// The five legal supervisor actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Execute,
    Retry,
    Skip,
    Replan,
    Terminate,
}

impl Action {
    /// Parse a normalized token into an action. Anything else is `None` and
    /// routes the caller to the fallback policy.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "EXECUTE" => Some(Self::Execute),
            "RETRY" => Some(Self::Retry),
            "SKIP" => Some(Self::Skip),
            "REPLAN" => Some(Self::Replan),
            "TERMINATE" => Some(Self::Terminate),
            _ => None,
        }
    }
}

pub struct Supervisor<'a> {
    oracle: &'a dyn Oracle,
}

impl<'a> Supervisor<'a> {
    pub fn new(oracle: &'a dyn Oracle) -> Self {
        Self { oracle }
    }

    /// Decide the next action and return its state update.
    pub async fn decide(&self, state: &ResearchState) -> Result<StateUpdate, SupervisorError> {
        if state.plan.is_empty() {
            return Ok(terminate(state, REASON_NO_PLAN));
        }
        if state.plan_finished() {
            return Ok(terminate(state, REASON_PLAN_COMPLETED));
        }

        let action = match self.consult_oracle(state).await {
            Some(action) if self.satisfies_constraints(state, action) => action,
            Some(action) => {
                warn!(?action, "oracle action violates a budget constraint, using fallback");
                fallback_action(state)
            }
            None => fallback_action(state),
        };

        debug!(?action, step_idx = state.current_step_idx, "supervisor decision");
        self.apply_side_effects(state, action)
    }

    async fn consult_oracle(&self, state: &ResearchState) -> Option<Action> {
        let ctx = self.decision_context(state)?;
        match self.oracle.decide_action(&ctx).await {
            Ok(raw) => {
                let token = normalize_token(&raw);
                let action = Action::from_token(&token);
                if action.is_none() {
                    warn!(response = %raw.trim(), "unrecognized action token, using fallback");
                }
                action
            }
            Err(err) => {
                warn!(error = %err, "action oracle unavailable, using fallback");
                None
            }
        }
    }

    fn decision_context(&self, state: &ResearchState) -> Option<DecisionContext> {
        let step = state.current_step()?;

        let plan_summary = state.plan[state.current_step_idx..]
            .iter()
            .take(PLAN_WINDOW)
            .map(|s| s.summary_line())
            .collect::<Vec<_>>()
            .join("\n");

        let failures = state.failures_for(&step.id);
        let failure_summary = if failures.is_empty() {
            "None".to_string()
        } else {
            failures
                .iter()
                .rev()
                .take(FAILURE_WINDOW)
                .rev()
                .map(|f| format!("- {}", f.reason))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let mut constraints = Vec::new();
        if state.retry_budget_exhausted() {
            constraints
                .push("Retry budget for the current step is exhausted; you must NOT return RETRY.".to_string());
        }
        if state.replan_budget_exhausted() {
            constraints.push("Replan budget is exhausted; you must NOT return REPLAN.".to_string());
        }

        Some(DecisionContext {
            query: state.query().to_string(),
            current_step_idx: state.current_step_idx,
            current_step_line: step.summary_line(),
            plan_summary,
            failure_summary,
            retries_used: state.retries_used(&step.id),
            max_retries_per_step: state.max_retries_per_step,
            replan_count: state.replan_count,
            max_replans: state.max_replans,
            constraints,
        })
    }

    fn satisfies_constraints(&self, state: &ResearchState, action: Action) -> bool {
        match action {
            Action::Retry => !state.retry_budget_exhausted(),
            Action::Replan => !state.replan_budget_exhausted(),
            // re-executing a step that already failed is a retry in all but
            // name; the retry budget binds it or the loop never terminates
            Action::Execute => {
                state
                    .current_step()
                    .is_none_or(|s| state.failures_for(&s.id).is_empty())
                    || !state.retry_budget_exhausted()
            }
            _ => true,
        }
    }

    fn apply_side_effects(
        &self,
        state: &ResearchState,
        action: Action,
    ) -> Result<StateUpdate, SupervisorError> {
        match action {
            Action::Execute | Action::Retry => {
                let Some(step) = state.current_step() else {
                    return Ok(terminate(state, REASON_NO_CURRENT_STEP));
                };
                let expanded = expand_goal(step, state)?;

                let mut plan = state.plan.clone();
                plan[state.current_step_idx].expanded_goal = expanded;

                Ok(StateUpdate {
                    plan: Some(plan),
                    supervisor_decision: Some(action),
                    ..StateUpdate::default()
                })
            }
            Action::Skip => Ok(StateUpdate {
                current_step_idx: Some(state.current_step_idx + 1),
                supervisor_decision: Some(Action::Skip),
                ..StateUpdate::default()
            }),
            Action::Replan => {
                let Some(step) = state.current_step() else {
                    return Ok(terminate(state, REASON_NO_CURRENT_STEP));
                };
                let reason = state
                    .latest_failure_reason(&step.id)
                    .unwrap_or_else(|| "unspecified failure".to_string());
                Ok(StateUpdate {
                    replan_count: Some(state.replan_count + 1),
                    replan_request: Some(Some(ReplanRequest {
                        failed_step_id: step.id.clone(),
                        failure_reason: reason,
                        current_step_idx: state.current_step_idx,
                    })),
                    supervisor_decision: Some(Action::Replan),
                    ..StateUpdate::default()
                })
            }
            Action::Terminate => {
                let reason = if state.plan_finished() {
                    REASON_PLAN_FINISHED
                } else if state
                    .current_step()
                    .is_some_and(|s| !state.failures_for(&s.id).is_empty())
                {
                    REASON_BUDGETS_EXHAUSTED
                } else {
                    REASON_SUPERVISOR_CHOICE
                };
                Ok(terminate(state, reason))
            }
        }
    }
}

/// Deterministic action policy used whenever the oracle is unavailable,
/// unparseable, or non-compliant.
pub fn fallback_action(state: &ResearchState) -> Action {
    if state.plan_finished() {
        return Action::Terminate;
    }
    let Some(step) = state.current_step() else {
        return Action::Terminate;
    };

    if state.failures_for(&step.id).is_empty() {
        return Action::Execute;
    }
    if !state.retry_budget_exhausted() {
        return Action::Retry;
    }
    if !state.replan_budget_exhausted() {
        return Action::Replan;
    }
    if step.risk.is_skippable() {
        return Action::Skip;
    }
    Action::Terminate
}

/// Render the entity-context expansion for a step about to execute.
///
/// Absent or empty required entity types are a hard precondition failure.
/// Steps without entity requirements execute on their raw goal.
fn expand_goal(step: &PlanStep, state: &ResearchState) -> Result<Option<String>, SupervisorError> {
    if step.requires_entities.is_empty() {
        return Ok(None);
    }
    let missing = state.entities.missing_from(&step.requires_entities);
    if !missing.is_empty() {
        return Err(SupervisorError::MissingEntities {
            step_id: step.id.clone(),
            missing,
        });
    }
    let context = state.entities.context_block(&step.requires_entities);
    Ok(Some(format!("{}\n\n{}", step.goal, context)))
}

fn terminate(state: &ResearchState, reason: &str) -> StateUpdate {
    StateUpdate {
        supervisor_decision: Some(Action::Terminate),
        termination_reason: state
            .termination_reason
            .is_none()
            .then(|| reason.to_string()),
        ..StateUpdate::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::entities::EntityMap;
    use crate::plan::{FailureRecord, Method, Risk};
    use crate::test_support::{FailingOracle, ScriptedOracle};

    fn step(id: &str, risk: Risk) -> PlanStep {
        PlanStep {
            id: id.to_string(),
            goal: format!("goal for {id}"),
            expanded_goal: None,
            method: Method::Search,
            risk,
            produces_entities: vec![],
            requires_entities: vec![],
        }
    }

    fn state_with_plan(steps: Vec<PlanStep>) -> ResearchState {
        let mut state = ResearchState::new("query", &Config::default());
        state.plan = steps;
        state
    }

    // ==================== guards ====================

    #[tokio::test]
    async fn empty_plan_terminates_without_consulting_oracle() {
        let state = state_with_plan(vec![]);
        let update = Supervisor::new(&FailingOracle).decide(&state).await.unwrap();
        assert_eq!(update.supervisor_decision, Some(Action::Terminate));
        assert_eq!(update.termination_reason.as_deref(), Some(REASON_NO_PLAN));
    }

    #[tokio::test]
    async fn finished_plan_terminates_regardless_of_oracle() {
        let mut state = state_with_plan(vec![step("s1", Risk::Low)]);
        state.current_step_idx = 1;
        // oracle would say EXECUTE if asked; it must not be asked
        let oracle = ScriptedOracle::new(["EXECUTE"]);
        let update = Supervisor::new(&oracle).decide(&state).await.unwrap();
        assert_eq!(update.supervisor_decision, Some(Action::Terminate));
        assert_eq!(
            update.termination_reason.as_deref(),
            Some(REASON_PLAN_COMPLETED)
        );
        assert!(oracle.prompts().is_empty());
    }

    // ==================== oracle path ====================

    #[tokio::test]
    async fn oracle_execute_expands_and_dispatches() {
        let state = state_with_plan(vec![step("s1", Risk::Low)]);
        let oracle = ScriptedOracle::new(["EXECUTE"]);
        let update = Supervisor::new(&oracle).decide(&state).await.unwrap();
        assert_eq!(update.supervisor_decision, Some(Action::Execute));
        // no required entities, so the raw goal stands
        assert!(update.plan.unwrap()[0].expanded_goal.is_none());
    }

    #[tokio::test]
    async fn decorated_oracle_output_is_normalized() {
        let state = state_with_plan(vec![step("s1", Risk::Low)]);
        let oracle = ScriptedOracle::new(["Action: \"execute\""]);
        let update = Supervisor::new(&oracle).decide(&state).await.unwrap();
        assert_eq!(update.supervisor_decision, Some(Action::Execute));
    }

    #[tokio::test]
    async fn exhausted_retry_budget_overrides_oracle_retry() {
        let mut state = state_with_plan(vec![step("s1", Risk::Low)]);
        state.max_retries_per_step = 1;
        state.max_replans = 2;
        state.failed_steps.push(FailureRecord::new("s1", "x"));
        let oracle = ScriptedOracle::new(["RETRY"]);
        let update = Supervisor::new(&oracle).decide(&state).await.unwrap();
        // fallback: retry exhausted, replan budget open
        assert_eq!(update.supervisor_decision, Some(Action::Replan));
    }

    #[tokio::test]
    async fn exhausted_replan_budget_overrides_oracle_replan() {
        let mut state = state_with_plan(vec![step("s1", Risk::Low)]);
        state.replan_count = state.max_replans;
        let oracle = ScriptedOracle::new(["REPLAN"]);
        let update = Supervisor::new(&oracle).decide(&state).await.unwrap();
        // no failures recorded, so the fallback executes
        assert_eq!(update.supervisor_decision, Some(Action::Execute));
    }

    #[tokio::test]
    async fn execute_on_failed_step_is_bound_by_retry_budget() {
        let mut state = state_with_plan(vec![step("s1", Risk::Low)]);
        state.max_retries_per_step = 2;
        state.max_replans = 0;
        state.failed_steps.push(FailureRecord::new("s1", "x"));
        let oracle = ScriptedOracle::new(["EXECUTE"]);
        let update = Supervisor::new(&oracle).decide(&state).await.unwrap();
        // budget still open, the oracle's choice stands
        assert_eq!(update.supervisor_decision, Some(Action::Execute));

        state.failed_steps.push(FailureRecord::new("s1", "y"));
        let oracle = ScriptedOracle::new(["EXECUTE"]);
        let update = Supervisor::new(&oracle).decide(&state).await.unwrap();
        assert_eq!(update.supervisor_decision, Some(Action::Terminate));
    }

    #[tokio::test]
    async fn garbage_oracle_output_routes_to_fallback() {
        let state = state_with_plan(vec![step("s1", Risk::Low)]);
        let oracle = ScriptedOracle::new(["I think we should proceed carefully"]);
        let update = Supervisor::new(&oracle).decide(&state).await.unwrap();
        assert_eq!(update.supervisor_decision, Some(Action::Execute));
    }

    // ==================== fallback policy ====================

    #[tokio::test]
    async fn fallback_executes_fresh_step() {
        let state = state_with_plan(vec![step("s1", Risk::Low)]);
        assert_eq!(fallback_action(&state), Action::Execute);
    }

    #[tokio::test]
    async fn fallback_retries_failed_step_within_budget() {
        let mut state = state_with_plan(vec![step("s1", Risk::Low)]);
        state.failed_steps.push(FailureRecord::new("s1", "x"));
        assert_eq!(fallback_action(&state), Action::Retry);
    }

    #[tokio::test]
    async fn fallback_skips_high_risk_when_budgets_gone() {
        let mut state = state_with_plan(vec![step("s1", Risk::High)]);
        state.max_retries_per_step = 2;
        state.max_replans = 0;
        state.failed_steps.push(FailureRecord::new("s1", "x"));
        state.failed_steps.push(FailureRecord::new("s1", "y"));
        assert_eq!(fallback_action(&state), Action::Skip);
    }

    #[tokio::test]
    async fn fallback_terminates_low_risk_when_budgets_gone() {
        let mut state = state_with_plan(vec![step("s1", Risk::Low)]);
        state.max_retries_per_step = 2;
        state.max_replans = 0;
        state.failed_steps.push(FailureRecord::new("s1", "x"));
        state.failed_steps.push(FailureRecord::new("s1", "y"));
        assert_eq!(fallback_action(&state), Action::Terminate);

        let update = Supervisor::new(&FailingOracle).decide(&state).await.unwrap();
        assert_eq!(
            update.termination_reason.as_deref(),
            Some(REASON_BUDGETS_EXHAUSTED)
        );
    }

    // ==================== side effects ====================

    #[tokio::test]
    async fn skip_advances_index_only() {
        let mut state = state_with_plan(vec![step("s1", Risk::High), step("s2", Risk::Low)]);
        state.max_retries_per_step = 0;
        state.max_replans = 0;
        state.failed_steps.push(FailureRecord::new("s1", "x"));
        let update = Supervisor::new(&FailingOracle).decide(&state).await.unwrap();
        assert_eq!(update.supervisor_decision, Some(Action::Skip));
        assert_eq!(update.current_step_idx, Some(1));
        assert!(update.replan_request.is_none());
    }

    #[tokio::test]
    async fn replan_emits_request_with_latest_failure() {
        let mut state = state_with_plan(vec![step("s1", Risk::Low)]);
        state.max_retries_per_step = 1;
        state.failed_steps.push(FailureRecord::new("s1", "first"));
        let oracle = ScriptedOracle::new(["REPLAN"]);
        let update = Supervisor::new(&oracle).decide(&state).await.unwrap();

        assert_eq!(update.replan_count, Some(1));
        let request = update.replan_request.unwrap().unwrap();
        assert_eq!(request.failed_step_id, "s1");
        assert_eq!(request.failure_reason, "first");
        assert_eq!(request.current_step_idx, 0);
    }

    #[tokio::test]
    async fn execute_renders_entity_context_into_expanded_goal() {
        let mut s = step("s2", Risk::Low);
        s.requires_entities = vec!["trails".to_string()];
        let mut state = state_with_plan(vec![s]);
        let mut entities = EntityMap::new();
        entities.merge(
            [("trails".to_string(), vec!["Johnson Mountain".to_string()])].into(),
            10,
        );
        state.entities = entities;

        let oracle = ScriptedOracle::new(["EXECUTE"]);
        let update = Supervisor::new(&oracle).decide(&state).await.unwrap();
        let expanded = update.plan.unwrap()[0].expanded_goal.clone().unwrap();
        assert!(expanded.starts_with("goal for s2"));
        assert!(expanded.contains("Context for entity type trails:"));
        assert!(expanded.contains("1. Johnson Mountain"));
    }

    #[tokio::test]
    async fn execute_with_missing_required_entities_errors() {
        let mut s = step("s2", Risk::Low);
        s.requires_entities = vec!["trails".to_string()];
        let state = state_with_plan(vec![s]);
        let oracle = ScriptedOracle::new(["EXECUTE"]);
        let err = Supervisor::new(&oracle).decide(&state).await.unwrap_err();
        match err {
            SupervisorError::MissingEntities { step_id, missing } => {
                assert_eq!(step_id, "s2");
                assert_eq!(missing, vec!["trails"]);
            }
        }
    }

    #[tokio::test]
    async fn termination_reason_is_not_overwritten() {
        let mut state = state_with_plan(vec![]);
        state.termination_reason = Some("earlier reason".to_string());
        let update = Supervisor::new(&FailingOracle).decide(&state).await.unwrap();
        assert_eq!(update.supervisor_decision, Some(Action::Terminate));
        assert!(update.termination_reason.is_none());
    }
}

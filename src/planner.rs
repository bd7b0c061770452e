//! Planner: initial plan generation and scoped replanning.
//!
//! Plan validation is strict and fatal. A structurally invalid plan cannot
//! safely drive the rest of the run, so violations surface the raw oracle
//! output and the specific problem instead of silently coercing.

use std::collections::HashSet;

use serde_json::Value;
use tracing::info;

use crate::errors::PlanError;
use crate::oracle::parse::strip_code_fences;
use crate::oracle::{prompts, Oracle};
use crate::plan::{Method, PlanStep, ReplanRequest, Risk};
use crate::state::{ResearchState, StateUpdate};

const REQUIRED_FIELDS: [&str; 6] = [
    "id",
    "goal",
    "method",
    "risk",
    "produces_entities",
    "requires_entities",
];

pub struct Planner<'a> {
    oracle: &'a dyn Oracle,
}

impl<'a> Planner<'a> {
    pub fn new(oracle: &'a dyn Oracle) -> Self {
        Self { oracle }
    }

    /// Produce a validated initial plan for the query.
    pub async fn initial_plan(&self, query: &str) -> Result<Vec<PlanStep>, PlanError> {
        let raw = self.oracle.complete(&prompts::initial_plan(query)).await?;
        let plan = validate_steps(&raw, &HashSet::new())?;
        info!(steps = plan.len(), "initial plan validated");
        Ok(plan)
    }

    /// Replace the plan tail from the failed index onward, preserving the
    /// prefix verbatim. Resets the step index to the replan point, drops
    /// failure records that no longer refer to a surviving step, and clears
    /// the pending request.
    pub async fn replan(
        &self,
        state: &ResearchState,
        request: &ReplanRequest,
    ) -> Result<StateUpdate, PlanError> {
        let k = request.current_step_idx.min(state.plan.len());
        let prefix: Vec<PlanStep> = state.plan[..k].to_vec();
        let prefix_ids: HashSet<String> = prefix.iter().map(|s| s.id.clone()).collect();

        let completed = serde_json::to_string_pretty(&prefix).unwrap_or_else(|_| "[]".to_string());
        let raw = self
            .oracle
            .complete(&prompts::replan(
                state.query(),
                &request.failed_step_id,
                &request.failure_reason,
                k,
                &completed,
            ))
            .await?;
        let tail = validate_steps(&raw, &prefix_ids)?;
        info!(preserved = k, new_tail = tail.len(), "replan validated");

        let mut plan = prefix;
        plan.extend(tail);

        let failed_steps = state
            .failed_steps
            .iter()
            .filter(|f| prefix_ids.contains(&f.step_id))
            .cloned()
            .collect();

        Ok(StateUpdate {
            plan: Some(plan),
            current_step_idx: Some(k),
            failed_steps: Some(failed_steps),
            replan_request: Some(None),
            ..StateUpdate::default()
        })
    }
}

/// Validate raw oracle output as a list of plan steps. `existing_ids` holds
/// ids already taken by a preserved prefix.
fn validate_steps(raw: &str, existing_ids: &HashSet<String>) -> Result<Vec<PlanStep>, PlanError> {
    let body = strip_code_fences(raw);
    let value: Value = serde_json::from_str(body).map_err(|_| PlanError::NotAList {
        raw: raw.to_string(),
    })?;
    let Value::Array(items) = value else {
        return Err(PlanError::NotAList {
            raw: raw.to_string(),
        });
    };
    if items.is_empty() {
        return Err(PlanError::Empty {
            raw: raw.to_string(),
        });
    }

    let mut seen_ids: HashSet<String> = existing_ids.clone();
    let mut steps = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let step = validate_step(item).map_err(|reason| PlanError::InvalidStep {
            index,
            reason,
            raw: raw.to_string(),
        })?;
        if !seen_ids.insert(step.id.clone()) {
            return Err(PlanError::DuplicateStepId { id: step.id });
        }
        steps.push(step);
    }
    Ok(steps)
}

fn validate_step(item: &Value) -> Result<PlanStep, String> {
    let Value::Object(fields) = item else {
        return Err("step is not a JSON object".to_string());
    };

    for field in REQUIRED_FIELDS {
        if !fields.contains_key(field) {
            return Err(format!("missing field '{field}'"));
        }
    }
    for key in fields.keys() {
        if !REQUIRED_FIELDS.contains(&key.as_str()) {
            return Err(format!("unexpected field '{key}'"));
        }
    }

    let id = non_empty_string(&fields["id"], "id")?;
    let goal = non_empty_string(&fields["goal"], "goal")?;

    let method = match fields["method"].as_str() {
        Some("search") => Method::Search,
        Some("analysis") => Method::Analysis,
        _ => return Err("method must be one of [\"search\", \"analysis\"]".to_string()),
    };
    let risk = match fields["risk"].as_str() {
        Some("low") => Risk::Low,
        Some("medium") => Risk::Medium,
        Some("high") => Risk::High,
        _ => return Err("risk must be one of [\"low\", \"medium\", \"high\"]".to_string()),
    };

    Ok(PlanStep {
        id,
        goal,
        expanded_goal: None,
        method,
        risk,
        produces_entities: string_list(&fields["produces_entities"], "produces_entities")?,
        requires_entities: string_list(&fields["requires_entities"], "requires_entities")?,
    })
}

fn non_empty_string(value: &Value, field: &str) -> Result<String, String> {
    match value.as_str() {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(format!("{field} must be a non-empty string")),
    }
}

fn string_list(value: &Value, field: &str) -> Result<Vec<String>, String> {
    let Value::Array(items) = value else {
        return Err(format!("{field} must be a list of strings"));
    };
    items
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("{field} must contain only strings"))
        })
        .collect()
}

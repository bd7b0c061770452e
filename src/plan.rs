//! Plan data model.
//!
//! A plan is an ordered sequence of [`PlanStep`]s. Steps are immutable once
//! created except for `expanded_goal`, which the supervisor sets just before
//! dispatching the step to the executor.

use serde::{Deserialize, Serialize};

/// How a step gathers its information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Retrieve information from external sources.
    Search,
    /// Derive information from already-collected evidence.
    Analysis,
}

/// How likely the step's data is to be unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Risk {
    /// Data is very likely to exist in public sources.
    Low,
    /// Data likely exists but may require synthesis or proxies.
    Medium,
    /// Data may be incomplete, outdated, or unavailable.
    High,
}

impl Risk {
    /// High-risk steps are the ones the fallback policy is willing to skip
    /// once all budgets are exhausted.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::High)
    }
}

/// One unit of a research plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Unique identifier within the plan (e.g. "s1").
    pub id: String,
    /// What the step aims to find or compute.
    pub goal: String,
    /// Goal with required-entity context interpolated; set by the supervisor
    /// once per execution attempt, just before dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_goal: Option<String>,
    pub method: Method,
    pub risk: Risk,
    /// Entity types this step is expected to produce.
    #[serde(default)]
    pub produces_entities: Vec<String>,
    /// Entity types that must exist before this step can execute.
    #[serde(default)]
    pub requires_entities: Vec<String>,
}

impl PlanStep {
    /// The goal text to execute: the expanded goal when the supervisor has
    /// rendered one, otherwise the raw goal.
    pub fn effective_goal(&self) -> &str {
        self.expanded_goal.as_deref().unwrap_or(&self.goal)
    }

    /// One-line summary used in supervisor prompts.
    pub fn summary_line(&self) -> String {
        format!(
            "{} | method={:?} | risk={:?} | goal={}",
            self.id, self.method, self.risk, self.goal
        )
    }
}

/// One failed execution attempt. Append-only; the per-step retry count is
/// derived by counting records with a matching `step_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub step_id: String,
    pub reason: String,
}

impl FailureRecord {
    pub fn new(step_id: &str, reason: &str) -> Self {
        Self {
            step_id: step_id.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Emitted by the supervisor on REPLAN; consumed by the planner on its next
/// turn. `current_step_idx` is the index `k` from which the plan tail is
/// replaced, preserving `[0, k)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplanRequest {
    pub failed_step_id: String,
    pub failure_reason: String,
    pub current_step_idx: usize,
}

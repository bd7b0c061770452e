//! Run state snapshot and the partial-update merge contract.
//!
//! The run loop owns a single [`ResearchState`] snapshot. Each component
//! receives it read-only and returns a [`StateUpdate`] — a set of field
//! replacements — that the run loop merges into the next snapshot via
//! [`ResearchState::apply`]. No component ever mutates a snapshot another
//! component can still see, which is what makes the concurrent sub-task
//! fan-out safe without locks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::entities::EntityMap;
use crate::plan::{FailureRecord, PlanStep, ReplanRequest};
use crate::supervisor::Action;

/// The full state of one research run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchState {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,

    // user input
    pub user_query: String,
    pub clarified_query: Option<String>,

    // clarification
    pub clarity_score: f32,
    pub clarification_needed: bool,

    // planning
    pub plan: Vec<PlanStep>,
    pub current_step_idx: usize,
    pub replan_request: Option<ReplanRequest>,

    // execution memory
    pub entities: EntityMap,
    /// `evidence_store[i]` holds the sub-task result strings for plan step
    /// `i`. Grows by index with empty-list padding; never shrinks or
    /// reorders.
    pub evidence_store: Vec<Vec<String>>,
    pub failed_steps: Vec<FailureRecord>,
    /// Substitute synthetic estimates for low-scoring sub-task results.
    pub use_estimates: bool,

    // control
    pub supervisor_decision: Option<Action>,
    pub termination_reason: Option<String>,

    // budgets
    pub replan_count: u32,
    pub max_replans: u32,
    pub max_retries_per_step: u32,

    pub final_report: Option<String>,
}

impl ResearchState {
    pub fn new(user_query: &str, config: &Config) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            user_query: user_query.to_string(),
            clarified_query: None,
            clarity_score: 0.0,
            clarification_needed: false,
            plan: Vec::new(),
            current_step_idx: 0,
            replan_request: None,
            entities: EntityMap::new(),
            evidence_store: Vec::new(),
            failed_steps: Vec::new(),
            use_estimates: config.use_estimates,
            supervisor_decision: None,
            termination_reason: None,
            replan_count: 0,
            max_replans: config.max_replans,
            max_retries_per_step: config.max_retries_per_step,
            final_report: None,
        }
    }

    /// The query driving planning and reporting: the clarified query when
    /// clarification produced one, otherwise the raw user query.
    pub fn query(&self) -> &str {
        self.clarified_query.as_deref().unwrap_or(&self.user_query)
    }

    pub fn plan_finished(&self) -> bool {
        self.current_step_idx >= self.plan.len()
    }

    pub fn current_step(&self) -> Option<&PlanStep> {
        self.plan.get(self.current_step_idx)
    }

    /// All failure records for the given step, oldest first.
    pub fn failures_for(&self, step_id: &str) -> Vec<&FailureRecord> {
        self.failed_steps
            .iter()
            .filter(|f| f.step_id == step_id)
            .collect()
    }

    /// Retry count for a step is derived from its failure records.
    pub fn retries_used(&self, step_id: &str) -> u32 {
        self.failures_for(step_id).len() as u32
    }

    pub fn retry_budget_exhausted(&self) -> bool {
        match self.current_step() {
            Some(step) => self.retries_used(&step.id) >= self.max_retries_per_step,
            None => true,
        }
    }

    pub fn replan_budget_exhausted(&self) -> bool {
        self.replan_count >= self.max_replans
    }

    pub fn latest_failure_reason(&self, step_id: &str) -> Option<String> {
        self.failures_for(step_id).last().map(|f| f.reason.clone())
    }

    /// Merge a partial update into this snapshot, producing the next one.
    pub fn apply(mut self, update: StateUpdate) -> Self {
        if let Some(v) = update.clarified_query {
            self.clarified_query = Some(v);
        }
        if let Some(v) = update.clarity_score {
            self.clarity_score = v;
        }
        if let Some(v) = update.clarification_needed {
            self.clarification_needed = v;
        }
        if let Some(v) = update.plan {
            self.plan = v;
        }
        if let Some(v) = update.current_step_idx {
            self.current_step_idx = v;
        }
        if let Some(v) = update.replan_request {
            self.replan_request = v;
        }
        if let Some(v) = update.entities {
            self.entities = v;
        }
        if let Some(v) = update.evidence_store {
            self.evidence_store = v;
        }
        if let Some(v) = update.failed_steps {
            self.failed_steps = v;
        }
        if let Some(f) = update.record_failure {
            self.failed_steps.push(f);
        }
        if let Some(v) = update.supervisor_decision {
            self.supervisor_decision = Some(v);
        }
        if let Some(v) = update.termination_reason {
            self.termination_reason = Some(v);
        }
        if let Some(v) = update.replan_count {
            self.replan_count = v;
        }
        if let Some(v) = update.final_report {
            self.final_report = Some(v);
        }
        self
    }
}

/// A set of field replacements returned by one component turn.
///
/// `replan_request` is doubly optional so an update can distinguish
/// "leave as-is" (`None`) from "clear it" (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub clarified_query: Option<String>,
    pub clarity_score: Option<f32>,
    pub clarification_needed: Option<bool>,
    pub plan: Option<Vec<PlanStep>>,
    pub current_step_idx: Option<usize>,
    pub replan_request: Option<Option<ReplanRequest>>,
    pub entities: Option<EntityMap>,
    pub evidence_store: Option<Vec<Vec<String>>>,
    pub failed_steps: Option<Vec<FailureRecord>>,
    /// Append a single failure record without replacing the whole log.
    pub record_failure: Option<FailureRecord>,
    pub supervisor_decision: Option<Action>,
    pub termination_reason: Option<String>,
    pub replan_count: Option<u32>,
    pub final_report: Option<String>,
}

impl StateUpdate {
    pub fn failure(record: FailureRecord) -> Self {
        Self {
            record_failure: Some(record),
            ..Self::default()
        }
    }
}

/// Pad an evidence store clone with empty lists so `idx` is addressable,
/// keeping indices aligned with plan positions.
pub fn pad_evidence(evidence: &mut Vec<Vec<String>>, idx: usize) {
    while evidence.len() <= idx {
        evidence.push(Vec::new());
    }
}

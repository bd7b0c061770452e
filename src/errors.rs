//! Typed error hierarchy for the delve orchestrator.
//!
//! Four top-level enums cover the four subsystems:
//! - `OracleError` — decision oracle (LLM) transport and contract failures
//! - `SearchError` — search provider transport failures
//! - `PlanError` — planner output validation failures (fatal for the attempt)
//! - `SupervisorError` — control-loop precondition failures

use thiserror::Error;

/// Errors from the decision oracle boundary.
///
/// Everything here is recoverable at the call site: each oracle contract
/// method documents a deterministic fallback (neutral score, first-N
/// candidates, empty entity lists, deterministic action policy).
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("oracle API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("oracle returned an empty response")]
    EmptyResponse,

    #[error("missing API key: set the {0} environment variable")]
    MissingKey(&'static str),
}

/// Errors from the search provider.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("missing API key: set the {0} environment variable")]
    MissingKey(&'static str),
}

/// Errors from plan validation.
///
/// These are fatal for the planning attempt: an invalid plan cannot safely
/// drive the rest of the system, so they surface the raw oracle output and
/// the specific violation instead of silently patching.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("planner output is not a JSON list.\nRaw output:\n{raw}")]
    NotAList { raw: String },

    #[error("planner returned an empty plan.\nRaw output:\n{raw}")]
    Empty { raw: String },

    #[error("step {index} is invalid: {reason}\nRaw output:\n{raw}")]
    InvalidStep {
        index: usize,
        reason: String,
        raw: String,
    },

    #[error("duplicate step id '{id}' in plan")]
    DuplicateStepId { id: String },
}

/// Errors from the supervisor's pre-dispatch checks.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("cannot expand goal for step '{step_id}'; missing required entities: {missing:?}")]
    MissingEntities {
        step_id: String,
        missing: Vec<String>,
    },
}

/// Errors from a single step execution.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("no current step at index {idx}")]
    NoCurrentStep { idx: usize },

    #[error("decomposition failed for step '{step_id}': {source}")]
    Decomposition {
        step_id: String,
        #[source]
        source: OracleError,
    },

    #[error("decomposition produced no sub-tasks for step '{step_id}'")]
    EmptyDecomposition { step_id: String },
}

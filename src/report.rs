//! Final report rendering.
//!
//! The renderer summarizes the evidence store for the oracle and asks it to
//! write the report. When the oracle is unavailable it degrades to a local
//! plain-text digest, so a finished run always produces output.

use tracing::warn;

use crate::executor::ESTIMATE_MARKER;
use crate::oracle::{prompts, Oracle};
use crate::state::{ResearchState, StateUpdate};

pub struct ReportRenderer<'a> {
    oracle: &'a dyn Oracle,
}

impl<'a> ReportRenderer<'a> {
    pub fn new(oracle: &'a dyn Oracle) -> Self {
        Self { oracle }
    }

    /// Render the final report from accumulated evidence.
    pub async fn render(&self, state: &ResearchState) -> StateUpdate {
        let summary = evidence_summary(state);
        let context = termination_context(state);

        let report = match self
            .oracle
            .complete(&prompts::final_report(state.query(), &summary, &context))
            .await
        {
            Ok(raw) if !raw.trim().is_empty() => raw.trim().to_string(),
            Ok(_) => {
                warn!("empty report from oracle, using local digest");
                fallback_report(state)
            }
            Err(err) => {
                warn!(error = %err, "report generation failed, using local digest");
                fallback_report(state)
            }
        };

        StateUpdate {
            final_report: Some(report),
            ..StateUpdate::default()
        }
    }
}

/// Structured evidence digest grouped by plan step, for the report prompt.
fn evidence_summary(state: &ResearchState) -> String {
    let mut lines = vec!["EVIDENCE BY PLAN STEP:".to_string()];

    for (i, step) in state.plan.iter().enumerate() {
        lines.push(format!("- Step {}: {}", i + 1, step.goal));
        let evidence = state.evidence_store.get(i);
        match evidence {
            Some(items) if !items.is_empty() => {
                for item in items {
                    lines.push(format!("    * {}", item.trim()));
                }
            }
            _ => lines.push("    * No evidence collected for this step.".to_string()),
        }
    }

    if !state.failed_steps.is_empty() {
        lines.push(String::new());
        lines.push("FAILED / INCOMPLETE STEPS:".to_string());
        for f in &state.failed_steps {
            lines.push(format!("- Step {}: {}", f.step_id, f.reason));
        }
    }

    lines.join("\n")
}

fn termination_context(state: &ResearchState) -> String {
    state
        .termination_reason
        .clone()
        .unwrap_or_else(|| "Normal completion".to_string())
}

/// Local digest used when the oracle cannot write the report. Keeps internal
/// step identifiers out of the user-facing text.
fn fallback_report(state: &ResearchState) -> String {
    let mut out = vec![
        format!("Research question: {}", state.query()),
        String::new(),
        "A synthesized report could not be generated; the findings below are \
         presented as collected."
            .to_string(),
        String::new(),
        "Findings:".to_string(),
    ];

    let mut any = false;
    for items in &state.evidence_store {
        for item in items {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            any = true;
            if let Some(estimate) = item.strip_prefix(ESTIMATE_MARKER) {
                out.push(format!("- (estimate) {}", estimate.trim()));
            } else {
                out.push(format!("- {item}"));
            }
        }
    }
    if !any {
        out.push("- No evidence was collected.".to_string());
    }

    if !state.failed_steps.is_empty() {
        out.push(String::new());
        out.push(format!(
            "{} research step(s) could not be completed.",
            state.failed_steps.len()
        ));
    }

    out.push(String::new());
    out.push(format!("Outcome: {}", termination_context(state)));
    out.join("\n")
}

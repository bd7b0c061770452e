//! Full research run — `delve run <QUERY>`.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;

use super::super::Cli;

use delve::config::Config;
use delve::oracle::OpenAiOracle;
use delve::orchestrator::Orchestrator;
use delve::search::TavilySearch;
use delve::state::ResearchState;

pub async fn cmd_run(
    cli: &Cli,
    query: &str,
    max_replans: Option<u32>,
    max_retries: Option<u32>,
    estimate: bool,
    output: Option<&Path>,
) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(v) = max_replans {
        config.max_replans = v;
    }
    if let Some(v) = max_retries {
        config.max_retries_per_step = v;
    }
    if estimate {
        config.use_estimates = true;
    }
    config.verbose = cli.verbose;

    let oracle = OpenAiOracle::from_env(&config.model)?;
    let search = TavilySearch::from_env()?;
    let orchestrator = Orchestrator::new(&oracle, &search, &config);

    let state = ResearchState::new(query, &config);
    let state = clarify(&orchestrator, state, cli.yes).await?;

    println!("{}", style("Researching...").cyan().bold());
    let final_state = orchestrator.run(state).await?;

    let report = final_state
        .final_report
        .as_deref()
        .unwrap_or("No report was produced.");

    println!();
    println!("{}", style("Final Report").green().bold());
    println!("{}", style("============").green().bold());
    println!();
    println!("{report}");

    if let Some(reason) = &final_state.termination_reason {
        println!();
        println!("{} {reason}", style("Run ended:").dim());
    }

    if let Some(path) = output {
        std::fs::write(path, report)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("{} {}", style("Report written to").dim(), path.display());
    }

    Ok(())
}

/// Run the clarity gate. With `--yes` (or when no question is warranted) the
/// raw query goes straight to planning.
async fn clarify(
    orchestrator: &Orchestrator<'_>,
    state: ResearchState,
    skip_prompts: bool,
) -> Result<ResearchState> {
    let (assessment, question) = orchestrator.clarify(&state.user_query).await;

    if skip_prompts || !assessment.needed {
        return Ok(orchestrator.apply_clarification(state, assessment, None));
    }

    let Some(question) = question else {
        return Ok(orchestrator.apply_clarification(state, assessment, None));
    };

    println!(
        "{}",
        style("Your query could use one clarification:").yellow()
    );
    println!("  {question}");
    let answer: String = Input::new()
        .with_prompt("Your answer (empty to skip)")
        .allow_empty(true)
        .interact_text()?;

    if answer.trim().is_empty() {
        return Ok(orchestrator.apply_clarification(state, assessment, None));
    }
    Ok(orchestrator.apply_clarification(state, assessment, Some((&question, answer.trim()))))
}

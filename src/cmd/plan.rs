//! Plan preview — `delve plan <QUERY>`.

use anyhow::Result;
use console::style;

use super::super::Cli;

use delve::config::Config;
use delve::oracle::OpenAiOracle;
use delve::planner::Planner;

pub async fn cmd_plan(cli: &Cli, query: &str) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let oracle = OpenAiOracle::from_env(&config.model)?;

    let plan = Planner::new(&oracle).initial_plan(query).await?;

    println!("{}", style("Research Plan").cyan().bold());
    println!("{}", style("=============").cyan().bold());
    println!();
    for (i, step) in plan.iter().enumerate() {
        println!(
            "{} {}",
            style(format!("{}.", i + 1)).bold(),
            step.goal
        );
        println!(
            "   {} method={:?} risk={:?}",
            style(&step.id).dim(),
            step.method,
            step.risk
        );
        if !step.requires_entities.is_empty() {
            println!("   requires: {}", step.requires_entities.join(", "));
        }
        if !step.produces_entities.is_empty() {
            println!("   produces: {}", step.produces_entities.join(", "));
        }
    }

    Ok(())
}

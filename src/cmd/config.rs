//! Configuration view — `delve config`.

use anyhow::Result;
use console::style;

use super::super::Cli;

use delve::config::Config;

pub fn cmd_config(cli: &Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    println!("{}", style("Delve Configuration").cyan().bold());
    println!("{}", style("===================").cyan().bold());
    println!();
    match &cli.config {
        Some(path) => println!("Config file: {}", path.display()),
        None if std::path::Path::new("delve.toml").exists() => {
            println!("Config file: ./delve.toml");
        }
        None => println!("No delve.toml found; showing defaults."),
    }
    println!();
    println!("  model = \"{}\"", config.model);
    println!("  max_replans = {}", config.max_replans);
    println!("  max_retries_per_step = {}", config.max_retries_per_step);
    println!("  subtask_concurrency = {}", config.subtask_concurrency);
    println!("  top_n_urls = {}", config.top_n_urls);
    println!("  entity_value_cap = {}", config.entity_value_cap);
    println!("  query_length_limit = {}", config.query_length_limit);
    println!("  max_content_chars = {}", config.max_content_chars);
    println!("  search_max_results = {}", config.search_max_results);
    println!("  low_quality_threshold = {}", config.low_quality_threshold);
    println!("  clarity_threshold = {}", config.clarity_threshold);
    println!("  use_estimates = {}", config.use_estimates);
    println!();
    println!(
        "API keys are read from the environment: {} and {}.",
        style("OPENAI_API_KEY").bold(),
        style("TAVILY_API_KEY").bold()
    );

    Ok(())
}

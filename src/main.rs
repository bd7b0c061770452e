use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;

#[derive(Parser)]
#[command(name = "delve")]
#[command(
    version,
    about = "AI-powered deep research orchestrator - plan, search, and synthesize evidence-backed reports"
)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip interactive prompts (clarification questions are not asked)
    #[arg(long, global = true)]
    pub yes: bool,

    /// Path to a delve.toml config file (defaults to ./delve.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a full research loop: plan, execute, and write the final report
    Run {
        /// The research query
        query: String,

        /// Maximum number of plan revisions
        #[arg(long)]
        max_replans: Option<u32>,

        /// Maximum retries per plan step
        #[arg(long)]
        max_retries: Option<u32>,

        /// Substitute hedged estimates for evidence that cannot be found
        #[arg(long)]
        estimate: bool,

        /// Write the final report to a file as well as stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate and print a research plan without executing it
    Plan {
        /// The research query
        query: String,
    },
    /// Show the resolved configuration
    Config,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default = if verbose { "delve=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Run {
            query,
            max_replans,
            max_retries,
            estimate,
            output,
        } => {
            cmd::cmd_run(
                &cli,
                query,
                *max_replans,
                *max_retries,
                *estimate,
                output.as_deref(),
            )
            .await?;
        }
        Commands::Plan { query } => cmd::cmd_plan(&cli, query).await?,
        Commands::Config => cmd::cmd_config(&cli)?,
    }

    Ok(())
}

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "codelab-cli")]
#[command(about = "Codelab CLI - Run, submit and answer problems against the execution backend", long_about = None)]
struct Cli {
    /// Execution backend base URL (overrides CODELAB_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Request timeout in milliseconds (overrides CODELAB_TIMEOUT_MS)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value = "false")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run code against the problem's visible cases plus any extra cases
    Run {
        /// Problem schema JSON file
        #[arg(short, long)]
        problem: PathBuf,

        /// Source file to run
        #[arg(short, long)]
        code: PathBuf,

        /// Language (python, java, cpp, c, javascript)
        #[arg(short, long, default_value = "python")]
        language: String,

        /// Extra case as "<inputs> => <output>", inputs separated by " | "
        #[arg(long = "case")]
        cases: Vec<String>,
    },

    /// Submit code for grading against every case, hidden ones included
    Submit {
        /// Problem schema JSON file
        #[arg(short, long)]
        problem: PathBuf,

        /// Source file to submit
        #[arg(short, long)]
        code: PathBuf,

        /// Language (python, java, cpp, c, javascript)
        #[arg(short, long, default_value = "python")]
        language: String,

        /// Contest id, when submitting inside a contest
        #[arg(long)]
        contest: Option<String>,
    },

    /// Answer a multiple-choice question
    Mcq {
        /// Problem schema JSON file
        #[arg(short, long)]
        problem: PathBuf,

        /// Zero-based option index
        #[arg(short, long)]
        option: usize,

        /// Contest id, when answering inside a contest
        #[arg(long)]
        contest: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let config = commands::client_config(cli.api_url.as_deref(), cli.timeout_ms);

    match cli.command {
        Commands::Run {
            problem,
            code,
            language,
            cases,
        } => {
            commands::run(&config, &problem, &code, &language, &cases).await?;
        }
        Commands::Submit {
            problem,
            code,
            language,
            contest,
        } => {
            commands::submit(&config, &problem, &code, &language, contest.as_deref()).await?;
        }
        Commands::Mcq {
            problem,
            option,
            contest,
        } => {
            commands::answer_mcq(&config, &problem, option, contest.as_deref()).await?;
        }
    }

    Ok(())
}

//! paes CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "paes", version, about = "PAES practice exam scoring and analysis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a session file against an exam file
    Score {
        /// Path to the exam (.toml or .json)
        #[arg(long)]
        exam: PathBuf,

        /// Path to the session JSON
        #[arg(long)]
        session: PathBuf,

        /// Completion time (RFC 3339), defaults to the current time
        #[arg(long)]
        now: Option<String>,

        /// Output directory, defaults to `output_dir` from the config
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, markdown, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Finish stored sessions and record their results
    Finish {
        /// Session id (repeat to finish several)
        #[arg(long = "session-id", required = true)]
        session_ids: Vec<String>,

        /// Completion time (RFC 3339), defaults to the current time
        #[arg(long)]
        now: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate exam definition files
    Validate {
        /// Path to exam file or directory
        #[arg(long)]
        exam: PathBuf,
    },

    /// Compare two results files
    Compare {
        /// Earlier results JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Later results JSON
        #[arg(long)]
        current: PathBuf,

        /// Minimum change in percentage points to report
        #[arg(long, default_value = "5")]
        threshold: f64,

        /// Exit code 1 if any subject or skill declined
        #[arg(long)]
        fail_on_decline: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create starter config, example exam and example session
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("paes=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Score {
            exam,
            session,
            now,
            output,
            format,
            config,
        } => commands::score::execute(exam, session, now, output, format, config),
        Commands::Finish {
            session_ids,
            now,
            config,
        } => commands::finish::execute(session_ids, now, config).await,
        Commands::Validate { exam } => commands::validate::execute(exam),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_decline,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_decline, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use quizchain::config::Config;
use quizchain::server::{self, AppState};
use quizchain::session::Session;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "quizchain",
    about = "Headless quiz-chain solver",
    version,
    after_help = "Configuration comes from QUIZ_EMAIL, QUIZ_SECRET, QUIZ_TIME_BUDGET_SEC and QUIZ_CHROMIUM_PATH."
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP endpoint that accepts solve requests
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// Solve one quiz chain directly and print the result as JSON
    Solve {
        /// Starting page URL
        url: String,

        /// Wall-clock budget in seconds (defaults to QUIZ_TIME_BUDGET_SEC)
        #[arg(long)]
        budget_sec: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::from_env();

    match cli.command {
        Commands::Serve { port } => {
            tracing::info!("starting quizchain v{}", env!("CARGO_PKG_VERSION"));
            let state = Arc::new(AppState { config });
            server::start(port, state).await
        }
        Commands::Solve { url, budget_sec } => {
            let budget = budget_sec
                .map(Duration::from_secs)
                .unwrap_or(config.time_budget);
            let session = Session::new(config.email.clone(), config.secret.clone(), url, budget);
            let result = server::solve_session(&config, &session).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "quizchain=debug"
    } else {
        "quizchain=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();
}

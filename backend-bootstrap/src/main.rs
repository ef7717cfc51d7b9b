use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use backend_bootstrap::logging::{bootstrap_logging, init_logging};
use backend_infrastructure::{AppConfig, CONFIG_ENV};

#[derive(Parser, Debug)]
#[command(name = "landrec-backend")]
#[command(about = "Land records valuation and transaction anomaly service", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Fit the detector on a transaction history and list suspicious sales
    Detect {
        /// Transaction CSV, defaults to reference_data_path
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Number of suspicious rows to print
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Train the valuation model and write the artifact
    TrainValuation {
        /// Listing CSV, defaults to valuation_data_path
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Artifact path, defaults to valuation_model_path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var(CONFIG_ENV, config);
    }

    let config = {
        let _bootstrap = bootstrap_logging();
        AppConfig::load().await?
    };
    let _guard = init_logging(config.log_dir.as_deref());

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => backend_bootstrap::run_server(&config).await,
        Command::Detect { input, limit } => backend_bootstrap::run_detect(&config, input, limit).await,
        Command::TrainValuation { input, output } => {
            backend_bootstrap::run_train_valuation(&config, input, output).await
        }
    }
}

//! servelink CLI
//!
//! Command-line interface for issuing predictions against a
//! load-balanced model-serving backend.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// servelink - resilient client for model-serving gRPC backends
#[derive(Parser, Debug)]
#[command(name = "servelink")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Backend hostname
    #[arg(long, default_value = "localhost", global = true)]
    host: String,

    /// Backend port
    #[arg(long, default_value_t = 8500, global = true)]
    port: u16,

    /// Path to a TOML client configuration file (overrides host/port)
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Number of attempts before giving up
    #[arg(long, default_value_t = 3, global = true)]
    tries: u32,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Issue a prediction
    Predict {
        /// Input tensors as JSON, e.g. '{"a": [1.0, 2.0], "b": 3.0}'
        inputs: String,

        /// Model to query
        #[arg(long, default_value = "default")]
        model: String,

        /// Model signature name
        #[arg(long)]
        signature: Option<String>,

        /// Restrict the response to these output names
        #[arg(long)]
        output: Vec<String>,
    },

    /// List models loaded by the backend
    Models,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let client = commands::build_client(&cli.host, cli.port, cli.tries, cli.config.as_deref())
        .await?;

    match cli.command {
        Commands::Predict {
            inputs,
            model,
            signature,
            output,
        } => {
            commands::predict(&client, &inputs, model, signature, output).await?;
        }
        Commands::Models => {
            commands::models(&client).await?;
        }
    }

    Ok(())
}

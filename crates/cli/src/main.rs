//! Kaede CLI — the main entry point.
//!
//! Commands:
//! - `chat` — Interactive chat or single-message mode (the default)

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "kaede",
    about = "Kaede — a personal conversational agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the agent
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Chat { message }) => commands::chat::run(message).await?,
        None => commands::chat::run(None).await?,
    }

    Ok(())
}

//! DocChat CLI — the main entry point.
//!
//! Commands:
//! - `chat`     — Interactive or single-message chat, optionally about a PDF
//! - `serve`    — Start the HTTP API server
//! - `extract`  — Print the text of a PDF
//! - `models`   — Show supported and locally pulled models
//! - `onboard`  — Write the default config
//! - `doctor`   — Diagnose the setup

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "docchat",
    about = "DocChat — chat with local Ollama models about your PDFs",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with a local model
    Chat {
        /// Model to use instead of the configured default
        #[arg(long)]
        model: Option<String>,

        /// PDF to load before the first message
        #[arg(short, long)]
        document: Option<PathBuf>,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the extracted text of a PDF
    Extract {
        /// Path to the PDF
        path: PathBuf,
    },

    /// Show supported and locally available models
    Models,

    /// Write the default configuration
    Onboard,

    /// Diagnose configuration and Ollama connectivity
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat {
            model,
            document,
            message,
        } => commands::chat::run(model, document, message).await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Extract { path } => commands::extract::run(&path)?,
        Commands::Models => commands::models::run().await?,
        Commands::Onboard => commands::onboard::run()?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_chat_flags() {
        let cli = Cli::try_parse_from([
            "docchat", "chat", "--model", "llama3", "-d", "paper.pdf", "-m", "Summarize",
        ])
        .unwrap();
        match cli.command {
            Commands::Chat {
                model,
                document,
                message,
            } => {
                assert_eq!(model.as_deref(), Some("llama3"));
                assert_eq!(document, Some(PathBuf::from("paper.pdf")));
                assert_eq!(message.as_deref(), Some("Summarize"));
            }
            _ => panic!("expected chat"),
        }
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["docchat", "serve", "--port", "9000", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Serve { port: Some(9000) }));
    }
}

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use garcon::chat;
use garcon::gemini::SessionConfig;
use garcon::web_server;

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the Garçon web server.
    Serve {
        #[arg(long, default_value_t = 9900, help = "Port for the web server.")]
        port: u16,
    },
    /// Talk to Garçon in the terminal instead of the browser.
    Chat,
}

// The main entry point of the application, using tokio's async runtime
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for environment variables like API keys)
    dotenvy::dotenv().ok();

    // Initialize tracing (logging) subscriber
    // Reads log level from RUST_LOG environment variable (e.g., RUST_LOG=info,garcon=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Parse command-line arguments
    let cli = Cli::parse();

    info!("Garçon starting with command: {:?}", cli.command);

    // Both surfaces talk to the hosted model; without the credential there is
    // nothing useful to start.
    let api_key = std::env::var("GEMINI_API_KEY").context(
        "GEMINI_API_KEY is not set; export it or add it to a .env file before starting Garçon",
    )?;
    let session_config = SessionConfig::from_env(api_key);

    match cli.command {
        Commands::Serve { port } => {
            info!("Starting Garçon web server on port {}...", port);

            // Start the web server in a separate asynchronous task
            let mut web_server_handle = tokio::spawn(async move {
                if let Err(e) = web_server::start_web_server(port, session_config).await {
                    error!("Web server failed: {:?}", e);
                }
            });

            // Keep the main thread alive and wait for shutdown signals or task completion
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            tokio::select! {
                // Wait for Ctrl-C signal for graceful shutdown
                _ = &mut ctrl_c => {
                    info!("Ctrl-C received, initiating shutdown...");
                }
                // Handle potential completion/failure of the web server task
                res = &mut web_server_handle => {
                    match res {
                        Ok(_) => info!("Web server task completed unexpectedly."),
                        // Handle JoinError (e.g., if the task panicked)
                        Err(e) if e.is_panic() => error!("Web server task panicked: {:?}", e),
                        Err(e) => error!("Web server task failed: {:?}", e),
                    }
                }
            }

            if !web_server_handle.is_finished() {
                info!("Aborting web server task...");
                web_server_handle.abort();
            }
            info!("Shutdown complete.");
        }
        Commands::Chat => {
            chat::run_chat(session_config)
                .await
                .context("Chat session failed")?;
            info!("Chat session finished.");
        }
    }

    Ok(())
}

use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_kernel::settings::Settings;

/// Shelf book catalog service
#[derive(Debug, Parser)]
#[command(name = "shelf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Print the resolved configuration with secrets redacted
    Config,
    /// Recompute a book's review counter from its live reviews
    Reconcile {
        /// Id of the book to repair
        book_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load Shelf settings")?;

    match cli.command {
        Command::Serve => {
            shelf_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "shelf serve");
            shelf_app::run(settings).await
        }
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings.redacted())
                .context("failed to render settings")?;
            println!("{}", rendered);
            Ok(())
        }
        Command::Reconcile { book_id } => {
            shelf_telemetry::init(&settings.telemetry)?;
            let outcome = shelf_app::reconcile(settings, &book_id).await?;
            let rendered =
                serde_json::to_string_pretty(&outcome).context("failed to render outcome")?;
            println!("{}", rendered);
            Ok(())
        }
    }
}

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use libris_app::{
    modules::books::{models::NewBook, sample, validation},
    utils, App,
};
use libris_kernel::settings::{DatabaseSettings, Settings};

#[derive(Debug, Parser)]
#[command(name = "libris", version, about = "Library catalog service")]
struct Cli {
    /// Use an embedded in-memory database instead of the configured endpoint
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Apply pending schema migrations
    Migrate,
    /// Insert books from a JSON array file, or the built-in sample set
    Seed {
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().context("failed to load Libris settings")?;
    if cli.memory {
        settings.database = DatabaseSettings::in_memory();
    }
    libris_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => {
            let app = App::build(settings).await?;
            app.serve(libris_http::shutdown_signal()).await
        }
        Command::Migrate => {
            let app = App::build(settings).await?;
            // Building applies pending migrations, so a second pass lists what is recorded.
            let report = app.migrate().await?;
            for key in report.skipped.iter().chain(&report.applied) {
                println!("{key} up to date");
            }
            Ok(())
        }
        Command::Seed { file } => {
            let books = match file {
                Some(path) => read_books(&path)?,
                None => sample::sample_books(),
            };

            let app = App::build(settings).await?;
            let created = app
                .book_store()
                .insert_many(books)
                .await
                .context("failed to seed books")?;
            println!("{} books added", created.len());
            Ok(())
        }
        Command::Config => {
            if let Some(password) = settings.database.password.as_mut() {
                *password = "********".to_string();
            }
            println!("{settings:#?}");
            Ok(())
        }
    }
}

/// Parse and validate a seed file before any connection is opened
fn read_books(path: &Path) -> anyhow::Result<Vec<NewBook>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let entries: Vec<serde_json::Value> = serde_json::from_str(&raw)
        .with_context(|| format!("{} must contain a JSON array of books", path.display()))?;

    anyhow::ensure!(!entries.is_empty(), "{} contains no books", path.display());

    validation::validate_batch(entries, utils::current_year())
        .with_context(|| format!("invalid book in {}", path.display()))
}

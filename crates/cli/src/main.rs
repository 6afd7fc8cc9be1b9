mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mtgcard_core::{load_config_optional, validate_config, SqliteCardStore};

use cli::Args;

fn main() {
    // usage errors exit 1 like every other failure; help and version exit 0
    let args = Args::try_parse().unwrap_or_else(|e| {
        let code = if e.use_stderr() { 1 } else { 0 };
        let _ = e.print();
        std::process::exit(code)
    });

    if let Err(e) = run(args) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    // Initialize logging; stdout is reserved for cards
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config_optional(args.config.as_deref())
        .context("Failed to load configuration")?;
    validate_config(&config).context("Configuration validation failed")?;

    let db_path = args
        .db
        .clone()
        .unwrap_or_else(|| config.database.path.clone());
    debug!(path = %db_path.display(), "Using card database");
    let store = SqliteCardStore::open(&db_path).context("Failed to open card database")?;

    let output = match args.listing() {
        Some(listing) => commands::list(&store, &args, listing, &config)?,
        None => commands::show(&store, &args, &config)?,
    };
    if !output.is_empty() {
        println!("{output}");
    }

    Ok(())
}

mod advisor;
mod cli;
mod error;
mod fmt;
mod importer;
mod models;
mod reports;
mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    // .env is a convenience for local runs; real env vars win.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Summary { analysis } => cli::summary::run(analysis),
        Commands::Advise {
            analysis,
            context,
            max_attempts,
            backoff_secs,
        } => cli::advise::run(analysis, context, max_attempts, backoff_secs),
        Commands::Preview { file, limit } => cli::preview::run(file, limit),
        Commands::Session { file } => cli::session::run(file),
        Commands::Init {
            default_file,
            max_attempts,
            backoff_secs,
            summary_rows,
            income,
        } => cli::init::run(default_file, max_attempts, backoff_secs, summary_rows, income),
        Commands::Config => cli::config::run(),
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

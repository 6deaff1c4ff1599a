pub mod advise;
pub mod config;
pub mod init;
pub mod preview;
pub mod session;
pub mod summary;

use clap::{Args, Parser, Subcommand};

use crate::models::Transaction;
use crate::reports::{build_summary_text, limit_rows, summarize, SpendingSummary};
use crate::settings::Settings;

#[derive(Parser)]
#[command(
    name = "upi-advisor",
    version,
    about = "Summarise UPI spending and ask an LLM for budgeting advice."
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print spending aggregates and the summary digest.
    Summary {
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Summarise spending and ask the advice service for recommendations.
    Advise {
        #[command(flatten)]
        analysis: AnalysisArgs,
        /// Extra free-text context passed along with the summary
        #[arg(long)]
        context: Option<String>,
        /// Total attempts against the advice service (default from settings)
        #[arg(long = "max-attempts")]
        max_attempts: Option<u32>,
        /// Seconds to wait between attempts (default from settings)
        #[arg(long = "backoff-secs")]
        backoff_secs: Option<u64>,
    },
    /// Show the first rows of a transactions file.
    Preview {
        /// Path to the transactions CSV (default: settings.default_file)
        file: Option<String>,
        /// Number of rows to show
        #[arg(long, default_value = "5")]
        limit: usize,
    },
    /// Interactive menu: summary, advice, preview and reload in one session.
    Session {
        /// Path to the transactions CSV (default: settings.default_file)
        file: Option<String>,
    },
    /// Write settings (default file, retry budget) to the config directory.
    Init {
        /// Transactions file to use when none is given
        #[arg(long = "default-file")]
        default_file: Option<String>,
        /// Total attempts against the advice service
        #[arg(long = "max-attempts")]
        max_attempts: Option<u32>,
        /// Seconds to wait between attempts
        #[arg(long = "backoff-secs")]
        backoff_secs: Option<u64>,
        /// Summarise only the first N rows
        #[arg(long = "summary-rows")]
        summary_rows: Option<usize>,
        /// Monthly income used for the 50/30/20 split
        #[arg(long)]
        income: Option<f64>,
    },
    /// Show effective settings and whether a credential is available.
    Config,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AnalysisArgs {
    /// Path to the transactions CSV (default: settings.default_file)
    pub file: Option<String>,
    /// Monthly income; adds a 50/30/20 budget split when positive
    #[arg(long)]
    pub income: Option<f64>,
    /// Summarise only the first N rows
    #[arg(long)]
    pub rows: Option<usize>,
    /// Number of categories listed in the digest
    #[arg(long)]
    pub top: Option<usize>,
}

/// Analysis knobs after merging CLI flags over settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    pub income: Option<f64>,
    pub rows: Option<usize>,
    pub top: usize,
}

impl AnalysisOptions {
    pub fn resolve(args: &AnalysisArgs, settings: &Settings) -> Self {
        Self {
            income: args.income.or(settings.monthly_income),
            rows: args.rows.or(settings.summary_rows),
            top: args.top.unwrap_or(settings.top_categories),
        }
    }
}

pub struct Analysis {
    pub summary: SpendingSummary,
    pub digest: String,
}

pub(crate) fn analyse(transactions: &[Transaction], opts: &AnalysisOptions) -> Analysis {
    let rows = limit_rows(transactions, opts.rows);
    if rows.len() < transactions.len() {
        tracing::info!(
            used = rows.len(),
            available = transactions.len(),
            "summarising a subset of rows"
        );
    }
    let summary = summarize(rows, opts.income);
    let digest = build_summary_text(&summary, opts.top);
    Analysis { summary, digest }
}

use colored::Colorize;
use dialoguer::{Input, Select};

use crate::cli::advise::{build_client, print_advice};
use crate::cli::summary::print_analysis;
use crate::cli::{analyse, preview, AnalysisArgs, AnalysisOptions};
use crate::error::Result;
use crate::importer::DatasetCache;
use crate::settings::{load_settings, resolve_input};

const MENU: &[&str] = &[
    "Show spending summary",
    "Generate recommendations",
    "Preview rows",
    "Set monthly income",
    "Reload file",
    "Quit",
];

/// Parse the income prompt: a positive number sets the income, zero or a
/// negative number clears it.
pub(crate) fn parse_income(raw: &str) -> std::result::Result<Option<f64>, String> {
    let raw = raw.trim();
    match raw.parse::<f64>() {
        Ok(v) if !v.is_finite() => Err(format!("{raw:?} is not a finite number")),
        Ok(v) if v > 0.0 => Ok(Some(v)),
        Ok(_) => Ok(None),
        Err(e) => Err(format!("{raw:?}: {e}")),
    }
}

fn prompt_text(prompt: &str, default: &str) -> Option<String> {
    match Input::<String>::new()
        .with_prompt(prompt)
        .default(default.to_string())
        .allow_empty(true)
        .interact_text()
    {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::warn!(error = %e, prompt, "prompt failed");
            None
        }
    }
}

pub fn run(file: Option<String>) -> Result<()> {
    let settings = load_settings();
    let client = build_client(&settings, None, None)?;
    let path = resolve_input(file.as_deref(), &settings)?;
    let mut opts = AnalysisOptions::resolve(&AnalysisArgs::default(), &settings);
    let mut cache = DatasetCache::new();

    println!("{} {}", "Transactions:".bold(), path.display());

    loop {
        let choice = match Select::new()
            .with_prompt("What next?")
            .items(MENU)
            .default(0)
            .interact_opt()
        {
            Ok(Some(choice)) => choice,
            Ok(None) => return Ok(()),
            Err(e) => {
                tracing::error!(error = %e, "menu unavailable, ending session");
                return Err(std::io::Error::other(e.to_string()).into());
            }
        };

        // Every action re-validates the file; unchanged content is served from the cache.
        let outcome = match choice {
            0 => cache.load(&path).map(|ds| {
                print_analysis(&analyse(&ds.transactions, &opts));
            }),
            1 => cache.load(&path).map(|ds| {
                let analysis = analyse(&ds.transactions, &opts);
                print_analysis(&analysis);
                let context =
                    prompt_text("Extra context for the advisor (Enter to skip)", "")
                        .unwrap_or_default();
                println!();
                let context = Some(context.as_str()).filter(|c| !c.trim().is_empty());
                print_advice(&client, &analysis.digest, context);
            }),
            2 => cache.load(&path).map(|ds| {
                println!("{}", preview::render(&ds.transactions, 5));
            }),
            3 => {
                if let Some(raw) = prompt_text("Monthly income (0 to clear)", "0") {
                    match parse_income(&raw) {
                        Ok(income) => opts.income = income,
                        Err(msg) => {
                            tracing::warn!(input = %msg, "rejected income");
                            println!("{}", "Not a number, income unchanged.".red());
                        }
                    }
                }
                Ok(())
            }
            4 => {
                cache.invalidate(&path);
                cache.load(&path).map(|ds| {
                    println!(
                        "Reloaded {} transactions from {}.",
                        ds.transactions.len(),
                        ds.path.display()
                    );
                    tracing::debug!(parses = cache.parse_count(), "dataset reloaded");
                })
            }
            _ => return Ok(()),
        };

        // A bad file aborts the action, not the session.
        if let Err(e) = outcome {
            tracing::error!(error = %e, "session action failed");
            println!("{} {e}", "Error:".red().bold());
        }
        println!();
    }
}

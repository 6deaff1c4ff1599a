use std::time::Duration;

use colored::Colorize;

use crate::advisor::{AdviceClient, GeminiClient, RetryPolicy};
use crate::cli::summary::print_analysis;
use crate::cli::{analyse, AnalysisArgs, AnalysisOptions};
use crate::error::Result;
use crate::importer::load_file;
use crate::settings::{advice_config_from_env, load_settings, resolve_input, Settings};

const WRAP_WIDTH: usize = 88;

pub fn run(
    args: AnalysisArgs,
    context: Option<String>,
    max_attempts: Option<u32>,
    backoff_secs: Option<u64>,
) -> Result<()> {
    let settings = load_settings();
    // Credential problems surface before any work is done.
    let client = build_client(&settings, max_attempts, backoff_secs)?;

    let path = resolve_input(args.file.as_deref(), &settings)?;
    let opts = AnalysisOptions::resolve(&args, &settings);
    let dataset = load_file(&path)?;
    let analysis = analyse(&dataset.transactions, &opts);
    print_analysis(&analysis);

    println!();
    print_advice(&client, &analysis.digest, context.as_deref());
    Ok(())
}

pub(crate) fn policy_with_overrides(
    settings: &Settings,
    max_attempts: Option<u32>,
    backoff_secs: Option<u64>,
) -> RetryPolicy {
    let mut policy = settings.retry_policy();
    if let Some(n) = max_attempts {
        policy.max_attempts = n;
    }
    if let Some(s) = backoff_secs {
        policy.backoff = Duration::from_secs(s);
    }
    policy
}

pub(crate) fn build_client(
    settings: &Settings,
    max_attempts: Option<u32>,
    backoff_secs: Option<u64>,
) -> Result<AdviceClient> {
    let config = advice_config_from_env(settings)?;
    tracing::info!(model = %config.model, "advice service configured");
    let model = GeminiClient::new(config)?;
    let client = AdviceClient::new(
        Box::new(model),
        policy_with_overrides(settings, max_attempts, backoff_secs),
    );
    let policy = client.policy();
    tracing::debug!(
        max_attempts = policy.max_attempts,
        backoff_secs = policy.backoff.as_secs(),
        "retry policy"
    );
    Ok(client)
}

pub(crate) fn print_advice(client: &AdviceClient, digest: &str, context: Option<&str>) {
    println!("{}", "Generating financial advice...".dimmed());
    let advice = client.generate_recommendations(digest, context);
    println!("{}", "Financial Advice".bold());
    for line in advice.lines() {
        if line.trim().is_empty() {
            println!();
            continue;
        }
        let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
        let options = textwrap::Options::new(WRAP_WIDTH).subsequent_indent(&indent);
        println!("{}", textwrap::fill(line, options));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_overrides() {
        let settings = Settings::default();
        let p = policy_with_overrides(&settings, None, None);
        assert_eq!(p, RetryPolicy::default());
        let p = policy_with_overrides(&settings, Some(5), Some(1));
        assert_eq!(p.max_attempts, 5);
        assert_eq!(p.backoff, Duration::from_secs(1));
    }
}

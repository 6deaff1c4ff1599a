use crate::error::Result;
use crate::fmt::money;
use crate::settings::{
    advice_config_from_env, load_settings, settings_path, API_KEY_VAR, MODEL_VAR,
};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let path = settings_path();

    println!(
        "Settings file:   {}{}",
        path.display(),
        if path.exists() { "" } else { " (not created, using defaults)" }
    );
    println!(
        "Default file:    {}",
        settings.default_file.as_deref().unwrap_or("(not set)")
    );
    println!("Max attempts:    {}", settings.max_attempts);
    println!("Backoff:         {}s", settings.backoff_secs);
    println!(
        "Summary rows:    {}",
        settings
            .summary_rows
            .map(|n| n.to_string())
            .unwrap_or_else(|| "all".to_string())
    );
    println!("Top categories:  {}", settings.top_categories);
    println!(
        "Monthly income:  {}",
        settings
            .monthly_income
            .map(money)
            .unwrap_or_else(|| "(not set)".to_string())
    );
    println!("Request timeout: {}s", settings.request_timeout_secs);

    println!();
    match advice_config_from_env(&settings) {
        Ok(cfg) => {
            println!("{API_KEY_VAR}:  set");
            println!("Model:           {} ({MODEL_VAR})", cfg.model);
            println!("Endpoint:        {}", cfg.base_url);
        }
        Err(e) => println!("{API_KEY_VAR}:  missing ({e})"),
    }
    Ok(())
}

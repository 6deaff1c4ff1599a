use crate::error::{AdvisorError, Result};
use crate::settings::{load_settings, save_settings, settings_path, shellexpand_path};

pub fn run(
    default_file: Option<String>,
    max_attempts: Option<u32>,
    backoff_secs: Option<u64>,
    summary_rows: Option<usize>,
    income: Option<f64>,
) -> Result<()> {
    let mut settings = load_settings();

    if let Some(file) = default_file {
        let resolved = shellexpand_path(&file);
        if !std::path::Path::new(&resolved).exists() {
            tracing::warn!(path = %resolved, "default file does not exist yet");
        }
        settings.default_file = Some(resolved);
    }
    if let Some(n) = max_attempts {
        if n == 0 {
            return Err(AdvisorError::Settings(
                "--max-attempts must be at least 1".to_string(),
            ));
        }
        settings.max_attempts = n;
    }
    if let Some(s) = backoff_secs {
        settings.backoff_secs = s;
    }
    if let Some(rows) = summary_rows {
        settings.summary_rows = Some(rows);
    }
    if let Some(i) = income {
        settings.monthly_income = Some(i).filter(|v| *v > 0.0);
    }

    save_settings(&settings)?;
    println!("Saved settings to {}", settings_path().display());
    Ok(())
}

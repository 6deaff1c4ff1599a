use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Missing columns in data: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Invalid row at line {line}: {message}")]
    InvalidRow { line: u64, message: String },

    #[error("GEMINI_API_KEY is not set (export it or add it to a .env file)")]
    MissingApiKey,

    #[error("No transactions file given and no default_file configured (run `upi-advisor init --default-file <path>`)")]
    NoInputFile,

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, AdvisorError>;

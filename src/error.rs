use thiserror::Error;

#[derive(Error, Debug)]
pub enum LohnkostenError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No period found in first line (expected e.g. 'Jan 26' or '01.2026'): {0}")]
    PeriodNotFound(String),

    #[error("No suitable CSV format (best confidence {best:.2}, need {min:.2})")]
    NoSuitableFormat { best: f64, min: f64 },

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, LohnkostenError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fixture error: {0}")]
    Fixture(String),
}

impl From<csv::Error> for HarnessError {
    fn from(e: csv::Error) -> Self {
        HarnessError::CsvParse(e.to_string())
    }
}

impl From<calamine::XlsxError> for HarnessError {
    fn from(e: calamine::XlsxError) -> Self {
        HarnessError::Workbook(e.to_string())
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;

/// Cut `s` down to at most `max` characters for inclusion in a message.
pub fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinalsError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed source: {0}")]
    MalformedSource(String),

    #[error("Insufficient data: table has {rows} rows, expected at least 2")]
    InsufficientData { rows: usize },

    #[error("Duplicate pairing after merge: {0}")]
    DuplicatePairing(String),

    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Fetching {url} returned status {status}")]
    Fetch { url: String, status: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl FinalsError {
    /// Whether the caller may retry, either with different input or later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FinalsError::NotFound(_) | FinalsError::Http(_) | FinalsError::Fetch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FinalsError>;

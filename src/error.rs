use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovdeltaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed report JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {metric} counter for '{path}': {covered} covered out of {total}")]
    InvalidCounter {
        path: String,
        metric: &'static str,
        covered: u64,
        total: u64,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Template error: {0}")]
    Template(String),
}

pub type Result<T> = std::result::Result<T, CovdeltaError>;

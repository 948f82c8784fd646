//! Custom error types for the trading agent
//!
//! Provides structured, typed errors instead of generic Box<dyn Error>

use thiserror::Error;

/// Errors that abort a single ticker's turn.
///
/// The monitoring loop catches these at the per-ticker boundary; none of them
/// stops the loop.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("{stage} timed out after {secs}s")]
    Timeout { stage: &'static str, secs: u64 },
}

/// Market data provider errors
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("Unexpected response: {0}")]
    Unexpected(String),
}

/// Analysis subsystem errors
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("LLM request failed: {0}")]
    Llm(#[from] async_openai::error::OpenAIError),

    #[error("LLM returned no choices")]
    EmptyResponse,
}

/// Brokerage / budget ledger errors
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed ledger data: {0}")]
    Malformed(String),

    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Malformed(err.to_string())
    }
}

/// Configuration errors (start-up only)
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config.yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to encode policy: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing configuration: {0}")]
    Missing(String),

    #[error("Ledger initialisation failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Market data client initialisation failed: {0}")]
    MarketData(#[from] MarketDataError),
}

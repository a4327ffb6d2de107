use thiserror::Error;

/// Recoverable per-venue failures. Caught at the aggregator boundary and
/// turned into `SourceFailure` values; they never abort a pass.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unexpected data from exchange: {0}")]
    UnexpectedData(String),
}

/// Fatal misconfiguration. Surfaced immediately; the process exits non-zero.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown exchange: {0}")]
    UnknownExchange(String),

    #[error("no exchanges selected")]
    EmptySelection,

    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

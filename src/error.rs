use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Why a single history table row was skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("row has {0} cells, need at least 2")]
    MissingCells(usize),

    #[error("bad timestamp {0:?}")]
    Timestamp(String),

    #[error("bad price {0:?}")]
    Price(String),
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Market data error: {0}")]
    MarketData(String),

    #[error("News data error: {0}")]
    NewsData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

//! Market data error types

use thiserror::Error;

/// Errors that can occur during market data operations
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Provider returned something unusable
    #[error("Provider error: {0}")]
    Provider(String),

    /// Invalid symbol
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Data not available
    #[error("Data not available: {0}")]
    DataNotAvailable(String),

    /// Fixture could not be read or parsed
    #[error("Fixture error: {0}")]
    Fixture(String),
}

impl MarketDataError {
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    pub fn not_available(msg: impl Into<String>) -> Self {
        Self::DataNotAvailable(msg.into())
    }
}

impl From<reqwest::Error> for MarketDataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Provider(format!("Failed to decode response: {}", err))
        } else {
            Self::Connection(err.to_string())
        }
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("The HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Binance returned error {0}: {1}")]
    BinanceError(i64, String),

    #[error("The API request returned status {0}: {1}")]
    Status(u16, String),

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),
}

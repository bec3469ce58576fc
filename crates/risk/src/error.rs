use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    #[error("No risk grid is loaded for symbol '{0}'.")]
    GridMissing(String),

    #[error("Risk grid for '{symbol}' is invalid: {reason}")]
    InvalidGrid { symbol: String, reason: String },
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Price source error: {0}")]
    Api(#[from] api_client::error::ApiError),

    #[error("Price for '{symbol}' is unavailable: {reason}")]
    PriceUnavailable { symbol: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] database::DbError),

    #[error("Risk grid error: {0}")]
    Risk(#[from] risk::RiskError),

    #[error("Analytics error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),

    #[error("Symbol '{0}' is not tracked.")]
    NotTracked(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl EngineError {
    /// True when the error means "this symbol is unknown here" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::NotTracked(_)
                | EngineError::Risk(risk::RiskError::GridMissing(_))
                | EngineError::Database(database::DbError::UnknownSymbol(_))
        )
    }
}

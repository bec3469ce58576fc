use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not set up logging: {0}")]
    Logging(String),
}

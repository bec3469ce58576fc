use crate::error::ConfigError;
use std::collections::HashSet;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    Config, DaysBasis, Logging, PriceSource, Schedule, Server, TrackedAsset, Tracking,
};

/// Loads the application configuration from the `config.toml` file.
///
/// This function is the primary entry point for this crate. It reads the configuration file,
/// layers `RISKBAND__SECTION__KEY` environment variables on top, deserializes the result
/// into our strongly-typed `Config` struct and validates it.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from("config.toml")
}

/// Same as [`load_config`], reading from an explicit path. The file is optional:
/// a missing file yields the defaults plus whatever the environment provides.
pub fn load_config_from(path: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix("RISKBAND")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;

    Ok(config)
}

/// Checks the invariants serde cannot express.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.price_source.timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "price_source.timeout_secs must be greater than 0".to_string(),
        ));
    }
    if config.logging.file_prefix.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "logging.file_prefix must not be empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for asset in &config.tracking.assets {
        if asset.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "tracking.assets contains an empty symbol".to_string(),
            ));
        }
        if !seen.insert(asset.symbol.to_ascii_uppercase()) {
            return Err(ConfigError::Invalid(format!(
                "tracking.assets lists {} more than once",
                asset.symbol
            )));
        }
    }

    Ok(())
}

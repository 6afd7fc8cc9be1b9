use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Currency rate is finite and positive
/// - Currency label is not empty
/// - Database path is not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let rate = config.display.usd_to_currency_rate;
    if !rate.is_finite() || rate <= 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "display.usd_to_currency_rate must be a positive number, got {rate}"
        )));
    }

    if config.display.currency.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "display.currency cannot be empty".to_string(),
        ));
    }

    if config.database.path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "database.path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

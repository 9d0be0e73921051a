//! Loading and validating [`EngineConfig`] from TOML.

use std::path::Path;

use chile_dashboard_bubbles_models::EngineConfig;

/// Errors that can occur while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML or has wrongly typed values.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The values parse but cannot be used.
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        message: message.into(),
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Checks that `config` describes a usable engine.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] naming the first offending value.
pub fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
    let layout = &config.layout;
    if !positive(layout.container_width) || !positive(layout.container_height) {
        return Err(invalid(format!(
            "container size {}x{} must be positive",
            layout.container_width, layout.container_height
        )));
    }
    if layout.row_count == 0 {
        return Err(invalid("layout.row_count must be at least 1"));
    }
    if !positive(layout.min_cell_size) {
        return Err(invalid("layout.min_cell_size must be positive"));
    }
    if [layout.padding_x, layout.padding_y, layout.gap_x, layout.gap_y]
        .iter()
        .any(|v| !v.is_finite() || *v < 0.0)
    {
        return Err(invalid("layout padding and gaps must not be negative"));
    }

    if !positive(config.radius.fallback) {
        return Err(invalid("radius.fallback must be positive"));
    }
    if !positive(config.radius.min_floor) || config.radius.min_delta < 0.0 {
        return Err(invalid(
            "radius.min_floor must be positive and radius.min_delta not negative",
        ));
    }

    let border = &config.border;
    if !border.min_width.is_finite()
        || !border.max_width.is_finite()
        || border.min_width < 0.0
        || border.min_width > border.max_width
    {
        return Err(invalid(format!(
            "border widths [{}, {}] must be an ascending, non-negative range",
            border.min_width, border.max_width
        )));
    }
    if !border.fallback.is_finite() || border.fallback < 0.0 {
        return Err(invalid("border.fallback must not be negative"));
    }

    if config.color.stops.len() < 2 {
        return Err(invalid("color.stops needs at least two colors"));
    }
    let [lo, hi] = config.color.fallback_domain;
    if !(lo.is_finite() && hi.is_finite() && lo < hi) {
        return Err(invalid(format!(
            "color.fallback_domain [{lo}, {hi}] must be ascending"
        )));
    }

    Ok(())
}

/// Parses and validates a configuration from a TOML string.
///
/// Missing sections and keys take their default values.
///
/// # Errors
///
/// Returns [`ConfigError::Toml`] for malformed TOML and
/// [`ConfigError::Invalid`] for unusable values.
pub fn parse_config(toml_str: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::de::from_str(toml_str)?;
    validate_config(&config)?;
    Ok(config)
}

/// Reads, parses and validates a configuration file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
/// [`parse_config`].
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    log::debug!("Loading engine config from {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

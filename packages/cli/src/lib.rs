#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Controller and command line front end of the Chile regional dashboard.
//!
//! The [`controller::Controller`] ties a loaded dataset to the bubble
//! engine; the `chile_dashboard` binary drives it either through
//! subcommands or through the [`interactive`] menu.

pub mod controller;
pub mod interactive;

use std::path::Path;

use chile_dashboard_bubbles::config::load_config;
use chile_dashboard_bubbles_models::EngineConfig;
use chile_dashboard_dataset::{DEFAULT_DATA_PATH, DatasetSource};

/// Environment variable consulted when `--data` is not given.
pub const DATA_ENV: &str = "CHILE_DASHBOARD_DATA";

/// Picks the dataset location: the explicit argument, then
/// [`DATA_ENV`], then [`DEFAULT_DATA_PATH`].
#[must_use]
pub fn resolve_data_source(explicit: Option<&str>) -> DatasetSource {
    let location = explicit.map_or_else(
        || std::env::var(DATA_ENV).unwrap_or_else(|_| DEFAULT_DATA_PATH.to_owned()),
        str::to_owned,
    );
    DatasetSource::parse(&location)
}

/// Loads the engine configuration, or the defaults when no file is given.
///
/// # Errors
///
/// Returns a [`chile_dashboard_bubbles::ConfigError`] if the file cannot be
/// read, parsed or validated.
pub fn engine_config(
    path: Option<&Path>,
) -> Result<EngineConfig, chile_dashboard_bubbles::ConfigError> {
    path.map_or_else(|| Ok(EngineConfig::default()), load_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_location_wins() {
        assert_eq!(
            resolve_data_source(Some("https://example.org/series.json")),
            DatasetSource::Url("https://example.org/series.json".to_owned())
        );
        assert_eq!(
            resolve_data_source(Some("local.json")),
            DatasetSource::Path("local.json".into())
        );
    }

    #[test]
    fn no_config_file_means_defaults() {
        assert_eq!(engine_config(None).unwrap(), EngineConfig::default());
    }
}

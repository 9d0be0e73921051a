#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Chile regional dashboard from the command line.
//!
//! ```text
//! chile_dashboard years
//! chile_dashboard render --year 2023 --sort vif [--width 1600 --height 900]
//! chile_dashboard legend --year 2023
//! chile_dashboard detail --year 2023 --region Maule
//! ```
//!
//! Running `chile_dashboard` with no subcommand enters interactive mode.
//! `--data` accepts a file path or an `http(s)://` URL and defaults to
//! `$CHILE_DASHBOARD_DATA`, then `data/series.json`.

use std::path::PathBuf;

use chile_dashboard_cli::controller::Controller;
use chile_dashboard_cli::{engine_config, interactive, resolve_data_source};
use chile_dashboard_dataset_models::{SortKey, Year};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "chile_dashboard",
    about = "Bubble grid of Chilean regional statistics"
)]
struct Cli {
    /// Dataset file path or URL
    #[arg(long, global = true)]
    data: Option<String>,

    /// Engine configuration (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the years in the dataset
    Years,
    /// Print the render frame of a year as JSON
    Render {
        /// Year to render (defaults to the latest)
        #[arg(long)]
        year: Option<Year>,
        /// Sort key: satisfaction, vif or crime
        #[arg(long, default_value = "satisfaction")]
        sort: SortKey,
        /// Container width in pixels
        #[arg(long, requires = "height")]
        width: Option<f64>,
        /// Container height in pixels
        #[arg(long, requires = "width")]
        height: Option<f64>,
        /// Render the first year of a first/last comparison
        #[arg(long)]
        compare: bool,
    },
    /// Print the legends of a year as JSON
    Legend {
        /// Year (defaults to the latest)
        #[arg(long)]
        year: Option<Year>,
    },
    /// Show the detail panel of a region
    Detail {
        /// Year (defaults to the latest)
        #[arg(long)]
        year: Option<Year>,
        /// Region name
        #[arg(long)]
        region: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let config = engine_config(cli.config.as_deref())?;
    let source = resolve_data_source(cli.data.as_deref());

    let Some(command) = cli.command else {
        return interactive::run(source, config).await;
    };

    let dataset = match source.load().await {
        Ok(dataset) => dataset,
        Err(e) => {
            eprintln!("No se pudieron cargar los datos desde {source}: {e}");
            std::process::exit(1);
        }
    };
    log::info!("Loaded {} years from {source}", dataset.years.len());

    let mut controller = Controller::new(config, dataset)?;

    match command {
        Commands::Years => {
            let dataset = controller.dataset();
            for year in &dataset.years {
                println!("{year}\t{} regions", dataset.rows_for(*year).len());
            }
        }
        Commands::Render {
            year,
            sort,
            width,
            height,
            compare,
        } => {
            if let (Some(width), Some(height)) = (width, height) {
                controller.resize(width, height)?;
            }
            if let Some(year) = year {
                controller.select_year(year)?;
            }
            if compare {
                controller.compare()?;
            }
            let view = controller.set_sort(sort)?;
            println!("{}", serde_json::to_string_pretty(&view.frame)?);
        }
        Commands::Legend { year } => {
            let view = match year {
                Some(year) => controller.select_year(year)?,
                None => controller.refresh()?,
            };
            println!("{}", serde_json::to_string_pretty(&view.frame.legend)?);
        }
        Commands::Detail { year, region } => {
            if let Some(year) = year {
                controller.select_year(year)?;
            }
            if let Some(detail) = controller.open_detail(&region) {
                println!("{detail}");
            } else {
                eprintln!(
                    "Region not found in {}: {region}",
                    controller.mode().bubble_year()
                );
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn render_size_needs_both_sides() {
        for args in [
            ["chile_dashboard", "render", "--width", "1600"],
            ["chile_dashboard", "render", "--height", "900"],
        ] {
            let err = Cli::try_parse_from(args).err().unwrap();
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        }

        let cli = Cli::try_parse_from([
            "chile_dashboard",
            "render",
            "--width",
            "1600",
            "--height",
            "900",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Render {
                width: Some(_),
                height: Some(_),
                ..
            })
        ));
    }
}

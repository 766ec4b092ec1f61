#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `statline`: explore regional population and crime statistics.
//!
//! Subcommands print JSON bundles or aligned text listings. Without a
//! subcommand an interactive `dialoguer` menu is shown.
//!
//! Uses `indicatif-log-bridge` (via [`statline_cli_utils::init_logger`])
//! so that log lines and dataset progress bars never fight for the
//! terminal.

mod interactive;
mod output;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use statline_cli_utils::{IndicatifProgress, MultiProgress};
use statline_query::QueryFacade;
use statline_query::config::{config_path, load_config};
use statline_query_models::YearSelection;
use statline_region_models::{RegionLevel, RegionSummary};

#[derive(Parser)]
#[command(
    name = "statline",
    about = "Regional population and crime statistics explorer"
)]
struct Cli {
    /// Path to the configuration file (overrides the `STATLINE_CONFIG` env var)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the statistics bundle for a region
    Query {
        /// Region code (e.g., "GM0363", "PV27", "NL01")
        code: String,
        /// Single year to report
        #[arg(long, conflicts_with_all = ["from", "to"])]
        year: Option<i32>,
        /// First year of a range
        #[arg(long, requires = "to")]
        from: Option<i32>,
        /// Last year of a range
        #[arg(long, requires = "from")]
        to: Option<i32>,
        /// Print a text summary instead of JSON
        #[arg(long)]
        summary: bool,
    },
    /// Search region names (case-insensitive substring)
    Search {
        /// Text to look for
        text: String,
        /// Maximum number of suggestions
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// List regions
    Regions {
        /// Restrict to one level (e.g., "MUNICIPALITY", "province", "COROP")
        #[arg(long, value_parser = parse_level)]
        level: Option<RegionLevel>,
        /// Restrict to regions under this code
        #[arg(long)]
        parent: Option<String>,
    },
    /// Load every configured file and report what was loaded
    Validate,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = statline_cli_utils::init_logger();
    let cli = Cli::parse();
    let config = config_path(cli.config.as_deref());

    let Some(command) = cli.command else {
        return interactive::run(&multi, &config);
    };

    let facade = load_facade(&multi, &config)?;

    match command {
        Commands::Query {
            code,
            year,
            from,
            to,
            summary,
        } => {
            let selection = match (year, from, to) {
                (Some(year), _, _) => YearSelection::Single { year },
                (None, Some(start), Some(end)) => YearSelection::Range { start, end },
                _ => return Err("Specify either --year or both --from and --to".into()),
            };
            let bundle = facade.query(&code, selection)?;
            if summary {
                output::print_bundle_summary(&bundle);
            } else {
                println!("{}", serde_json::to_string_pretty(&bundle)?);
            }
        }
        Commands::Search { text, limit } => {
            let matches = facade.search(&text, limit);
            if matches.is_empty() {
                println!("No regions match '{text}'.");
            } else {
                output::print_regions(matches.iter().map(RegionSummary::from));
            }
        }
        Commands::Regions { level, parent } => {
            let regions = facade.regions(level, parent.as_deref())?;
            output::print_regions(regions);
        }
        Commands::Validate => output::print_validation(&facade),
    }

    Ok(())
}

fn parse_level(raw: &str) -> Result<RegionLevel, String> {
    raw.parse().map_err(|_| {
        let levels: Vec<&str> = RegionLevel::all().iter().map(AsRef::as_ref).collect();
        format!("unknown level '{raw}', expected one of {}", levels.join(", "))
    })
}

/// Loads the configuration and every configured dataset, with one
/// progress bar per dataset.
pub(crate) fn load_facade(
    multi: &MultiProgress,
    config: &Path,
) -> Result<QueryFacade, Box<dyn std::error::Error>> {
    log::debug!("Using configuration {}", config.display());
    let config = load_config(config)?;
    let facade = QueryFacade::from_config(&config, |kind| {
        IndicatifProgress::records_bar(multi, &format!("Loading {kind}"))
    })?;
    Ok(facade)
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the site map explorer.
//!
//! Loads the reference layers named by the config file once, then lists
//! catalogued sites, analyzes single clicks, or runs an interactive click
//! session. Uses `indicatif-log-bridge` (via
//! [`site_map_cli_utils::init_logger`]) so log lines and the loading bar
//! never fight for the terminal.

mod output;
mod session;

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use site_map_analytics::Cluster;
use site_map_analytics_models::ProximityTier;
use site_map_cli_utils::IndicatifProgress;
use site_map_geometry::GeoPoint;
use site_map_source::{load_config, load_dataset, resolve_config_path};

#[derive(Parser)]
#[command(name = "site_map", about = "Candidate site explorer and click analyzer")]
struct Cli {
    /// Path to the TOML config. Defaults to `site_map.toml` in the working
    /// directory.
    #[arg(long, global = true, env = "SITE_MAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalogued sites
    Sites {
        /// Comma-separated cluster labels to show (e.g. "1,3"). All
        /// clusters when omitted.
        #[arg(long, value_delimiter = ',', value_parser = parse_cluster)]
        clusters: Vec<Cluster>,
        /// Only sites with at least MIN calls within RADIUS meters, written
        /// as RADIUS:MIN (e.g. "1000:25")
        #[arg(long, value_parser = parse_min_count)]
        min_count: Option<MinCount>,
    },
    /// Show one site's stored analytics
    Site {
        /// Site identifier as listed by `sites`
        id: usize,
    },
    /// Analyze a single clicked coordinate
    Analyze {
        /// Latitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show per-cluster site counts and layer sizes
    Summary,
    /// Interactively analyze clicks one after another
    Session,
}

/// A `RADIUS:MIN` site filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MinCount {
    tier: ProximityTier,
    min: u64,
}

fn parse_cluster(value: &str) -> Result<Cluster, String> {
    Cluster::from_str(value.trim())
        .map_err(|_| format!("cluster must be one of 1, 2 or 3, got '{value}'"))
}

fn parse_min_count(value: &str) -> Result<MinCount, String> {
    let (radius, min) = value
        .split_once(':')
        .ok_or_else(|| format!("expected RADIUS:MIN, got '{value}'"))?;

    let tier = ProximityTier::from_str(radius.trim()).map_err(|_| {
        format!("radius must be one of 500, 1000, 2000 or 3000, got '{radius}'")
    })?;
    let min = min
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid minimum count '{min}': {e}"))?;

    Ok(MinCount { tier, min })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = site_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_deref());
    let config = load_config(&config_path)?;

    let progress = IndicatifProgress::steps_bar(&multi, "Loading layers");
    let dataset = load_dataset(&config, &progress)?;

    match cli.command.unwrap_or(Commands::Session) {
        Commands::Sites {
            clusters,
            min_count,
        } => {
            let sites = dataset.catalog.filter_by_clusters(&clusters).filter(|site| {
                min_count.is_none_or(|filter| site.features.count(filter.tier) >= filter.min)
            });
            output::print_site_table(sites);
        }
        Commands::Site { id } => {
            let site = dataset
                .catalog
                .get(id)
                .ok_or_else(|| format!("No site with id {id}"))?;
            print!("{}", output::format_site(site));
        }
        Commands::Analyze { lat, lon, json } => {
            let mut orchestrator = dataset.orchestrator();
            let outcome = orchestrator.handle_click(GeoPoint::new(lat, lon))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome.result)?);
            } else {
                print!("{}", output::format_result(&outcome.result, &dataset.catalog));
            }
        }
        Commands::Summary => print!("{}", output::format_summary(&dataset)),
        Commands::Session => session::run(&dataset)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_min_count_filter() {
        assert_eq!(
            parse_min_count("1000:25"),
            Ok(MinCount {
                tier: ProximityTier::M1000,
                min: 25,
            })
        );
        assert!(parse_min_count("750:3").is_err());
        assert!(parse_min_count("1000").is_err());
        assert!(parse_min_count("1000:-1").is_err());
    }

    #[test]
    fn parses_cluster_list_and_negative_longitude() {
        let cli = Cli::try_parse_from([
            "site_map",
            "sites",
            "--clusters",
            "1,3",
            "--min-count",
            "500:2",
        ])
        .unwrap();
        let Some(Commands::Sites {
            clusters,
            min_count,
        }) = cli.command
        else {
            panic!("expected the sites command");
        };
        assert_eq!(clusters, vec![Cluster::One, Cluster::Three]);
        assert_eq!(min_count.map(|filter| filter.min), Some(2));

        let cli = Cli::try_parse_from([
            "site_map", "analyze", "--lat", "47.25", "--lon", "-122.45", "--json",
        ])
        .unwrap();
        let Some(Commands::Analyze { lat, lon, json }) = cli.command else {
            panic!("expected the analyze command");
        };
        assert!((lat - 47.25).abs() < f64::EPSILON);
        assert!((lon + 122.45).abs() < f64::EPSILON);
        assert!(json);
    }

    #[test]
    fn parses_cluster_labels() {
        assert_eq!(parse_cluster("2"), Ok(Cluster::Two));
        assert_eq!(parse_cluster(" 3 "), Ok(Cluster::Three));
        assert!(parse_cluster("0").is_err());
        assert!(parse_cluster("red").is_err());
    }

    #[test]
    fn rejects_unknown_cluster() {
        assert!(Cli::try_parse_from(["site_map", "sites", "--clusters", "4"]).is_err());
    }
}

use crate::geocode::{GeocodeError, Geocoder, NominatimClient};
use crate::model::{
    Coordinate, GeocoderConfig, SessionConfig, DEFAULT_CENTER, DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM,
};
use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "stakeout-mapper",
    version,
    about = "Collect named stakeout coordinates on a map and export them to Excel"
)]
pub struct Cli {
    /// Base URL of the Nominatim geocoding service
    #[arg(long, default_value = "https://nominatim.openstreetmap.org")]
    pub geocoder_url: String,

    /// User-Agent sent to the geocoding service
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Restrict search results to these ISO country codes (e.g. "tw" or "tw,jp")
    #[arg(long)]
    pub country_codes: Option<String>,

    /// Timeout for a single search request
    #[arg(long, default_value = "10s")]
    pub search_timeout: humantime::Duration,

    /// Latitude of the default map centre
    #[arg(long, default_value_t = DEFAULT_CENTER.lat, allow_negative_numbers = true)]
    pub center_lat: f64,

    /// Longitude of the default map centre
    #[arg(long, default_value_t = DEFAULT_CENTER.lon, allow_negative_numbers = true)]
    pub center_lon: f64,

    /// Initial map zoom level (3-19)
    #[arg(long, default_value_t = DEFAULT_ZOOM)]
    pub zoom: u8,

    /// Directory the Excel export is written to
    #[arg(long, default_value = ".")]
    pub export_dir: PathBuf,

    /// Log file for the interactive session (defaults to the user data directory)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Look up a place, print its coordinate and exit (no TUI)
    #[arg(long, value_name = "QUERY")]
    pub lookup: Option<String>,

    /// Print the lookup result as JSON
    #[arg(long, requires = "lookup")]
    pub json: bool,
}

/// Build the session configuration, validating the centre and zoom.
pub fn build_session_config(args: &Cli) -> Result<SessionConfig> {
    let default_center = Coordinate::new(args.center_lat, args.center_lon);
    if !default_center.is_valid() {
        anyhow::bail!("default centre {default_center} is not a valid coordinate");
    }
    if !(MIN_ZOOM..=MAX_ZOOM).contains(&args.zoom) {
        anyhow::bail!("--zoom must be between {MIN_ZOOM} and {MAX_ZOOM}");
    }
    Ok(SessionConfig {
        default_center,
        zoom: args.zoom,
        export_dir: args.export_dir.clone(),
    })
}

pub fn build_geocoder_config(args: &Cli) -> GeocoderConfig {
    GeocoderConfig {
        base_url: args.geocoder_url.clone(),
        user_agent: args
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("stakeout-mapper/{}", env!("CARGO_PKG_VERSION"))),
        country_codes: args.country_codes.clone(),
        timeout: Duration::from(args.search_timeout),
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let level = crate::logging::level_for(args.verbose);

    if let Some(query) = args.lookup.clone() {
        crate::logging::init_stderr_logging(level);
        return run_lookup(&args, &query).await;
    }

    if let Some(path) = args.log_file.clone().or_else(crate::logging::default_log_path) {
        // A missing log file must not keep the tool from starting.
        if let Err(e) = crate::logging::init_file_logging(&path, level) {
            eprintln!("warning: logging disabled: {e:#}");
        }
    }

    #[cfg(feature = "tui")]
    {
        crate::tui::run(args).await
    }
    #[cfg(not(feature = "tui"))]
    {
        Err(anyhow::anyhow!(
            "built without TUI support; only --lookup is available"
        ))
    }
}

#[derive(Debug, Serialize)]
struct LookupOutput<'a> {
    query: &'a str,
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    coordinate: Option<Coordinate>,
}

/// One-shot geocode for scripting: prints the match or fails.
async fn run_lookup(args: &Cli, query: &str) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        anyhow::bail!("--lookup needs a non-empty query");
    }
    let client = NominatimClient::new(&build_geocoder_config(args))?;
    let outcome = client.geocode(query).await;

    let coordinate = match outcome {
        Ok(c) => Some(c),
        Err(GeocodeError::NotFound) => None,
        Err(GeocodeError::Service(reason)) => {
            return Err(anyhow::anyhow!("search unavailable: {reason}"));
        }
    };

    if args.json {
        let out = LookupOutput {
            query,
            found: coordinate.is_some(),
            coordinate,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("serialize lookup result")?
        );
    } else {
        match coordinate {
            Some(c) => println!("{c}"),
            None => println!("location not found: {query}"),
        }
    }

    if coordinate.is_none() {
        std::process::exit(2);
    }
    Ok(())
}

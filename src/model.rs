use crate::geocode::GeocodeError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Number of fixed record slots in a session.
pub const RECORD_COUNT: usize = 20;

/// Tainan city centre; where a fresh session parks the pending marker.
pub const DEFAULT_CENTER: Coordinate = Coordinate {
    lat: 22.9997,
    lon: 120.2270,
};

pub const DEFAULT_ZOOM: u8 = 16;
pub const MIN_ZOOM: u8 = 3;
pub const MAX_ZOOM: u8 = 19;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Round both axes to `decimals` places. Map clicks use 6 (~0.1 m).
    pub fn rounded(self, decimals: i32) -> Self {
        let factor = 10f64.powi(decimals);
        Self {
            lat: (self.lat * factor).round() / factor,
            lon: (self.lon * factor).round() / factor,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// 1-based slot number, fixed at creation.
    pub sequence: usize,
    /// Empty means unset.
    pub name: String,
    pub coordinate: Option<Coordinate>,
}

impl LocationRecord {
    pub fn empty(index: usize) -> Self {
        Self {
            sequence: index + 1,
            name: String::new(),
            coordinate: None,
        }
    }

    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }
}

/// One row of the record table, as shown in the list and written to the export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub sequence: usize,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<&LocationRecord> for TableRow {
    fn from(r: &LocationRecord) -> Self {
        Self {
            sequence: r.sequence,
            name: r.name.clone(),
            latitude: r.coordinate.map(|c| c.lat),
            longitude: r.coordinate.map(|c| c.lon),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Where the pending marker starts and where reset returns it.
    pub default_center: Coordinate,
    pub zoom: u8,
    pub export_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            export_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
    #[serde(default)]
    pub country_codes: Option<String>,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

/// Events delivered from the orchestrator to the UI thread.
#[derive(Debug)]
pub enum AppEvent {
    SearchCompleted {
        ticket: u64,
        query: String,
        outcome: Result<Coordinate, GeocodeError>,
    },
    Info(InfoEvent),
}

/// Structured info events emitted by the orchestrator and consumed by the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InfoEvent {
    SearchSuperseded { query: String },
}

impl InfoEvent {
    /// Render a human-readable message for the status line.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::SearchSuperseded { query } => {
                format!("Previous search for \"{}\" cancelled", query)
            }
        }
    }
}

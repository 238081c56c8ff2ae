//! Place search.
//!
//! A [`Geocoder`] turns free text into a single best-match coordinate. The
//! session treats both failure outcomes as non-fatal.

mod nominatim;

pub use nominatim::NominatimClient;

use crate::model::Coordinate;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeocodeError {
    /// The provider answered but had no match.
    #[error("no match")]
    NotFound,
    /// Transport failure, timeout, bad status or unreadable body.
    #[error("{0}")]
    Service(String),
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<Coordinate, GeocodeError>;
}

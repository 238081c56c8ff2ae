//! Session controller.
//!
//! Owns the record store plus the transient editing state (current index and
//! pending coordinate) and applies user commands to them. Map clicks only move
//! the pending coordinate; a confirm is the sole way a coordinate reaches a
//! record.

use crate::error::{Error, Result};
use crate::export::Exporter;
use crate::geocode::GeocodeError;
use crate::model::{Coordinate, LocationRecord, SessionConfig, TableRow, RECORD_COUNT};
use crate::store::RecordStore;

/// What a successful confirm did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confirmed {
    pub index: usize,
    pub coordinate: Coordinate,
    /// False when the last record was confirmed and selection stayed put.
    pub advanced: bool,
}

pub struct SessionController {
    store: RecordStore,
    current_index: usize,
    pending: Coordinate,
    default_center: Coordinate,
}

impl SessionController {
    pub fn new(cfg: &SessionConfig) -> Self {
        Self {
            store: RecordStore::new(),
            current_index: 0,
            pending: cfg.default_center,
            default_center: cfg.default_center,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn pending(&self) -> Coordinate {
        self.pending
    }

    pub fn current_record(&self) -> Result<&LocationRecord> {
        self.store.get(self.current_index)
    }

    /// Name field edits are written through immediately.
    pub fn set_name(&mut self, text: &str) -> Result<()> {
        self.store.set_name(self.current_index, text)
    }

    /// Apply a finished geocode lookup. Failures leave the pending coordinate
    /// untouched.
    pub fn apply_search(
        &mut self,
        query: &str,
        outcome: std::result::Result<Coordinate, GeocodeError>,
    ) -> Result<Coordinate> {
        match outcome {
            Ok(coordinate) => {
                tracing::info!(query, %coordinate, "search matched");
                self.pending = coordinate;
                Ok(coordinate)
            }
            Err(GeocodeError::NotFound) => {
                tracing::info!(query, "search found nothing");
                Err(Error::LocationNotFound {
                    query: query.to_string(),
                })
            }
            Err(GeocodeError::Service(reason)) => {
                tracing::warn!(query, %reason, "search failed");
                Err(Error::search_unavailable(reason))
            }
        }
    }

    /// Move the pending marker. Returns false for a repeat of the current
    /// position, which callers treat as "nothing to redraw".
    pub fn map_click(&mut self, coordinate: Coordinate) -> bool {
        if coordinate == self.pending {
            return false;
        }
        self.pending = coordinate;
        true
    }

    /// Commit the pending coordinate into the current record and step to the
    /// next one.
    pub fn confirm(&mut self) -> Result<Confirmed> {
        let index = self.current_index;
        if !self.store.get(index)?.has_name() {
            return Err(Error::NameRequired);
        }
        self.store.set_coordinate(index, self.pending)?;

        let advanced = index + 1 < RECORD_COUNT;
        if advanced {
            self.select(index + 1)?;
        }
        tracing::info!(index, coordinate = %self.pending, advanced, "record confirmed");
        Ok(Confirmed {
            index,
            coordinate: self.pending,
            advanced,
        })
    }

    /// Wipe the current record. The pending coordinate stays where it is.
    pub fn clear(&mut self) -> Result<()> {
        self.store.clear(self.current_index)?;
        tracing::info!(index = self.current_index, "record cleared");
        Ok(())
    }

    pub fn select(&mut self, index: usize) -> Result<()> {
        if index >= RECORD_COUNT {
            return Err(Error::OutOfRange { index });
        }
        self.current_index = index;
        Ok(())
    }

    pub fn select_previous(&mut self) -> Result<()> {
        match self.current_index.checked_sub(1) {
            Some(i) => self.select(i),
            None => Ok(()),
        }
    }

    pub fn select_next(&mut self) -> Result<()> {
        if self.current_index + 1 < RECORD_COUNT {
            self.select(self.current_index + 1)
        } else {
            Ok(())
        }
    }

    /// Back to a fresh session: 20 empty records, first slot, default centre.
    pub fn reset(&mut self) {
        self.store.reset_all();
        self.current_index = 0;
        self.pending = self.default_center;
        tracing::info!("session reset");
    }

    pub fn table(&self) -> Vec<TableRow> {
        self.store.to_table()
    }

    pub fn export(&self) -> Result<Vec<u8>> {
        Exporter::serialize(&self.table())
    }
}

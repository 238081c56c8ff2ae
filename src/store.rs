//! Fixed-capacity record list.
//!
//! Holds exactly [`RECORD_COUNT`] records in sequence order. Slots are never
//! added, removed or reordered; only their contents change.

use crate::error::{Error, Result};
use crate::model::{Coordinate, LocationRecord, TableRow, RECORD_COUNT};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordStore {
    records: Vec<LocationRecord>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            records: (0..RECORD_COUNT).map(LocationRecord::empty).collect(),
        }
    }

    pub fn get(&self, index: usize) -> Result<&LocationRecord> {
        self.records.get(index).ok_or(Error::OutOfRange { index })
    }

    fn get_mut(&mut self, index: usize) -> Result<&mut LocationRecord> {
        self.records
            .get_mut(index)
            .ok_or(Error::OutOfRange { index })
    }

    /// Replace the name; the coordinate is left alone.
    pub fn set_name(&mut self, index: usize, text: &str) -> Result<()> {
        let record = self.get_mut(index)?;
        record.name.clear();
        record.name.push_str(text);
        Ok(())
    }

    pub fn set_coordinate(&mut self, index: usize, coordinate: Coordinate) -> Result<()> {
        self.get_mut(index)?.coordinate = Some(coordinate);
        Ok(())
    }

    pub fn clear(&mut self, index: usize) -> Result<()> {
        *self.get_mut(index)? = LocationRecord::empty(index);
        Ok(())
    }

    pub fn reset_all(&mut self) {
        for (i, record) in self.records.iter_mut().enumerate() {
            *record = LocationRecord::empty(i);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocationRecord> {
        self.records.iter()
    }

    /// Number of records holding a confirmed coordinate.
    pub fn confirmed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.coordinate.is_some())
            .count()
    }

    /// Rows in storage order, for the list view and the exporter.
    pub fn to_table(&self) -> Vec<TableRow> {
        self.records.iter().map(TableRow::from).collect()
    }
}

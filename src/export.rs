//! Excel export of the record table.

use crate::error::Result;
use crate::model::TableRow;
use anyhow::Context;
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook};
use std::path::{Path, PathBuf};

pub const EXPORT_FILE_NAME: &str = "stakeout-locations.xlsx";
pub const SHEET_NAME: &str = "Coordinates";
pub const HEADERS: [&str; 4] = ["No.", "Location", "Latitude", "Longitude"];

pub struct Exporter;

impl Exporter {
    /// Build a single-sheet workbook: header row, then one row per record in
    /// the order given. Unset names and coordinates are left as blank cells.
    pub fn serialize(rows: &[TableRow]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();

        // Pin the creation stamp so identical tables give identical documents.
        let created = ExcelDateTime::from_ymd(2024, 1, 1)?;
        let properties = DocProperties::new()
            .set_title("Stakeout locations")
            .set_creation_datetime(&created);
        workbook.set_properties(&properties);

        let header = Format::new().set_bold();
        let coord = Format::new().set_num_format("0.000000");

        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;
        for (col, title) in HEADERS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *title, &header)?;
        }
        sheet.set_column_width(1, 36)?;
        sheet.set_column_width(2, 14)?;
        sheet.set_column_width(3, 14)?;

        for (i, row) in rows.iter().enumerate() {
            let r = (i + 1) as u32;
            sheet.write_number(r, 0, row.sequence as f64)?;
            if !row.name.is_empty() {
                sheet.write_string(r, 1, &row.name)?;
            }
            if let Some(lat) = row.latitude {
                sheet.write_number_with_format(r, 2, lat, &coord)?;
            }
            if let Some(lon) = row.longitude {
                sheet.write_number_with_format(r, 3, lon, &coord)?;
            }
        }

        Ok(workbook.save_to_buffer()?)
    }

    /// Write serialized workbook bytes to `dir/stakeout-locations.xlsx`,
    /// replacing any previous export. Returns the absolute path written.
    pub fn write_to_dir(dir: &Path, bytes: &[u8]) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create export directory {}", dir.display()))?;
        let path = dir.join(EXPORT_FILE_NAME);
        std::fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
        let path = path.canonicalize().unwrap_or(path);
        tracing::info!(path = %path.display(), bytes = bytes.len(), "exported workbook");
        Ok(path)
    }
}

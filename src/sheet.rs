//! CSV export and import of issue rows.
//!
//! Export writes one header row with the catalog's columns, then one line per
//! row. Import maps cells back by header name.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::catalog::FieldCatalog;
use crate::error::SheetError;
use crate::model::{CellValue, RowRecord};
use crate::reconcile::REQUIRED_COLUMNS;

pub fn write_rows<W: Write>(
    writer: W,
    catalog: &FieldCatalog,
    rows: &[RowRecord],
) -> Result<(), SheetError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(catalog.columns())?;
    for row in rows {
        csv.write_record(
            catalog
                .columns()
                .map(|column| row.get(column).map(CellValue::to_string).unwrap_or_default()),
        )?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write rows to `path`, replacing it only once everything is on disk.
pub fn export(path: &Path, catalog: &FieldCatalog, rows: &[RowRecord]) -> Result<(), SheetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    let temp_path = temp_path(path);
    let result = write_temp(&temp_path, catalog, rows)
        .and_then(|()| fs::rename(&temp_path, path).map_err(|e| io_error(path, e)));
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_temp(temp_path: &Path, catalog: &FieldCatalog, rows: &[RowRecord]) -> Result<(), SheetError> {
    let file = File::create(temp_path).map_err(|e| io_error(temp_path, e))?;
    let mut writer = BufWriter::new(file);
    write_rows(&mut writer, catalog, rows)?;
    let file = writer
        .into_inner()
        .map_err(|e| io_error(temp_path, e.into_error()))?;
    file.sync_all().map_err(|e| io_error(temp_path, e))?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn io_error(path: &Path, source: io::Error) -> SheetError {
    SheetError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Read rows back. The header must name every column a push needs; numeric
/// catalog columns are re-read as numbers when the text is a plain number.
pub fn read_rows<R: io::Read>(reader: R, catalog: &FieldCatalog) -> Result<Vec<RowRecord>, SheetError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    if let Some(missing) = REQUIRED_COLUMNS
        .iter()
        .find(|c| !headers.iter().any(|h| h == *c))
    {
        return Err(SheetError::MissingColumn(missing.to_string()));
    }

    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let mut row = RowRecord::with_capacity(headers.len());
        for (i, column) in headers.iter().enumerate() {
            let raw = record.get(i).unwrap_or_default();
            row.insert(column.as_str(), catalog.kind(column).cell(raw));
        }
        rows.push(row);
    }
    Ok(rows)
}

pub fn import(path: &Path, catalog: &FieldCatalog) -> Result<Vec<RowRecord>, SheetError> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    read_rows(io::BufReader::new(file), catalog)
}

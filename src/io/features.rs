//! Reading feature rows from header-less CSV files.
//!
//! Each record is one feature vector; an empty cell is a missing value.

use crate::core::error::{Result, ShapError};
use crate::core::types::Score;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read every row of a CSV feature table.
pub fn read_feature_rows<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<Option<Score>>>> {
    let path = path.as_ref();
    log::debug!("Reading feature rows from {}", path.display());
    let file = File::open(path)?;
    read_feature_rows_from(file)
}

/// Read every row of a CSV feature table from a reader.
pub fn read_feature_rows_from<R: Read>(reader: R) -> Result<Vec<Vec<Option<Score>>>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (row_index, record) in csv_reader.records().enumerate() {
        let record = record?;
        let row = record
            .iter()
            .enumerate()
            .map(|(column, field)| parse_field(row_index, column, field))
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }

    log::debug!("Read {} feature rows", rows.len());
    Ok(rows)
}

fn parse_field(row: usize, column: usize, field: &str) -> Result<Option<Score>> {
    if field.is_empty() {
        return Ok(None);
    }
    field.trim().parse::<Score>().map(Some).map_err(|e| {
        ShapError::data_loading(format!(
            "row {}, column {}: cannot parse {:?} as a float: {}",
            row, column, field, e
        ))
    })
}

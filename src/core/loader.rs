//! core/loader.rs: read a delimited text file against a schema.
//!
//! The whole load aborts on the first bad row: a partially loaded table would
//! leave its fields out of step with the file.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::core::schema::{Delimiter, SchemaDescriptor};
use crate::core::table::SeriesTable;
use crate::error::{Error, Result};

/// Load `path` into a table named `name`.
///
/// The first `schema.skip_rows` physical lines are dropped. After that, blank
/// lines and `#` comment lines are ignored. Every other line must carry exactly
/// one numeric cell per schema field. Line numbers in errors are 1-based.
pub fn load_table(name: &str, path: &Path, schema: &SchemaDescriptor) -> Result<SeriesTable> {
    schema.validate()?;
    let text = fs::read_to_string(path).map_err(|e| Error::from_read(path, e))?;
    table_from_text(name, path, &text, schema)
}

/// Load `path`, taking the field names from its first line.
pub fn load_with_header(name: &str, path: &Path, delimiter: Delimiter) -> Result<SeriesTable> {
    let text = fs::read_to_string(path).map_err(|e| Error::from_read(path, e))?;
    let header = text.lines().next().unwrap_or_default();
    let schema = SchemaDescriptor::from_header(header, delimiter)?;
    table_from_text(name, path, &text, &schema)
}

fn table_from_text(name: &str, path: &Path, text: &str, schema: &SchemaDescriptor) -> Result<SeriesTable> {
    let columns = parse_columns(path, text, schema)?;

    let len = columns.first().map(Vec::len).unwrap_or(0);
    if len == 0 {
        warn!(table = name, path = %path.display(), "source has no data rows");
    }

    let mut table = SeriesTable::new(name, len);
    for (field, values) in schema.fields.iter().zip(columns) {
        table.insert(field.clone(), values)?;
    }
    debug!(
        table = name,
        path = %path.display(),
        rows = len,
        fields = table.n_fields(),
        "loaded table"
    );
    Ok(table)
}

/// Parse already-read text into one column per schema field.
pub fn parse_columns(path: &Path, text: &str, schema: &SchemaDescriptor) -> Result<Vec<Vec<f64>>> {
    let expected = schema.n_columns();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); expected];

    for (idx, line) in text.lines().enumerate().skip(schema.skip_rows) {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let cells = schema.delimiter.split(trimmed);
        if cells.len() != expected {
            return Err(Error::MalformedSchema {
                path: path.to_path_buf(),
                line: line_no,
                expected,
                found: cells.len(),
            });
        }

        for ((cell, column), field) in cells.iter().zip(columns.iter_mut()).zip(&schema.fields) {
            let value = cell.parse::<f64>().map_err(|_| Error::MalformedValue {
                path: path.to_path_buf(),
                line: line_no,
                field: field.clone(),
                value: (*cell).to_string(),
            })?;
            column.push(value);
        }
    }

    Ok(columns)
}

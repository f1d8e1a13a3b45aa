//! core/table.rs: synchronized named numeric columns.
//!
//! A `SeriesTable` keeps every field at the same length. Fields are only ever
//! added; an existing name is never overwritten.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};

/// Equal-length named columns loaded from (or derived for) one data source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeriesTable {
    name: String,
    len: usize,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    index: HashMap<String, usize>,
}

impl SeriesTable {
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len,
            ..Self::default()
        }
    }

    /// Build a table from `(field, values)` pairs in declaration order.
    pub fn from_columns<I, S>(name: impl Into<String>, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut columns = columns.into_iter().peekable();
        let len = columns.peek().map(|(_, v)| v.len()).unwrap_or(0);
        let mut table = Self::new(name, len);
        for (field, values) in columns {
            table.insert(field, values)?;
        }
        Ok(table)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of samples (rows).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn n_fields(&self) -> usize {
        self.names.len()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.index.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[f64]> {
        self.index.get(field).map(|&i| self.columns[i].as_slice())
    }

    /// Like [`get`](Self::get), but a missing field is an error naming the table.
    pub fn field(&self, field: &str) -> Result<&[f64]> {
        self.get(field).ok_or_else(|| Error::UnknownField {
            table: self.name.clone(),
            field: field.to_string(),
        })
    }

    /// Add a new field. Fails if the name is taken or the length differs.
    pub fn insert(&mut self, field: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let field = field.into();
        if self.index.contains_key(&field) {
            return Err(Error::DuplicateField {
                table: self.name.clone(),
                field,
            });
        }
        if values.len() != self.len {
            return Err(Error::LengthMismatch {
                table: self.name.clone(),
                field,
                expected: self.len,
                found: values.len(),
            });
        }
        self.index.insert(field.clone(), self.names.len());
        self.names.push(field);
        self.columns.push(values);
        Ok(())
    }

    /// Gather the given row indices of every field into a new table.
    pub fn select_rows(&self, name: impl Into<String>, rows: &[usize]) -> Result<Self> {
        let mut out = Self::new(name, rows.len());
        for (field, values) in self.names.iter().zip(&self.columns) {
            let mut picked = Vec::with_capacity(rows.len());
            for &row in rows {
                let value = values.get(row).copied().ok_or_else(|| {
                    Error::InvalidDerivation(format!(
                        "row {row} is out of range for table `{}` with {} rows",
                        self.name, self.len
                    ))
                })?;
                picked.push(value);
            }
            out.insert(field.clone(), picked)?;
        }
        Ok(out)
    }

    /// Header row plus one line per sample.
    pub fn to_csv(&self) -> String {
        let mut out = self.names.join(",");
        out.push('\n');
        for row in 0..self.len {
            let line: Vec<String> = self.columns.iter().map(|c| format!("{}", c[row])).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        out
    }
}

/// Tables of one experiment, addressed by name.
#[derive(Clone, Debug, Default)]
pub struct TableSet {
    tables: BTreeMap<String, SeriesTable>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table under its own name. A second table with the same name
    /// is rejected rather than replacing the first.
    pub fn add(&mut self, table: SeriesTable) -> Result<()> {
        if self.tables.contains_key(table.name()) {
            return Err(Error::InvalidDerivation(format!(
                "table `{}` is already registered",
                table.name()
            )));
        }
        self.tables.insert(table.name().to_string(), table);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&SeriesTable> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::UnknownTable(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut SeriesTable> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| Error::UnknownTable(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeriesTable> {
        self.tables.values()
    }
}

//! core/schema.rs: column layout of one tabular data source.
//!
//! A schema names every column in file order, so downstream code looks fields
//! up by name instead of by position.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How cells are separated on a data line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Delimiter {
    /// Any run of spaces or tabs.
    #[default]
    Whitespace,
    /// A single comma; surrounding blanks are trimmed from each cell.
    Comma,
}

impl Delimiter {
    pub fn split(self, line: &str) -> Vec<&str> {
        match self {
            Delimiter::Whitespace => line.split_whitespace().collect(),
            Delimiter::Comma => line.split(',').map(str::trim).collect(),
        }
    }
}

/// Column layout, header length and delimiter of one source file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub fields: Vec<String>,
    #[serde(default)]
    pub skip_rows: usize,
    #[serde(default)]
    pub delimiter: Delimiter,
}

impl SchemaDescriptor {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            skip_rows: 0,
            delimiter: Delimiter::Whitespace,
        }
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = skip_rows;
        self
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Build a schema from a header line holding the column names. The
    /// header becomes the single skipped row.
    pub fn from_header(header: &str, delimiter: Delimiter) -> Result<Self> {
        let names: Vec<&str> = delimiter
            .split(header)
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        let schema = Self::new(names)
            .with_skip_rows(1)
            .with_delimiter(delimiter);
        schema.validate()?;
        Ok(schema)
    }

    #[inline]
    pub fn n_columns(&self) -> usize {
        self.fields.len()
    }

    pub fn position(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// Reject schemas that could never describe a table: no columns, blank
    /// names, or a name used twice.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(Error::InvalidSchema("schema declares no fields".into()));
        }
        let mut seen = HashSet::with_capacity(self.fields.len());
        for name in &self.fields {
            if name.trim().is_empty() {
                return Err(Error::InvalidSchema("field names must not be blank".into()));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "field `{name}` is declared more than once"
                )));
            }
        }
        Ok(())
    }
}

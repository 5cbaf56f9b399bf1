//! Column-oriented input accepted by the feature store.

use crate::error::{IngestError, Result};
use crate::models::AttrValue;

/// A single cell of a column-oriented dataset, before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Raw bytes (WKB when found in a geometry column)
    Bytes(Vec<u8>),
    /// Nested structure (GeoJSON-shaped mapping when found in a geometry column)
    Nested(serde_json::Value),
}

impl Cell {
    /// Convert a non-geometry cell into an attribute value
    pub fn into_attr(self) -> AttrValue {
        match self {
            Cell::Null => AttrValue::Null,
            Cell::Bool(v) => AttrValue::Bool(v),
            Cell::Int(v) => AttrValue::Int(v),
            Cell::Float(v) => AttrValue::float(v),
            Cell::Str(v) => AttrValue::Str(v),
            Cell::Bytes(v) => AttrValue::Str(String::from_utf8_lossy(&v).into_owned()),
            Cell::Nested(serde_json::Value::Null) => AttrValue::Null,
            Cell::Nested(v) => AttrValue::Str(v.to_string()),
        }
    }
}

/// A named column of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }
}

/// One column per attribute, one row per record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnTable {
    columns: Vec<Column>,
    num_rows: usize,
}

impl ColumnTable {
    /// Build a table, checking that every column has the same length
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let num_rows = columns.first().map(|c| c.cells.len()).unwrap_or(0);
        for column in &columns {
            if column.cells.len() != num_rows {
                return Err(IngestError::RaggedColumn {
                    column: column.name.clone(),
                    expected: num_rows,
                    found: column.cells.len(),
                });
            }
        }
        Ok(Self { columns, num_rows })
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }
}

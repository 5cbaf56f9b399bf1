//! Parquet decoding into a [`ColumnTable`].
//!
//! Uses parquet-rs's row iterator API. Files are small enough to be held in
//! memory in full, so the reader runs straight over the uploaded bytes.

use bytes::Bytes;
use parquet::file::reader::FileReader;
use parquet::file::serialized_reader::SerializedFileReader;
use parquet::record::Field;
use tracing::debug;

use super::table::{Cell, Column, ColumnTable};
use crate::error::Result;

/// Prefix of the index columns pandas writes alongside the data
const PANDAS_INDEX_PREFIX: &str = "__index_level_";

/// Decode a whole Parquet file into columns
pub fn read_parquet(data: Bytes) -> Result<ColumnTable> {
    let reader = SerializedFileReader::new(data)?;
    let metadata = reader.metadata();

    let names: Vec<String> = metadata
        .file_metadata()
        .schema()
        .get_fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect();

    let total_rows = metadata.file_metadata().num_rows().max(0) as usize;
    let mut cells: Vec<Vec<Cell>> = names
        .iter()
        .map(|_| Vec::with_capacity(total_rows))
        .collect();

    for row_result in reader.get_row_iter(None)? {
        let row = row_result?;
        // Without projection, row columns come in schema order.
        for (idx, (_, field)) in row.get_column_iter().enumerate() {
            if let Some(column) = cells.get_mut(idx) {
                column.push(field_to_cell(field));
            }
        }
    }

    let columns: Vec<Column> = names
        .into_iter()
        .zip(cells)
        .filter(|(name, _)| !name.starts_with(PANDAS_INDEX_PREFIX))
        .map(|(name, cells)| Column::new(name, cells))
        .collect();

    debug!(
        "Decoded Parquet file: {} columns, {} rows",
        columns.len(),
        total_rows
    );

    ColumnTable::new(columns)
}

/// Convert a parquet-rs field into a table cell
fn field_to_cell(field: &Field) -> Cell {
    match field {
        Field::Null => Cell::Null,
        Field::Bool(v) => Cell::Bool(*v),
        Field::Byte(v) => Cell::Int(*v as i64),
        Field::Short(v) => Cell::Int(*v as i64),
        Field::Int(v) => Cell::Int(*v as i64),
        Field::Long(v) => Cell::Int(*v),
        Field::UByte(v) => Cell::Int(*v as i64),
        Field::UShort(v) => Cell::Int(*v as i64),
        Field::UInt(v) => Cell::Int(*v as i64),
        Field::ULong(v) => i64::try_from(*v)
            .map(Cell::Int)
            .unwrap_or(Cell::Float(*v as f64)),
        Field::Float16(v) => Cell::Float(v.to_f32() as f64),
        Field::Float(v) => Cell::Float(*v as f64),
        Field::Double(v) => Cell::Float(*v),
        Field::Decimal(_) => field
            .to_string()
            .parse::<f64>()
            .map(Cell::Float)
            .unwrap_or(Cell::Null),
        Field::Str(v) => Cell::Str(v.clone()),
        Field::Bytes(v) => Cell::Bytes(v.data().to_vec()),
        Field::Group(_) | Field::ListInternal(_) | Field::MapInternal(_) => {
            Cell::Nested(field_to_json(field))
        }
        // Dates and timestamps keep their textual form
        other => Cell::Str(other.to_string()),
    }
}

/// Convert a (possibly nested) field into a JSON value
fn field_to_json(field: &Field) -> serde_json::Value {
    use serde_json::Value;

    match field {
        Field::Group(row) => Value::Object(
            row.get_column_iter()
                .map(|(name, f)| (name.clone(), field_to_json(f)))
                .collect(),
        ),
        Field::ListInternal(list) => {
            Value::Array(list.elements().iter().map(field_to_json).collect())
        }
        Field::MapInternal(map) => Value::Object(
            map.entries()
                .iter()
                .map(|(k, v)| {
                    let key = match k {
                        Field::Str(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (key, field_to_json(v))
                })
                .collect(),
        ),
        scalar => match field_to_cell(scalar) {
            Cell::Null => Value::Null,
            Cell::Bool(v) => Value::Bool(v),
            Cell::Int(v) => Value::from(v),
            Cell::Float(v) => serde_json::Number::from_f64(v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Str(v) => Value::String(v),
            Cell::Bytes(v) => Value::String(String::from_utf8_lossy(&v).into_owned()),
            Cell::Nested(v) => v,
        },
    }
}

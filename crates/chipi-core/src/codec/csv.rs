//! CSV codec.
//!
//! # Column layout
//!
//! The label is carried out-of-band (typically as the file name). The
//! payload is a header row `kind,value` followed by one row per value, oldest
//! first:
//!
//! | `kind` | `value` cell |
//! |--------|--------------|
//! | `null` | empty |
//! | `bool` | `true` / `false` |
//! | `int` | decimal integer |
//! | `float` | shortest round-trip text, including `inf`, `-inf`, `NaN` |
//! | `string` | raw text |
//! | `list`, `map` | JSON text |
//!
//! ```text
//! kind,value
//! int,20
//! float,21.5
//! string,n/a
//! ```
//!
//! A payload without the `kind,value` header is read as one untyped value
//! per row: each cell is tried as an integer, then a float, then a boolean
//! (`true`/`True`/`false`/`False`), and otherwise kept as a string. Empty
//! cells become `null`.

use ::csv::{ReaderBuilder, StringRecord, WriterBuilder};
use chipi_common::types::Value;
use chipi_common::utils::error::{Error, Result};

use super::{Codec, Decoded, Format};

const FORMAT: &str = "csv";
const HEADER: [&str; 2] = ["kind", "value"];

/// CSV codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvCodec;

impl Codec for CsvCodec {
    fn format(&self) -> Format {
        Format::Csv
    }

    fn encode(&self, _label: &str, values: &[Value]) -> Result<Vec<u8>> {
        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(HEADER).map_err(malformed)?;
        for value in values {
            let cell = encode_cell(value)?;
            writer
                .write_record([value.type_name(), cell.as_str()])
                .map_err(malformed)?;
        }
        writer
            .into_inner()
            .map_err(|e| Error::malformed(FORMAT, e.to_string()))
    }

    fn decode(&self, payload: &[u8]) -> Result<Decoded> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(payload);
        let mut records = reader.records();

        let Some(first) = records.next().transpose().map_err(malformed)? else {
            return Ok(Decoded::default());
        };

        let mut values = Vec::new();
        if is_header(&first) {
            for (row, record) in records.enumerate() {
                let record = record.map_err(malformed)?;
                // Row 1 is the header.
                values.push(decode_typed(&record, row + 2)?);
            }
        } else {
            values.push(decode_untyped(&first, 1)?);
            for (row, record) in records.enumerate() {
                let record = record.map_err(malformed)?;
                values.push(decode_untyped(&record, row + 2)?);
            }
        }

        Ok(Decoded {
            label: None,
            values,
        })
    }
}

fn malformed(e: ::csv::Error) -> Error {
    Error::malformed(FORMAT, e.to_string())
}

fn row_error(row: usize, reason: impl std::fmt::Display) -> Error {
    Error::malformed(FORMAT, format!("row {row}: {reason}"))
}

fn is_header(record: &StringRecord) -> bool {
    record.len() == 2 && record.get(0) == Some(HEADER[0]) && record.get(1) == Some(HEADER[1])
}

fn encode_cell(value: &Value) -> Result<String> {
    Ok(match value {
        Value::Null => String::new(),
        Value::Bool(v) => v.to_string(),
        Value::Int64(v) => v.to_string(),
        Value::Float64(v) => format!("{v:?}"),
        Value::String(s) => s.to_string(),
        Value::List(_) | Value::Map(_) => {
            serde_json::to_string(value).map_err(|e| Error::malformed(FORMAT, e.to_string()))?
        }
    })
}

fn decode_typed(record: &StringRecord, row: usize) -> Result<Value> {
    if record.len() != 2 {
        return Err(row_error(row, format!("expected 2 cells, found {}", record.len())));
    }
    let kind = &record[0];
    let cell = &record[1];

    match kind {
        "null" if cell.is_empty() => Ok(Value::Null),
        "null" => Err(row_error(row, "null row with a non-empty value")),
        "bool" => cell
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|e| row_error(row, e)),
        "int" => cell
            .parse::<i64>()
            .map(Value::Int64)
            .map_err(|e| row_error(row, e)),
        "float" => cell
            .parse::<f64>()
            .map(Value::Float64)
            .map_err(|e| row_error(row, e)),
        "string" => Ok(Value::from(cell)),
        "list" | "map" => {
            let value: Value = serde_json::from_str(cell).map_err(|e| row_error(row, e))?;
            if value.type_name() == kind {
                Ok(value)
            } else {
                Err(row_error(
                    row,
                    format!("expected {kind}, found {}", value.type_name()),
                ))
            }
        }
        other => Err(row_error(row, format!("unknown kind '{other}'"))),
    }
}

fn decode_untyped(record: &StringRecord, row: usize) -> Result<Value> {
    if record.len() != 1 {
        return Err(row_error(
            row,
            format!("expected 1 cell without a header, found {}", record.len()),
        ));
    }
    let cell = &record[0];

    if cell.is_empty() {
        return Ok(Value::Null);
    }
    if let Ok(v) = cell.parse::<i64>() {
        return Ok(Value::Int64(v));
    }
    if let Ok(v) = cell.parse::<f64>() {
        return Ok(Value::Float64(v));
    }
    Ok(match cell {
        "true" | "True" => Value::Bool(true),
        "false" | "False" => Value::Bool(false),
        _ => Value::from(cell),
    })
}

//! Interchange codecs.
//!
//! A [`Codec`] turns a buffer's label and values into payload bytes and
//! back. Codecs never touch the file system.
//!
//! # Supported Formats
//!
//! | Format | Layout | Label |
//! |--------|--------|-------|
//! | [`Format::Json`] | `{"label": ..., "data": [...]}` | embedded |
//! | [`Format::Csv`] | `kind,value` header, one row per value | out-of-band |
//!
//! # Example
//!
//! ```
//! use chipi_core::{Format, codec_for};
//! use chipi_common::Value;
//!
//! let format: Format = "csv".parse().unwrap();
//! let codec = codec_for(format);
//!
//! let payload = codec.encode("temps", &[Value::from(20), Value::from(21.5)]).unwrap();
//! let decoded = codec.decode(&payload).unwrap();
//! assert_eq!(decoded.values, vec![Value::from(20), Value::from(21.5)]);
//! assert!(decoded.label.is_none());
//! ```

mod csv;
mod json;

pub use self::csv::CsvCodec;
pub use self::json::JsonCodec;

use std::fmt;
use std::str::FromStr;

use chipi_common::types::Value;
use chipi_common::utils::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Interchange format identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// JSON document with the label embedded.
    Json,
    /// CSV table, label carried out-of-band.
    Csv,
}

impl Format {
    /// Every supported format.
    pub const ALL: [Format; 2] = [Format::Json, Format::Csv];

    /// Returns the lowercase format name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    /// Returns the conventional file extension (without the dot).
    #[must_use]
    pub fn extension(&self) -> &'static str {
        self.name()
    }

    /// Resolves a file extension, with or without the leading dot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for unknown extensions.
    pub fn from_extension(extension: &str) -> Result<Self> {
        extension.trim_start_matches('.').parse()
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output of [`Codec::decode`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Decoded {
    /// Label embedded in the payload, if the format carries one.
    pub label: Option<String>,
    /// Decoded values, oldest first.
    pub values: Vec<Value>,
}

/// Translates a buffer's contents to and from one interchange format.
pub trait Codec: Send + Sync {
    /// Returns the format this codec handles.
    fn format(&self) -> Format;

    /// Encodes `label` and `values` into a payload.
    fn encode(&self, label: &str, values: &[Value]) -> Result<Vec<u8>>;

    /// Decodes a payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedPayload`] if the payload cannot be parsed.
    fn decode(&self, payload: &[u8]) -> Result<Decoded>;
}

/// Returns the codec for `format`.
#[must_use]
pub fn codec_for(format: Format) -> &'static dyn Codec {
    match format {
        Format::Json => &JsonCodec,
        Format::Csv => &CsvCodec,
    }
}

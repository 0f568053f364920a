//! JSON codec.
//!
//! Encodes a buffer as a pretty-printed object:
//!
//! ```json
//! {
//!   "label": "temps",
//!   "data": [20, 21.5, "n/a"]
//! }
//! ```
//!
//! Decoding also accepts a bare array of values, which carries no label.

use chipi_common::types::Value;
use chipi_common::utils::error::{Error, Result};
use serde::Serialize;
use serde_json::Value as Json;

use super::{Codec, Decoded, Format};

const FORMAT: &str = "json";

/// JSON codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[derive(Serialize)]
struct Document<'a> {
    label: &'a str,
    data: &'a [Value],
}

impl Codec for JsonCodec {
    fn format(&self) -> Format {
        Format::Json
    }

    fn encode(&self, label: &str, values: &[Value]) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(&Document {
            label,
            data: values,
        })
        .map_err(|e| Error::malformed(FORMAT, e.to_string()))
    }

    fn decode(&self, payload: &[u8]) -> Result<Decoded> {
        let document: Json =
            serde_json::from_slice(payload).map_err(|e| Error::malformed(FORMAT, e.to_string()))?;

        match document {
            Json::Array(_) => Ok(Decoded {
                label: None,
                values: values_from(document)?,
            }),
            Json::Object(mut fields) => {
                let data = fields
                    .remove("data")
                    .ok_or_else(|| Error::malformed(FORMAT, "missing 'data' field"))?;
                let label = match fields.remove("label") {
                    None | Some(Json::Null) => None,
                    Some(Json::String(label)) => Some(label),
                    Some(_) => return Err(Error::malformed(FORMAT, "'label' must be a string")),
                };
                if !data.is_array() {
                    return Err(Error::malformed(FORMAT, "'data' must be an array"));
                }
                Ok(Decoded {
                    label,
                    values: values_from(data)?,
                })
            }
            _ => Err(Error::malformed(
                FORMAT,
                "expected an object with 'label' and 'data', or an array",
            )),
        }
    }
}

fn values_from(array: Json) -> Result<Vec<Value>> {
    serde_json::from_value(array).map_err(|e| Error::malformed(FORMAT, e.to_string()))
}

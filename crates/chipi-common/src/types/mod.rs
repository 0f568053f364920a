//! Core type definitions for Chipi.
//!
//! - [`Value`] - the opaque payload stored in every buffer

mod value;

pub use value::Value;

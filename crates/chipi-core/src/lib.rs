//! # chipi-core
//!
//! Core layer for Chipi: labeled buffers, the buffer manager, and the
//! interchange codecs.
//!
//! This crate depends only on `chipi-common`. It performs no file I/O;
//! codecs turn buffers into payload bytes and back, and `chipi-adapters`
//! moves those bytes to and from the file system.
//!
//! ## Modules
//!
//! - [`buffer`] - [`Buffer`], capacity configuration, and derived accessors
//! - [`manager`] - [`BufferManager`], a registry of labeled buffers
//! - [`codec`] - JSON and CSV codecs behind the [`Codec`] trait

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod buffer;
pub mod codec;
pub mod manager;

// Re-export commonly used types
pub use buffer::{AccessorRegistry, Buffer, BufferConfig, DerivedAccessor, Series};
pub use codec::{Codec, CsvCodec, Decoded, Format, JsonCodec, codec_for};
pub use manager::{BufferManager, Labels, ManagerConfig};

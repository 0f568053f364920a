//! # Chipi
//!
//! Labeled, history-aware data buffers.
//!
//! Start with [`BufferManager`] when you track several named series, or a
//! single [`Buffer`] when you only need one. Every buffer remembers what was
//! appended, optionally bounded to the most recent values, and exposes the
//! newest and the previous value directly.
//!
//! ## Features
//!
//! | Feature | Adds | Notes |
//! | ------- | ---- | ----- |
//! | `files` | [`FileStore`] | enabled by default |
//!
//! ## Quick Start
//!
//! ```rust
//! use chipi::{BufferManager, Format, ManagerConfig, Value};
//!
//! // Three buffers, each keeping the 100 most recent values
//! let config = ManagerConfig::new().with_max_length(100)?;
//! let mut manager = BufferManager::with_config(["data1", "data2", "data3"], config)?;
//!
//! manager.add("data1", 10)?;
//! manager.add("data1", 12)?;
//!
//! let data1 = manager.get("data1")?;
//! assert_eq!(data1.current_value()?, &Value::from(12));
//! assert_eq!(data1.previous_value()?, &Value::from(10));
//! assert_eq!(data1.delta()?, Value::from(2));
//!
//! // Move the history into another buffer through JSON
//! let payload = manager.export("data1", Format::Json)?;
//! manager.import_data("data2", Format::Json, &payload)?;
//! assert_eq!(manager.get_data("data2")?.len(), 2);
//! # Ok::<(), chipi::Error>(())
//! ```
//!
//! ## Derived Accessors
//!
//! Named reductions can be registered once and evaluated on any buffer:
//!
//! ```rust
//! use chipi::{BufferManager, Series, Value};
//!
//! let mut manager = BufferManager::new(["speed"])?;
//! manager.register_fn("count", |series: &Series<'_>| {
//!     series.require_non_empty()?;
//!     Ok(Value::from(series.len() as i64))
//! });
//! manager.add("speed", 3.5)?;
//! assert_eq!(manager.get("speed")?.derive("count")?, Value::from(1));
//! # Ok::<(), chipi::Error>(())
//! ```

// Re-export the buffer API
pub use chipi_core::{
    AccessorRegistry, Buffer, BufferConfig, BufferManager, DerivedAccessor, Labels,
    ManagerConfig, Series,
};

// Re-export the interchange boundary
pub use chipi_core::{Codec, CsvCodec, Decoded, Format, JsonCodec, codec_for};

// Re-export common types - values and errors flow through every call
pub use chipi_common::{Error, Result, Value};

#[cfg(feature = "files")]
pub use chipi_adapters::storage::{DumpReport, FileStore, LoadReport};

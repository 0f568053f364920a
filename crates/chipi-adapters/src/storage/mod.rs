//! Storage backends.
//!
//! - [`FileStore`] - one file per buffer under a root directory

mod file;

pub use file::{DumpReport, FileStore, LoadReport};

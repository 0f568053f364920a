//! # chipi-adapters
//!
//! Adapters layer for Chipi: moving buffers in and out of the file system.
//!
//! ## Modules
//!
//! - [`storage`] - File-backed export and import of buffers and managers

pub mod storage;

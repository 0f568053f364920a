//! Utility functions and helpers.

pub mod error;

//! Buffer capacity configuration.

use std::fmt;
use std::num::NonZeroUsize;

use chipi_common::utils::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Capacity policy for a single buffer.
///
/// A bounded buffer keeps at most `max_length` values and evicts the oldest
/// on overflow. The bound is validated when the config is built, so a
/// `BufferConfig` in hand is always valid. Deserializing `max_length: 0`
/// fails.
///
/// # Examples
///
/// ```
/// use chipi_core::BufferConfig;
///
/// let history = BufferConfig::bounded(100).unwrap();
/// assert_eq!(history.max_length(), Some(100));
///
/// assert!(BufferConfig::bounded(0).is_err());
/// assert!(BufferConfig::unbounded().max_length().is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BufferConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_length: Option<NonZeroUsize>,
}

impl BufferConfig {
    /// No capacity bound.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { max_length: None }
    }

    /// Keeps at most `max_length` values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `max_length` is zero.
    pub fn bounded(max_length: usize) -> Result<Self> {
        NonZeroUsize::new(max_length)
            .map(|n| Self {
                max_length: Some(n),
            })
            .ok_or_else(|| {
                Error::Configuration("max_length must be a positive integer, got 0".to_string())
            })
    }

    /// Builds a config from an optional bound; `None` means unbounded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for `Some(0)`.
    pub fn from_max_length(max_length: Option<usize>) -> Result<Self> {
        match max_length {
            Some(n) => Self::bounded(n),
            None => Ok(Self::unbounded()),
        }
    }

    /// Returns the bound, if any.
    #[must_use]
    pub fn max_length(&self) -> Option<usize> {
        self.max_length.map(NonZeroUsize::get)
    }

    /// Returns true if a bound is set.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.max_length.is_some()
    }
}

impl fmt::Display for BufferConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_length {
            Some(n) => write!(f, "Bounded(max_length={n})"),
            None => write!(f, "Unbounded"),
        }
    }
}

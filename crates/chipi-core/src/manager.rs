//! Registry of labeled buffers.
//!
//! A [`BufferManager`] is built from an ordered set of labels and eagerly
//! creates one empty [`Buffer`] per label. It owns its buffers exclusively;
//! there is no process-wide registry, so code that needs buffers receives a
//! manager by reference.
//!
//! # Usage
//!
//! ```
//! use chipi_core::{BufferManager, ManagerConfig};
//! use chipi_common::Value;
//!
//! let config = ManagerConfig::new().with_max_length(100).unwrap();
//! let mut manager = BufferManager::with_config(["data1", "data2", "data3"], config).unwrap();
//!
//! manager.add("data1", 10).unwrap();
//! assert_eq!(manager.get_data("data1").unwrap(), &[Value::from(10)]);
//! assert!(manager.get("data9").is_err());
//! ```

use std::iter::FusedIterator;
use std::sync::Arc;

use chipi_common::types::Value;
use chipi_common::utils::error::{Error, Result};
use indexmap::IndexMap;
use indexmap::map::{Entry, Keys};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buffer::{AccessorRegistry, Buffer, BufferConfig, DerivedAccessor, Series};
use crate::codec::Format;

/// Construction options for a [`BufferManager`].
///
/// Every buffer gets the shared `default` capacity policy unless an override
/// is registered for its label. Deserializes from e.g.
/// `{"default": {"max_length": 50}, "overrides": {"raw": {}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Capacity policy shared by all buffers.
    #[serde(default)]
    pub default: BufferConfig,
    /// Per-label capacity policies.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub overrides: IndexMap<String, BufferConfig>,
    /// Whether each buffer starts with the built-in derived accessors.
    #[serde(default)]
    pub builtin_accessors: bool,
}

impl ManagerConfig {
    /// Creates a config with unbounded buffers and no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds every buffer without an override to `max_length` values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `max_length` is zero.
    pub fn with_max_length(mut self, max_length: usize) -> Result<Self> {
        self.default = BufferConfig::bounded(max_length)?;
        Ok(self)
    }

    /// Sets the shared capacity policy.
    pub fn with_default(mut self, config: BufferConfig) -> Self {
        self.default = config;
        self
    }

    /// Sets the capacity policy for one label.
    pub fn with_override(mut self, label: impl Into<String>, config: BufferConfig) -> Self {
        self.overrides.insert(label.into(), config);
        self
    }

    /// Starts every buffer with [`AccessorRegistry::with_builtins`].
    pub fn with_builtin_accessors(mut self, enabled: bool) -> Self {
        self.builtin_accessors = enabled;
        self
    }

    /// Returns the capacity policy for `label`.
    #[must_use]
    pub fn config_for(&self, label: &str) -> BufferConfig {
        self.overrides.get(label).copied().unwrap_or(self.default)
    }
}

/// Owns one [`Buffer`] per label, in construction order.
#[derive(Debug, Clone)]
pub struct BufferManager {
    /// Buffers keyed by their own label.
    buffers: IndexMap<String, Buffer>,
    /// Accessors registered on every buffer.
    accessors: AccessorRegistry,
}

impl BufferManager {
    /// Creates one unbounded buffer per label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateLabel`] if a label repeats.
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_config(labels, ManagerConfig::default())
    }

    /// Creates one buffer per label using `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateLabel`] if a label repeats, or
    /// [`Error::Configuration`] if `config` overrides a label that is not in
    /// `labels`.
    pub fn with_config<I, S>(labels: I, config: ManagerConfig) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let accessors = if config.builtin_accessors {
            AccessorRegistry::with_builtins()
        } else {
            AccessorRegistry::new()
        };

        let mut buffers = IndexMap::new();
        for label in labels {
            match buffers.entry(label.into()) {
                Entry::Occupied(entry) => {
                    return Err(Error::DuplicateLabel(entry.key().clone()));
                }
                Entry::Vacant(entry) => {
                    let buffer = Buffer::with_config(entry.key().clone(), config.config_for(entry.key()))
                        .with_accessors(accessors.clone());
                    entry.insert(buffer);
                }
            }
        }

        if let Some(orphan) = config.overrides.keys().find(|l| !buffers.contains_key(*l)) {
            return Err(Error::Configuration(format!(
                "capacity override for unknown label '{orphan}'"
            )));
        }

        debug!(buffers = buffers.len(), default = %config.default, "created buffer manager");
        Ok(Self { buffers, accessors })
    }

    /// Returns the buffer for `label`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLabel`] if no buffer has that label.
    pub fn get(&self, label: &str) -> Result<&Buffer> {
        self.buffers
            .get(label)
            .ok_or_else(|| Error::UnknownLabel(label.to_string()))
    }

    /// Returns the buffer for `label` for mutation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLabel`] if no buffer has that label.
    pub fn get_mut(&mut self, label: &str) -> Result<&mut Buffer> {
        self.buffers
            .get_mut(label)
            .ok_or_else(|| Error::UnknownLabel(label.to_string()))
    }

    /// Returns the values of the buffer for `label`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLabel`] if no buffer has that label.
    pub fn get_data(&self, label: &str) -> Result<&[Value]> {
        Ok(self.get(label)?.snapshot())
    }

    /// Appends `value` to the buffer for `label`, returning the evicted value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLabel`] if no buffer has that label.
    pub fn add(&mut self, label: &str, value: impl Into<Value>) -> Result<Option<Value>> {
        Ok(self.get_mut(label)?.append(value))
    }

    /// Iterates over the labels in construction order.
    ///
    /// The iterator is lazy and `Clone`; call `labels()` again to restart.
    pub fn labels(&self) -> Labels<'_> {
        Labels {
            inner: self.buffers.keys(),
        }
    }

    /// Iterates over `(label, buffer)` pairs in construction order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Buffer)> + '_ {
        self.buffers.iter().map(|(label, buffer)| (label.as_str(), buffer))
    }

    /// Returns true if a buffer has `label`.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.buffers.contains_key(label)
    }

    /// Returns the number of buffers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Returns true if the manager holds no buffers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Removes every value from the buffer for `label`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLabel`] if no buffer has that label.
    pub fn clear(&mut self, label: &str) -> Result<()> {
        self.get_mut(label)?.clear();
        Ok(())
    }

    /// Replaces the values of `target` with a copy of the values of `source`.
    /// The target's own bound applies. Copying a buffer onto itself does
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLabel`] if either label is unknown.
    pub fn copy_data(&mut self, source: &str, target: &str) -> Result<()> {
        let values = self.get(source)?.to_vec();
        let target_buffer = self.get_mut(target)?;
        if source != target {
            target_buffer.replace(values);
        }
        Ok(())
    }

    /// Copies `source` onto `target`, then clears `source`. Moving a buffer
    /// onto itself does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLabel`] if either label is unknown.
    pub fn move_data(&mut self, source: &str, target: &str) -> Result<()> {
        self.copy_data(source, target)?;
        if source != target {
            self.clear(source)?;
        }
        Ok(())
    }

    /// Exports the buffer for `label`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLabel`] or the codec's error.
    pub fn export(&self, label: &str, format: Format) -> Result<Vec<u8>> {
        self.get(label)?.export(format)
    }

    /// Imports `payload` into the buffer for `label`, replacing its values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLabel`] or [`Error::MalformedPayload`].
    pub fn import_data(&mut self, label: &str, format: Format, payload: &[u8]) -> Result<()> {
        self.get_mut(label)?.import_data(format, payload)
    }

    /// Registers a derived accessor on every buffer.
    pub fn register_accessor<A>(&mut self, name: impl Into<String>, accessor: A)
    where
        A: DerivedAccessor + 'static,
    {
        self.register_shared(name.into(), Arc::new(accessor));
    }

    /// Registers a closure or function as a derived accessor on every buffer.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Series<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        self.accessors.register_fn(name.clone(), f);
        if let Some(shared) = self.accessors.get(&name).cloned() {
            self.register_shared(name, shared);
        }
    }

    fn register_shared(&mut self, name: String, accessor: Arc<dyn DerivedAccessor>) {
        for buffer in self.buffers.values_mut() {
            buffer
                .accessors_mut()
                .register_shared(name.clone(), Arc::clone(&accessor));
        }
        self.accessors.register_shared(name, accessor);
    }

    /// Returns the accessors shared by every buffer.
    #[must_use]
    pub fn accessor_registry(&self) -> &AccessorRegistry {
        &self.accessors
    }
}

/// Iterator over a manager's labels, in construction order.
#[derive(Debug, Clone)]
pub struct Labels<'a> {
    inner: Keys<'a, String, Buffer>,
}

impl<'a> Iterator for Labels<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.inner.next().map(String::as_str)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Labels<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(String::as_str)
    }
}

impl ExactSizeIterator for Labels<'_> {}

impl FusedIterator for Labels<'_> {}

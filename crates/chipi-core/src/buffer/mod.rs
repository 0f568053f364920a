//! Labeled, history-aware buffers.
//!
//! A [`Buffer`] is an ordered sequence of [`Value`]s with a label and an
//! optional capacity bound. Values are only ever appended at the back and
//! evicted from the front, so the newest value is always observable as
//! [`Buffer::current_value`] and the one before it as
//! [`Buffer::previous_value`].
//!
//! ```text
//!   max_length = 3
//!
//!   append(1), append(2), append(3)     [1, 2, 3]
//!   append(4)                           [2, 3, 4]   (1 evicted)
//!                                            │  └── current_value
//!                                            └───── previous_value
//! ```
//!
//! # Usage
//!
//! ```
//! use chipi_core::Buffer;
//! use chipi_common::Value;
//!
//! let mut buf = Buffer::bounded("temperature", 2).unwrap();
//! buf.append(1);
//! buf.append(2);
//! buf.append(3);
//!
//! assert_eq!(buf.snapshot(), &[Value::from(2), Value::from(3)]);
//! assert_eq!(buf.current_value().unwrap(), &Value::from(3));
//! assert_eq!(buf.previous_value().unwrap(), &Value::from(2));
//! ```

mod accessor;
mod config;
mod stats;

pub use accessor::{AccessorRegistry, DerivedAccessor, Series};
pub use config::BufferConfig;

use std::fmt;

use chipi_common::types::Value;
use chipi_common::utils::error::{Error, Result};
use tracing::{debug, trace, warn};

use crate::codec::{Decoded, Format, codec_for};

/// An ordered, optionally bounded sequence of values.
#[derive(Clone)]
pub struct Buffer {
    /// Identifying label, fixed at creation.
    label: String,
    /// Capacity policy.
    config: BufferConfig,
    /// Values, oldest first. Slots before `head` were evicted and are
    /// reclaimed by the next compaction.
    data: Vec<Value>,
    /// Index of the oldest live value in `data`.
    head: usize,
    /// Named derived accessors.
    accessors: AccessorRegistry,
}

impl Buffer {
    /// Creates an empty, unbounded buffer.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_config(label, BufferConfig::unbounded())
    }

    /// Creates an empty buffer holding at most `max_length` values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `max_length` is zero.
    pub fn bounded(label: impl Into<String>, max_length: usize) -> Result<Self> {
        Ok(Self::with_config(label, BufferConfig::bounded(max_length)?))
    }

    /// Creates an empty buffer with the given capacity policy.
    #[must_use]
    pub fn with_config(label: impl Into<String>, config: BufferConfig) -> Self {
        Self {
            label: label.into(),
            config,
            data: Vec::new(),
            head: 0,
            accessors: AccessorRegistry::new(),
        }
    }

    /// Attaches a set of derived accessors, replacing the current set.
    #[must_use]
    pub fn with_accessors(mut self, accessors: AccessorRegistry) -> Self {
        self.accessors = accessors;
        self
    }

    /// Returns the label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the capacity policy.
    #[must_use]
    pub fn config(&self) -> BufferConfig {
        self.config
    }

    /// Returns the capacity bound, if any.
    #[must_use]
    pub fn max_length(&self) -> Option<usize> {
        self.config.max_length()
    }

    /// Changes the capacity bound, evicting the oldest values if the buffer
    /// is now over capacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for `Some(0)`; the buffer is unchanged.
    pub fn set_max_length(&mut self, max_length: Option<usize>) -> Result<()> {
        self.config = BufferConfig::from_max_length(max_length)?;
        self.enforce_capacity();
        Ok(())
    }

    /// Returns the number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() - self.head
    }

    /// Returns true if the buffer holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the buffer is bounded and at its bound.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.max_length().is_some_and(|max| self.len() >= max)
    }

    /// Appends a value, evicting the oldest one if the bound is exceeded.
    ///
    /// Returns the evicted value. Overflow is never an error. Evicted slots
    /// are reclaimed in bulk once there are as many as live values, so
    /// appending to a full buffer is amortized O(1).
    pub fn append(&mut self, value: impl Into<Value>) -> Option<Value> {
        self.data.push(value.into());
        let max = self.max_length()?;
        if self.len() <= max {
            return None;
        }
        let evicted = std::mem::take(&mut self.data[self.head]);
        self.head += 1;
        if self.head >= max {
            self.compact();
        }
        trace!(label = %self.label, "evicted oldest value");
        Some(evicted)
    }

    /// Returns the newest value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyBuffer`] if the buffer is empty.
    pub fn current_value(&self) -> Result<&Value> {
        self.series().current()
    }

    /// Returns the value appended before the newest one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InsufficientHistory`] with fewer than two values.
    pub fn previous_value(&self) -> Result<&Value> {
        self.series().previous()
    }

    /// Returns all values, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> &[Value] {
        &self.data[self.head..]
    }

    /// Returns an owned copy of all values, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.snapshot().to_vec()
    }

    /// Returns the value at `index` (0 is the oldest).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.snapshot().get(index)
    }

    /// Iterates over the values, oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.snapshot().iter()
    }

    /// Returns the read-only view handed to derived accessors.
    #[must_use]
    pub fn series(&self) -> Series<'_> {
        Series::new(&self.label, self.snapshot())
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        self.data.clear();
        self.head = 0;
    }

    /// Replaces the contents with `values`, keeping only the newest
    /// `max_length` of them if bounded.
    pub fn replace(&mut self, values: impl IntoIterator<Item = Value>) {
        self.data = values.into_iter().collect();
        self.head = 0;
        let evicted = self.enforce_capacity();
        debug!(label = %self.label, len = self.len(), evicted, "replaced buffer contents");
    }

    /// Drops values from the front until the bound holds. Returns the
    /// number dropped.
    fn enforce_capacity(&mut self) -> usize {
        self.compact();
        let Some(max) = self.max_length() else {
            return 0;
        };
        let excess = self.data.len().saturating_sub(max);
        if excess > 0 {
            self.data.drain(..excess);
            trace!(label = %self.label, excess, "evicted values over capacity");
        }
        excess
    }

    /// Drops evicted slots from the front of the storage.
    fn compact(&mut self) {
        if self.head > 0 {
            self.data.drain(..self.head);
            self.head = 0;
        }
    }

    // === Interchange ===

    /// Serializes the label and values with the codec for `format`.
    ///
    /// # Errors
    ///
    /// Returns an error if the codec cannot encode a value.
    pub fn export(&self, format: Format) -> Result<Vec<u8>> {
        codec_for(format).encode(&self.label, self.snapshot())
    }

    /// Decodes `payload` with the codec for `format` and replaces the
    /// contents with the decoded values, re-applying the bound.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedPayload`] if the payload cannot be parsed.
    /// The buffer is left untouched on failure.
    pub fn import_data(&mut self, format: Format, payload: &[u8]) -> Result<()> {
        let decoded = codec_for(format).decode(payload)?;
        self.import_decoded(decoded);
        Ok(())
    }

    /// Replaces the contents with values a codec already decoded,
    /// re-applying the bound. Used to stage several imports before applying
    /// any of them.
    pub fn import_decoded(&mut self, decoded: Decoded) {
        if let Some(label) = decoded.label.as_deref() {
            if label != self.label {
                warn!(
                    buffer = %self.label,
                    payload_label = label,
                    "importing payload exported from a different buffer"
                );
            }
        }
        self.replace(decoded.values);
    }

    // === Derived accessors ===

    /// Registers a derived accessor on this buffer.
    pub fn register_accessor<A>(&mut self, name: impl Into<String>, accessor: A)
    where
        A: DerivedAccessor + 'static,
    {
        self.accessors.register(name, accessor);
    }

    /// Registers a closure or function as a derived accessor.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Series<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.accessors.register_fn(name, f);
    }

    /// Evaluates the derived accessor `name` over the current values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAccessor`] if `name` is not registered,
    /// otherwise whatever the accessor returns.
    pub fn derive(&self, name: &str) -> Result<Value> {
        self.accessors.evaluate(name, &self.series())
    }

    /// Returns the names of the registered accessors, sorted.
    #[must_use]
    pub fn accessor_names(&self) -> Vec<&str> {
        self.accessors.names()
    }

    /// Returns the accessor registry.
    #[must_use]
    pub fn accessors(&self) -> &AccessorRegistry {
        &self.accessors
    }

    /// Returns the accessor registry for in-place changes.
    pub fn accessors_mut(&mut self) -> &mut AccessorRegistry {
        &mut self.accessors
    }

    // === Queries ===

    /// Returns the index of the first value equal to `value`.
    #[must_use]
    pub fn position(&self, value: &Value) -> Option<usize> {
        self.iter().position(|v| v == value)
    }

    /// Returns the index of the first value satisfying `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&Value) -> bool) -> Option<usize> {
        self.iter().position(|v| predicate(v))
    }

    /// Returns the values satisfying `predicate`, in order.
    pub fn filter(&self, mut predicate: impl FnMut(&Value) -> bool) -> Vec<Value> {
        self.iter().filter(|&v| predicate(v)).cloned().collect()
    }

    /// Returns every `step`-th value, starting with the oldest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `step` is zero.
    pub fn resample(&self, step: usize) -> Result<Vec<Value>> {
        self.slice(0, self.len(), step)
    }

    /// Returns every `step`-th value in `start..end`. Bounds past the end are
    /// clamped; an empty range yields an empty vector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `step` is zero.
    pub fn slice(&self, start: usize, end: usize, step: usize) -> Result<Vec<Value>> {
        if step == 0 {
            return Err(Error::InvalidArgument("step must be positive".to_string()));
        }
        let end = end.min(self.len());
        let start = start.min(end);
        Ok(self.snapshot()[start..end].iter().step_by(step).cloned().collect())
    }

    /// Returns the values newest first. The buffer itself is not reordered.
    #[must_use]
    pub fn reversed(&self) -> Vec<Value> {
        self.iter().rev().cloned().collect()
    }

    /// Returns the values sorted ascending, or descending if `descending`.
    /// The sort is stable and the buffer itself is not reordered. Ints and
    /// floats compare by numeric value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if two values cannot be compared:
    /// different variants (other than int and float), NaN, or maps.
    pub fn sorted(&self, descending: bool) -> Result<Vec<Value>> {
        let mut sorted = self.to_vec();
        if descending {
            sorted.sort_by(|a, b| b.total_cmp(a));
        } else {
            sorted.sort_by(Value::total_cmp);
        }
        // Under the total order, any incomparable pair leaves an
        // incomparable neighbour pair behind.
        for pair in sorted.windows(2) {
            stats::compare(&pair[0], &pair[1])?;
        }
        Ok(sorted)
    }

    /// Returns the values sorted by `key`, ascending or descending. The sort
    /// is stable and the buffer itself is not reordered.
    pub fn sorted_by_key<K, F>(&self, descending: bool, mut key: F) -> Vec<Value>
    where
        K: Ord,
        F: FnMut(&Value) -> K,
    {
        let mut sorted = self.to_vec();
        if descending {
            sorted.sort_by(|a, b| key(b).cmp(&key(a)));
        } else {
            sorted.sort_by_key(key);
        }
        sorted
    }

    /// Returns the distinct values in first-seen order.
    #[must_use]
    pub fn unique(&self) -> Vec<Value> {
        stats::unique(&self.series())
    }

    /// Returns true if there are at least two values and the newest differs
    /// from the one before it. Works for any value type.
    #[must_use]
    pub fn has_changed(&self) -> bool {
        matches!(self.snapshot(), [.., previous, current] if previous != current)
    }

    // === Numeric reductions ===

    /// Returns `current_value - previous_value`.
    ///
    /// # Errors
    ///
    /// [`Error::InsufficientHistory`] with fewer than two values,
    /// [`Error::TypeMismatch`] for non-numeric values.
    pub fn delta(&self) -> Result<Value> {
        stats::delta(&self.series())
    }

    /// Returns `data[later] - data[earlier]`.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfBounds`] for an index past the end,
    /// [`Error::TypeMismatch`] for non-numeric values.
    pub fn point_diff(&self, earlier: usize, later: usize) -> Result<Value> {
        let before = self.value_at(earlier)?;
        let after = self.value_at(later)?;
        after.checked_sub(before)
    }

    /// Returns true if the newest value differs from the one before it.
    ///
    /// Without `epsilon` this is plain inequality; with it, the values must
    /// be numeric and differ by more than `epsilon`. Fewer than two values
    /// means no difference.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] if `epsilon` is given and a value is not numeric.
    pub fn has_difference(&self, epsilon: Option<f64>) -> Result<bool> {
        let [.., previous, current] = self.snapshot() else {
            return Ok(false);
        };
        match epsilon {
            None => Ok(previous != current),
            Some(eps) => Ok((current.to_f64()? - previous.to_f64()?).abs() > eps),
        }
    }

    /// Returns the arithmetic mean as `Float64`.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyBuffer`] if empty, [`Error::TypeMismatch`] for
    /// non-numeric values.
    pub fn mean(&self) -> Result<Value> {
        stats::mean(&self.series())
    }

    /// Returns the smallest value.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyBuffer`] if empty, [`Error::TypeMismatch`] for
    /// incomparable values.
    pub fn min_value(&self) -> Result<Value> {
        stats::min_value(&self.series())
    }

    /// Returns the largest value.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyBuffer`] if empty, [`Error::TypeMismatch`] for
    /// incomparable values.
    pub fn max_value(&self) -> Result<Value> {
        stats::max_value(&self.series())
    }

    fn value_at(&self, index: usize) -> Result<&Value> {
        self.get(index).ok_or(Error::IndexOutOfBounds {
            index,
            len: self.len(),
        })
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("label", &self.label)
            .field("config", &self.config)
            .field("data", &self.snapshot())
            .field("accessors", &self.accessors)
            .finish()
    }
}

impl<'a> IntoIterator for &'a Buffer {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::from).collect()
    }

    #[test]
    fn test_buffer_basic() {
        let mut buf = Buffer::new("test");
        assert_eq!(buf.label(), "test");
        assert_eq!(buf.len(), 0);
        assert!(buf.is_empty());
        assert!(matches!(
            buf.current_value(),
            Err(Error::EmptyBuffer { label }) if label == "test"
        ));
        assert!(matches!(
            buf.previous_value(),
            Err(Error::InsufficientHistory { len: 0, .. })
        ));

        buf.append(1);
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.current_value().unwrap(), &Value::from(1));
        assert!(matches!(
            buf.previous_value(),
            Err(Error::InsufficientHistory { len: 1, .. })
        ));

        buf.append(2);
        assert_eq!(buf.current_value().unwrap(), &Value::from(2));
        assert_eq!(buf.previous_value().unwrap(), &Value::from(1));

        buf.clear();
        assert!(buf.is_empty());
        assert!(buf.current_value().is_err());
    }

    #[test]
    fn test_bounded_eviction() {
        let mut buf = Buffer::bounded("b", 2).unwrap();
        assert_eq!(buf.append(1), None);
        assert_eq!(buf.append(2), None);
        assert!(buf.is_full());
        assert_eq!(buf.append(3), Some(Value::from(1)));

        assert_eq!(buf.snapshot(), ints(&[2, 3]).as_slice());
        assert_eq!(buf.current_value().unwrap(), &Value::from(3));
        assert_eq!(buf.previous_value().unwrap(), &Value::from(2));
    }

    #[test]
    fn test_invalid_max_length() {
        assert!(matches!(
            Buffer::bounded("b", 0),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_set_max_length_evicts_oldest() {
        let mut buf = Buffer::new("b");
        for i in 0..5 {
            buf.append(i);
        }
        buf.set_max_length(Some(2)).unwrap();
        assert_eq!(buf.snapshot(), ints(&[3, 4]).as_slice());

        assert!(buf.set_max_length(Some(0)).is_err());
        assert_eq!(buf.max_length(), Some(2));

        buf.set_max_length(None).unwrap();
        buf.append(5);
        buf.append(6);
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn test_replace_keeps_newest() {
        let mut buf = Buffer::bounded("b", 3).unwrap();
        buf.replace(ints(&[1, 2, 3, 4, 5]));
        assert_eq!(buf.snapshot(), ints(&[3, 4, 5]).as_slice());
    }

    #[test]
    fn test_export_import_json() {
        let mut buf = Buffer::new("temps");
        buf.append(20);
        buf.append(21.5);
        buf.append("n/a");

        let payload = buf.export(Format::Json).unwrap();
        let mut restored = Buffer::new("temps");
        restored.append(99);
        restored.import_data(Format::Json, &payload).unwrap();
        assert_eq!(restored.snapshot(), buf.snapshot());
    }

    #[test]
    fn test_import_respects_bound() {
        let mut source = Buffer::new("s");
        for i in 0..10 {
            source.append(i);
        }
        let payload = source.export(Format::Csv).unwrap();

        let mut target = Buffer::bounded("s", 4).unwrap();
        target.import_data(Format::Csv, &payload).unwrap();
        assert_eq!(target.snapshot(), ints(&[6, 7, 8, 9]).as_slice());
    }

    #[test]
    fn test_import_malformed_leaves_data() {
        let mut buf = Buffer::new("b");
        buf.append(1);
        let err = buf.import_data(Format::Json, b"{not json").unwrap_err();
        assert!(matches!(err, Error::MalformedPayload { .. }));
        assert_eq!(buf.snapshot(), ints(&[1]).as_slice());
    }

    #[test]
    fn test_derived_accessors() {
        let mut buf = Buffer::new("b").with_accessors(AccessorRegistry::with_builtins());
        buf.register_fn("average_value", |series: &Series<'_>| {
            let mut total = 0.0;
            for value in series.iter() {
                total += value.to_f64()?;
            }
            Ok(Value::from(total / series.len() as f64))
        });

        buf.append(2);
        buf.append(4);
        assert_eq!(buf.derive("average_value").unwrap(), Value::from(3.0));
        assert_eq!(buf.derive("max_value").unwrap(), Value::from(4));
        assert!(buf.accessor_names().contains(&"average_value"));
        assert!(matches!(
            buf.derive("median"),
            Err(Error::UnknownAccessor(_))
        ));
    }

    #[test]
    fn test_queries() {
        let mut buf = Buffer::new("b");
        for v in [3, 2, 1] {
            buf.append(v);
        }

        assert_eq!(buf.position(&Value::from(2)), Some(1));
        assert_eq!(buf.position(&Value::from(9)), None);
        assert_eq!(buf.find(|v| v == &Value::from(2)), Some(1));
        assert_eq!(
            buf.filter(|v| v.as_int64().is_some_and(|n| n % 2 == 0)),
            ints(&[2])
        );
        assert_eq!(buf.resample(2).unwrap(), ints(&[3, 1]));
        assert_eq!(buf.slice(0, 2, 1).unwrap(), ints(&[3, 2]));
        assert_eq!(buf.slice(1, 100, 1).unwrap(), ints(&[2, 1]));
        assert_eq!(buf.slice(5, 2, 1).unwrap(), Vec::<Value>::new());
        assert!(matches!(buf.resample(0), Err(Error::InvalidArgument(_))));
        assert_eq!(buf.reversed(), ints(&[1, 2, 3]));
        assert_eq!(buf.sorted(false).unwrap(), ints(&[1, 2, 3]));
        assert_eq!(buf.sorted(true).unwrap(), ints(&[3, 2, 1]));

        // The buffer itself keeps insertion order.
        assert_eq!(buf.snapshot(), ints(&[3, 2, 1]).as_slice());
    }

    #[test]
    fn test_sorted_incomparable() {
        let mut buf = Buffer::new("b");
        buf.append(1);
        buf.append("one");
        assert!(matches!(buf.sorted(false), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_sorted_mixed_large() {
        let mut buf = Buffer::new("b");
        for i in 0..600_i64 {
            if i % 33 == 5 {
                buf.append(format!("s{i}"));
            } else {
                buf.append((i * 7919) % 1000);
            }
        }
        for descending in [false, true] {
            assert!(matches!(
                buf.sorted(descending),
                Err(Error::TypeMismatch { .. })
            ));
        }
    }

    #[test]
    fn test_sorted_nan() {
        let mut buf = Buffer::new("b");
        for i in 0..500 {
            buf.append(f64::from(i) * 0.5);
        }
        buf.append(f64::NAN);
        assert!(matches!(buf.sorted(false), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_sorted_ints_and_floats() {
        let mut buf = Buffer::new("b");
        for v in [Value::from(3), Value::from(1.5), Value::from(2.0), Value::from(2), Value::from(-1.0)] {
            buf.append(v);
        }
        assert_eq!(
            buf.sorted(false).unwrap(),
            vec![
                Value::from(-1.0),
                Value::from(1.5),
                Value::from(2.0),
                Value::from(2),
                Value::from(3),
            ]
        );
        assert_eq!(
            buf.sorted(true).unwrap(),
            vec![
                Value::from(3),
                Value::from(2.0),
                Value::from(2),
                Value::from(1.5),
                Value::from(-1.0),
            ]
        );
    }

    #[test]
    fn test_sorted_by_key() {
        let mut buf = Buffer::new("b");
        for word in ["pear", "fig", "banana", "kiwi"] {
            buf.append(word);
        }
        let by_len = |v: &Value| v.as_str().map_or(0, str::len);
        assert_eq!(
            buf.sorted_by_key(false, by_len),
            vec![
                Value::from("fig"),
                Value::from("pear"),
                Value::from("kiwi"),
                Value::from("banana"),
            ]
        );
        assert_eq!(
            buf.sorted_by_key(true, by_len),
            vec![
                Value::from("banana"),
                Value::from("pear"),
                Value::from("kiwi"),
                Value::from("fig"),
            ]
        );
        assert_eq!(buf.get(0), Some(&Value::from("pear")));
    }

    #[test]
    fn test_many_evictions() {
        let mut buf = Buffer::bounded("b", 3).unwrap();
        for i in 0..50_i64 {
            let evicted = buf.append(i);
            assert_eq!(evicted, (i >= 3).then(|| Value::from(i - 3)));
            let start = (i - 2).max(0);
            assert_eq!(buf.to_vec(), ints(&(start..=i).collect::<Vec<_>>()));
            assert_eq!(buf.current_value().unwrap(), &Value::from(i));
        }
        assert_eq!(buf.get(0), Some(&Value::from(47)));
        assert_eq!(buf.iter().count(), 3);
        assert_eq!(buf.position(&Value::from(49)), Some(2));
        assert_eq!(buf.slice(1, 3, 1).unwrap(), ints(&[48, 49]));
        assert_eq!(buf.export(Format::Json).unwrap(), {
            let mut fresh = Buffer::new("b");
            fresh.replace(ints(&[47, 48, 49]));
            fresh.export(Format::Json).unwrap()
        });
        assert!(!format!("{buf:?}").contains("Null"));

        buf.set_max_length(Some(2)).unwrap();
        assert_eq!(buf.snapshot(), ints(&[48, 49]).as_slice());
        buf.set_max_length(None).unwrap();
        buf.append(50);
        assert_eq!(buf.snapshot(), ints(&[48, 49, 50]).as_slice());
    }

    #[test]
    fn test_numeric_reductions() {
        let mut buf = Buffer::new("b");
        buf.append(1);
        buf.append(3);
        assert_eq!(buf.delta().unwrap(), Value::from(2));
        assert_eq!(buf.point_diff(0, 1).unwrap(), Value::from(2));
        assert!(matches!(
            buf.point_diff(0, 5),
            Err(Error::IndexOutOfBounds { index: 5, len: 2 })
        ));
        assert!(buf.has_difference(None).unwrap());
        assert!(buf.has_difference(Some(1.5)).unwrap());
        assert!(!buf.has_difference(Some(2.0)).unwrap());
        assert_eq!(buf.mean().unwrap(), Value::from(2.0));
        assert_eq!(buf.min_value().unwrap(), Value::from(1));
        assert_eq!(buf.max_value().unwrap(), Value::from(3));
    }

    #[test]
    fn test_non_numeric_difference() {
        let mut buf = Buffer::new("b");
        assert!(!buf.has_changed());
        buf.append("apple");
        buf.append("banana");
        assert!(buf.has_changed());
        assert!(buf.has_difference(None).unwrap());
        assert!(matches!(
            buf.has_difference(Some(0.1)),
            Err(Error::TypeMismatch { .. })
        ));
        buf.append("banana");
        assert!(!buf.has_changed());
    }

    #[test]
    fn test_unique() {
        let mut buf = Buffer::new("b");
        for v in [1, 1, 2, 2, 3, 3, 3] {
            buf.append(v);
        }
        assert_eq!(buf.unique(), ints(&[1, 2, 3]));
    }

    proptest! {
        #[test]
        fn prop_unbounded_keeps_everything(values in prop::collection::vec(any::<i64>(), 0..64)) {
            let mut buf = Buffer::new("p");
            for &v in &values {
                buf.append(v);
            }
            prop_assert_eq!(buf.to_vec(), ints(&values));
            match values.as_slice() {
                [] => {
                    prop_assert!(buf.current_value().is_err());
                    prop_assert!(buf.previous_value().is_err());
                }
                [only] => {
                    prop_assert_eq!(buf.current_value().unwrap(), &Value::from(*only));
                    prop_assert!(buf.previous_value().is_err());
                }
                [.., previous, current] => {
                    prop_assert_eq!(buf.current_value().unwrap(), &Value::from(*current));
                    prop_assert_eq!(buf.previous_value().unwrap(), &Value::from(*previous));
                }
            }
        }

        #[test]
        fn prop_bounded_keeps_newest(
            max in 1usize..16,
            values in prop::collection::vec(any::<i64>(), 0..64),
        ) {
            let mut buf = Buffer::bounded("p", max).unwrap();
            for &v in &values {
                buf.append(v);
                prop_assert!(buf.len() <= max);
            }
            let keep = values.len().saturating_sub(max);
            prop_assert_eq!(buf.to_vec(), ints(&values[keep..]));
        }

        #[test]
        fn prop_sorted_orders_or_rejects(
            values in prop::collection::vec(
                prop_oneof![
                    8 => any::<i64>().prop_map(Value::Int64),
                    4 => any::<f64>().prop_map(Value::Float64),
                    1 => "[a-z]{0,3}".prop_map(Value::from),
                ],
                0..600,
            ),
        ) {
            let mut buf = Buffer::new("p");
            buf.replace(values);
            match buf.sorted(false) {
                Ok(sorted) => {
                    prop_assert_eq!(sorted.len(), buf.len());
                    for pair in sorted.windows(2) {
                        prop_assert_ne!(pair[0].partial_compare(&pair[1]), Some(std::cmp::Ordering::Greater));
                    }
                }
                Err(e) => {
                    let is_type_mismatch = matches!(e, Error::TypeMismatch { .. });
                    prop_assert!(is_type_mismatch);
                }
            }
        }
    }
}

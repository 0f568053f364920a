//! Derived accessors: named reductions over a buffer's values.
//!
//! Instead of attaching methods to buffers dynamically, callers register a
//! computation under a name and evaluate it by name later:
//!
//! ```
//! use chipi_core::{Buffer, Series};
//! use chipi_common::{Result, Value};
//!
//! let mut buf = Buffer::new("samples");
//! buf.register_fn("sum", |series: &Series<'_>| -> Result<Value> {
//!     let mut total = 0.0;
//!     for value in series.iter() {
//!         total += value.to_f64()?;
//!     }
//!     Ok(Value::from(total))
//! });
//!
//! buf.append(1);
//! buf.append(2.5);
//! assert_eq!(buf.derive("sum").unwrap(), Value::from(3.5));
//! ```

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use chipi_common::types::Value;
use chipi_common::utils::error::{Error, Result};
use hashbrown::HashMap;

use super::stats;

/// Read-only view of a buffer's values handed to derived accessors.
///
/// Dereferences to the ordered slice of values, oldest first.
#[derive(Debug, Clone, Copy)]
pub struct Series<'a> {
    label: &'a str,
    values: &'a [Value],
}

impl<'a> Series<'a> {
    /// Creates a view over `values` labeled `label`.
    #[must_use]
    pub fn new(label: &'a str, values: &'a [Value]) -> Self {
        Self { label, values }
    }

    /// Returns the label of the underlying buffer.
    #[must_use]
    pub fn label(&self) -> &'a str {
        self.label
    }

    /// Returns the values, oldest first.
    #[must_use]
    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Returns the newest value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyBuffer`] if there are no values.
    pub fn current(&self) -> Result<&'a Value> {
        self.values.last().ok_or_else(|| Error::EmptyBuffer {
            label: self.label.to_string(),
        })
    }

    /// Returns the value before the newest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InsufficientHistory`] with fewer than two values.
    pub fn previous(&self) -> Result<&'a Value> {
        match self.values {
            [.., previous, _] => Ok(previous),
            _ => Err(Error::InsufficientHistory {
                label: self.label.to_string(),
                len: self.values.len(),
            }),
        }
    }

    /// Fails with [`Error::EmptyBuffer`] if there are no values.
    pub fn require_non_empty(&self) -> Result<()> {
        self.current().map(|_| ())
    }
}

impl Deref for Series<'_> {
    type Target = [Value];

    fn deref(&self) -> &[Value] {
        self.values
    }
}

/// A named computation over a buffer's ordered values.
///
/// Implementations must be pure: the result depends only on the series.
pub trait DerivedAccessor: Send + Sync {
    /// Reduces the series to a single value.
    fn compute(&self, series: &Series<'_>) -> Result<Value>;
}

/// Adapts a closure or function into a [`DerivedAccessor`].
struct FnAccessor<F>(F);

impl<F> DerivedAccessor for FnAccessor<F>
where
    F: Fn(&Series<'_>) -> Result<Value> + Send + Sync,
{
    fn compute(&self, series: &Series<'_>) -> Result<Value> {
        (self.0)(series)
    }
}

/// Registry of derived accessors keyed by name.
///
/// Accessors are shared behind `Arc`, so cloning a registry (or registering
/// one accessor on many buffers) copies pointers, never computations.
#[derive(Clone, Default)]
pub struct AccessorRegistry {
    accessors: HashMap<String, Arc<dyn DerivedAccessor>>,
}

impl AccessorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in reductions:
    ///
    /// | Name | Result |
    /// |------|--------|
    /// | `len` | number of values |
    /// | `mean` | arithmetic mean (`Float64`) |
    /// | `min_value` | smallest value |
    /// | `max_value` | largest value |
    /// | `delta` | current minus previous |
    /// | `unique` | distinct values in first-seen order (`List`) |
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_fn("len", |series: &Series<'_>| Ok(Value::Int64(series.len() as i64)));
        registry.register_fn("mean", stats::mean);
        registry.register_fn("min_value", stats::min_value);
        registry.register_fn("max_value", stats::max_value);
        registry.register_fn("delta", stats::delta);
        registry.register_fn("unique", |series: &Series<'_>| {
            Ok(Value::List(stats::unique(series)))
        });
        registry
    }

    /// Registers an accessor, returning the one it replaced.
    pub fn register<A>(
        &mut self,
        name: impl Into<String>,
        accessor: A,
    ) -> Option<Arc<dyn DerivedAccessor>>
    where
        A: DerivedAccessor + 'static,
    {
        self.register_shared(name, Arc::new(accessor))
    }

    /// Registers a closure or function, returning the accessor it replaced.
    pub fn register_fn<F>(
        &mut self,
        name: impl Into<String>,
        f: F,
    ) -> Option<Arc<dyn DerivedAccessor>>
    where
        F: Fn(&Series<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(name, FnAccessor(f))
    }

    /// Registers an already shared accessor.
    pub fn register_shared(
        &mut self,
        name: impl Into<String>,
        accessor: Arc<dyn DerivedAccessor>,
    ) -> Option<Arc<dyn DerivedAccessor>> {
        self.accessors.insert(name.into(), accessor)
    }

    /// Removes an accessor. Returns true if it was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.accessors.remove(name).is_some()
    }

    /// Returns the accessor registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn DerivedAccessor>> {
        self.accessors.get(name)
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.accessors.contains_key(name)
    }

    /// Evaluates the accessor `name` over `series`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAccessor`] if nothing is registered under
    /// `name`, otherwise whatever the accessor returns.
    pub fn evaluate(&self, name: &str, series: &Series<'_>) -> Result<Value> {
        self.get(name)
            .ok_or_else(|| Error::UnknownAccessor(name.to_string()))?
            .compute(series)
    }

    /// Copies every accessor of `other` into this registry, replacing
    /// same-named entries.
    pub fn extend_from(&mut self, other: &AccessorRegistry) {
        for (name, accessor) in &other.accessors {
            self.accessors.insert(name.clone(), Arc::clone(accessor));
        }
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.accessors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered accessors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    /// Returns true if no accessor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }
}

impl fmt::Debug for AccessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountAbove(f64);

    impl DerivedAccessor for CountAbove {
        fn compute(&self, series: &Series<'_>) -> Result<Value> {
            let mut count = 0;
            for value in series.iter() {
                if value.to_f64()? > self.0 {
                    count += 1;
                }
            }
            Ok(Value::Int64(count))
        }
    }

    fn values(items: &[i64]) -> Vec<Value> {
        items.iter().copied().map(Value::from).collect()
    }

    #[test]
    fn test_series_history() {
        let data = values(&[1, 2, 3]);
        let series = Series::new("s", &data);
        assert_eq!(series.current().unwrap(), &Value::from(3));
        assert_eq!(series.previous().unwrap(), &Value::from(2));

        let one = values(&[7]);
        let series = Series::new("s", &one);
        assert!(matches!(
            series.previous(),
            Err(Error::InsufficientHistory { len: 1, .. })
        ));

        let series = Series::new("s", &[]);
        assert!(matches!(series.current(), Err(Error::EmptyBuffer { .. })));
    }

    #[test]
    fn test_register_and_evaluate() {
        let mut registry = AccessorRegistry::new();
        assert!(registry.is_empty());

        registry.register("above_one", CountAbove(1.0));
        registry.register_fn("first", |series: &Series<'_>| {
            series
                .first()
                .cloned()
                .ok_or_else(|| Error::EmptyBuffer {
                    label: series.label().to_string(),
                })
        });

        let data = values(&[1, 2, 3]);
        let series = Series::new("s", &data);
        assert_eq!(registry.evaluate("above_one", &series).unwrap(), Value::from(2));
        assert_eq!(registry.evaluate("first", &series).unwrap(), Value::from(1));
        assert_eq!(registry.names(), vec!["above_one", "first"]);
    }

    #[test]
    fn test_unknown_accessor() {
        let registry = AccessorRegistry::new();
        let series = Series::new("s", &[]);
        assert!(matches!(
            registry.evaluate("missing", &series),
            Err(Error::UnknownAccessor(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = AccessorRegistry::new();
        assert!(registry.register("n", CountAbove(0.0)).is_none());
        assert!(registry.register("n", CountAbove(10.0)).is_some());
        assert_eq!(registry.len(), 1);

        let data = values(&[5]);
        let series = Series::new("s", &data);
        assert_eq!(registry.evaluate("n", &series).unwrap(), Value::from(0));

        assert!(registry.unregister("n"));
        assert!(!registry.unregister("n"));
    }

    #[test]
    fn test_builtins() {
        let registry = AccessorRegistry::with_builtins();
        assert_eq!(
            registry.names(),
            vec!["delta", "len", "max_value", "mean", "min_value", "unique"]
        );

        let data = values(&[3, 1, 3, 2]);
        let series = Series::new("s", &data);
        assert_eq!(registry.evaluate("len", &series).unwrap(), Value::from(4));
        assert_eq!(registry.evaluate("mean", &series).unwrap(), Value::from(2.25));
        assert_eq!(registry.evaluate("min_value", &series).unwrap(), Value::from(1));
        assert_eq!(registry.evaluate("max_value", &series).unwrap(), Value::from(3));
        assert_eq!(registry.evaluate("delta", &series).unwrap(), Value::from(-1));
        assert_eq!(
            registry.evaluate("unique", &series).unwrap(),
            Value::from(vec![3, 1, 2])
        );
    }

    #[test]
    fn test_extend_from_shares_accessors() {
        let mut base = AccessorRegistry::new();
        base.register("above", CountAbove(0.0));

        let mut other = AccessorRegistry::with_builtins();
        other.extend_from(&base);
        assert!(other.contains("above"));
        assert!(Arc::ptr_eq(
            base.get("above").unwrap(),
            other.get("above").unwrap()
        ));
    }
}

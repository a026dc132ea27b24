//! Registry mapping statistic type tags to constructors.
//!
//! The registry is an ordinary value: build one, register what you need, and
//! hand it to [`ColumnSchema::parse`](crate::ColumnSchema::parse). It is only
//! read after construction, so a shared reference can be used from any number
//! of threads without locking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::CounterOptions;
use crate::error::{Result, StatError};
use crate::stats::{CounterStat, NumericalStat, Statistic, CATEGORICAL, NUMERICAL};

/// Constructor stored in a [`StatRegistry`].
///
/// Receives the column name and the column's delimiter levels. Statistics that
/// do not tokenize ignore the delimiters.
pub type StatConstructor = Box<dyn Fn(&str, &[String]) -> Arc<dyn Statistic> + Send + Sync>;

/// Factory for [`Statistic`] instances, keyed by type tag.
///
/// # Example
///
/// ```
/// use colstat::StatRegistry;
///
/// let registry = StatRegistry::with_builtins();
/// let stat = registry.create("numerical", "age", &[]).unwrap();
/// assert_eq!(stat.name(), "age");
/// assert!(registry.create("string", "title", &[]).is_err());
/// ```
pub struct StatRegistry {
    constructors: HashMap<String, StatConstructor>,
}

impl StatRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Create a registry holding `numerical` and `categorical`.
    pub fn with_builtins() -> Self {
        Self::with_counter_options(CounterOptions::default())
    }

    /// Create a registry holding the built-ins, with categorical statistics
    /// built using `options`.
    pub fn with_counter_options(options: CounterOptions) -> Self {
        let mut registry = Self::new();
        registry.register(NUMERICAL, |name, _delims| {
            Arc::new(NumericalStat::new(name))
        });
        registry.register(CATEGORICAL, move |name, delims| {
            Arc::new(CounterStat::with_options(name, delims.to_vec(), options))
        });
        registry
    }

    /// Associate `tag` with a constructor, replacing any previous one.
    pub fn register<F>(&mut self, tag: impl Into<String>, constructor: F)
    where
        F: Fn(&str, &[String]) -> Arc<dyn Statistic> + Send + Sync + 'static,
    {
        self.constructors.insert(tag.into(), Box::new(constructor));
    }

    /// Build a fresh statistic of type `tag` for the column `name`.
    pub fn create(&self, tag: &str, name: &str, delims: &[String]) -> Result<Arc<dyn Statistic>> {
        let constructor = self
            .constructors
            .get(tag)
            .ok_or_else(|| StatError::UnknownType {
                tag: tag.to_string(),
            })?;
        Ok(constructor(name, delims))
    }

    /// Whether `tag` has a constructor.
    pub fn contains(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Registered type tags, sorted.
    pub fn type_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl Default for StatRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for StatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatRegistry")
            .field("type_tags", &self.type_tags())
            .finish()
    }
}

//! Column specification parsing.
//!
//! A column spec is a comma-separated list of `type-name` entries, one per
//! field of every input row, e.g. `numerical-age,categorical-country`. Parsing
//! a spec instantiates one [`Statistic`] per column through a
//! [`StatRegistry`].

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Result, StatError};
use crate::registry::StatRegistry;
use crate::stats::Statistic;

/// Declared type and name of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    /// Statistic type tag, e.g. `numerical`
    #[serde(rename = "type")]
    pub stat_type: String,
    /// Display name of the column
    pub name: String,
}

impl ColumnInfo {
    /// Create a column description.
    pub fn new(stat_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            stat_type: stat_type.into(),
            name: name.into(),
        }
    }

    /// Parse a single `type-name` entry.
    fn parse_entry(entry: &str) -> Result<Self> {
        let malformed = || StatError::MalformedSpec {
            entry: entry.to_string(),
        };
        let mut parts = entry.trim().split('-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(stat_type), Some(name), None) if !name.is_empty() => {
                Ok(Self::new(stat_type, name))
            }
            _ => Err(malformed()),
        }
    }
}

/// Ordered columns with the statistic bound to each.
///
/// Column `i` receives field `i` of every row. The schema owns its
/// statistics; [`statistics`](Self::statistics) hands out shared handles so
/// workers on several threads can feed the same column.
///
/// # Example
///
/// ```
/// use colstat::{ColumnSchema, StatRegistry};
///
/// let registry = StatRegistry::with_builtins();
/// let schema = ColumnSchema::parse("numerical-age,categorical-city", &registry).unwrap();
/// assert_eq!(schema.len(), 2);
/// assert_eq!(schema.columns()[1].name, "city");
/// ```
#[derive(Debug)]
pub struct ColumnSchema {
    columns: Vec<ColumnInfo>,
    stats: Vec<Arc<dyn Statistic>>,
}

impl ColumnSchema {
    /// Parse a column spec; categorical columns count whole values only.
    ///
    /// Each entry must split on `-` into exactly two parts, and the name part
    /// must not be empty: `numerical-` is rejected with
    /// [`StatError::MalformedSpec`] even though it has exactly one dash.
    pub fn parse(spec: &str, registry: &StatRegistry) -> Result<Self> {
        Self::parse_with_levels(spec, registry, &HashMap::new())
    }

    /// Parse a column spec, giving the named columns delimiter levels.
    ///
    /// `levels` maps a column name to the ordered delimiter sets for its
    /// tokenization hierarchy. Every key must name a column in `spec`.
    /// Every entry is checked before any statistic is built.
    pub fn parse_with_levels(
        spec: &str,
        registry: &StatRegistry,
        levels: &HashMap<String, Vec<String>>,
    ) -> Result<Self> {
        let columns = spec
            .split(',')
            .map(ColumnInfo::parse_entry)
            .collect::<Result<Vec<_>>>()?;

        if let Some(unknown) = levels
            .keys()
            .find(|name| !columns.iter().any(|c| &c.name == *name))
        {
            return Err(StatError::InvalidConfig {
                message: format!("split levels given for unknown column '{}'", unknown),
            });
        }

        let stats = columns
            .iter()
            .map(|column| {
                let delims = levels
                    .get(&column.name)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                registry.create(&column.stat_type, &column.name, delims)
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Parsed column spec into {} columns: {:?}",
            columns.len(),
            columns
        );

        Ok(Self { columns, stats })
    }

    /// Declared columns, in spec order.
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// Statistic handles, index-aligned with [`columns`](Self::columns).
    pub fn statistics(&self) -> &[Arc<dyn Statistic>] {
        &self.stats
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns. Never true for a parsed schema.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate over `(column, statistic)` pairs in spec order.
    pub fn iter(&self) -> impl Iterator<Item = (&ColumnInfo, &Arc<dyn Statistic>)> {
        self.columns.iter().zip(self.stats.iter())
    }
}

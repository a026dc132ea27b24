//! Rendering the statistics of a whole schema.
//!
//! Two output formats are supported: plain text, one block per column in
//! declared order, and JSON built from each column's [`StatSummary`].

use std::fmt::Write as _;

use serde::Serialize;

use crate::error::Result;
use crate::schema::ColumnSchema;
use crate::stats::StatSummary;

/// Report entry for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnReport {
    /// Column name
    pub name: String,
    /// Statistic type tag
    #[serde(rename = "type")]
    pub stat_type: String,
    /// Snapshot of the column's statistic
    pub summary: StatSummary,
}

/// Snapshot every column of `schema`, in declared order.
pub fn collect_reports(schema: &ColumnSchema) -> Vec<ColumnReport> {
    schema
        .iter()
        .map(|(column, stat)| ColumnReport {
            name: column.name.clone(),
            stat_type: column.stat_type.clone(),
            summary: stat.summary(),
        })
        .collect()
}

/// Render every column as text.
///
/// Each column gets a `== name (type) ==` header line, its rendered summary,
/// and a blank line.
///
/// # Example
///
/// ```
/// use colstat::{render_text, ColumnSchema, StatRegistry};
///
/// let schema = ColumnSchema::parse("categorical-c", &StatRegistry::with_builtins()).unwrap();
/// schema.statistics()[0].compute("x").unwrap();
/// assert_eq!(render_text(&schema), "== c (categorical) ==\nx\t1\n\n");
/// ```
pub fn render_text(schema: &ColumnSchema) -> String {
    let mut out = String::new();
    for (column, stat) in schema.iter() {
        // Writing to a String cannot fail
        let _ = writeln!(out, "== {} ({}) ==", column.name, column.stat_type);
        out.push_str(&stat.render());
        out.push('\n');
    }
    out
}

/// Render every column as a pretty-printed JSON array.
pub fn render_json(schema: &ColumnSchema) -> Result<String> {
    Ok(serde_json::to_string_pretty(&collect_reports(schema))?)
}

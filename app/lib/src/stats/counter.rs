//! Frequency tables over a hierarchy of tokenizations.
//!
//! A [`CounterStat`] with delimiters `[d0, d1, ...]` keeps one table per
//! depth. Depth 0 counts whole field values. Depth `k + 1` counts the tokens
//! obtained by splitting every depth-`k` token on the character set `dk`.
//!
//! ```text
//! delims = ["|", " "]      field = "red fox||blue fox"
//!
//! depth 0   "red fox||blue fox"        1
//! depth 1   "red fox" 1, "blue fox"    1
//! depth 2   "fox" 2, "blue" 1, "red"   1
//! ```

use std::collections::HashMap;

use parking_lot::Mutex;

use super::{StatSummary, Statistic, CATEGORICAL};
use crate::config::{CounterOptions, TieBreak};
use crate::error::Result;

type FrequencyTable = HashMap<String, u64>;

/// Split `token` on any character of `delims`, merging runs of delimiters.
///
/// A run of adjacent delimiter characters acts as one separator, so no empty
/// piece appears between two tokens. A leading or trailing run still yields
/// one empty piece at that end, and an empty `token` yields a single empty
/// piece. An empty `delims` splits the token into its individual characters.
///
/// # Examples
///
/// ```
/// use colstat::split_compressed;
///
/// assert_eq!(split_compressed("what||are||you", "|"), vec!["what", "are", "you"]);
/// assert_eq!(split_compressed("a, b;c", ", ;"), vec!["a", "b", "c"]);
/// assert_eq!(split_compressed("|a|", "|"), vec!["", "a", ""]);
/// assert_eq!(split_compressed("abc", ""), vec!["a", "b", "c"]);
/// ```
pub fn split_compressed<'a>(token: &'a str, delims: &str) -> Vec<&'a str> {
    if delims.is_empty() {
        return token
            .char_indices()
            .map(|(i, c)| &token[i..i + c.len_utf8()])
            .collect();
    }

    let pieces: Vec<&str> = token.split(|c: char| delims.contains(c)).collect();
    let last = pieces.len() - 1;
    pieces
        .into_iter()
        .enumerate()
        .filter(|(i, piece)| *i == 0 || *i == last || !piece.is_empty())
        .map(|(_, piece)| piece)
        .collect()
}

/// Statistic for categorical columns.
///
/// Counts how often each value occurs and, when delimiters are configured,
/// how often each token occurs at every level of recursive splitting.
///
/// # Example
///
/// ```
/// use colstat::{CounterStat, Statistic};
///
/// let stat = CounterStat::new("color", Vec::new());
/// for field in ["red", "blue", "red"] {
///     stat.compute(field).unwrap();
/// }
/// assert_eq!(stat.render(), "red\t2\nblue\t1\n");
/// ```
#[derive(Debug)]
pub struct CounterStat {
    name: String,
    delims: Vec<String>,
    options: CounterOptions,
    levels: Mutex<Vec<FrequencyTable>>,
}

impl CounterStat {
    /// Create a counter with default options.
    ///
    /// `delims[i]` is the character set used to split tokens at depth `i`.
    pub fn new(name: impl Into<String>, delims: Vec<String>) -> Self {
        Self::with_options(name, delims, CounterOptions::default())
    }

    /// Create a counter with explicit tie-break and root-table options.
    pub fn with_options(
        name: impl Into<String>,
        delims: Vec<String>,
        options: CounterOptions,
    ) -> Self {
        let depth = delims.len() + 1;
        Self {
            name: name.into(),
            delims,
            options,
            levels: Mutex::new(vec![FrequencyTable::new(); depth]),
        }
    }

    /// Configured delimiter sets, one per split level.
    pub fn delimiters(&self) -> &[String] {
        &self.delims
    }

    /// Number of tables kept, including the root table when it is kept.
    pub fn level_count(&self) -> usize {
        self.delims.len() + usize::from(self.keeps_root())
    }

    /// Count recorded for `token` at `depth` (0 = whole values).
    pub fn count(&self, depth: usize, token: &str) -> u64 {
        self.levels
            .lock()
            .get(depth)
            .and_then(|table| table.get(token))
            .copied()
            .unwrap_or(0)
    }

    /// Number of distinct tokens recorded at `depth`.
    pub fn distinct(&self, depth: usize) -> usize {
        self.levels.lock().get(depth).map_or(0, |table| table.len())
    }

    /// Kept tables, each sorted by descending count.
    pub fn sorted_levels(&self) -> Vec<Vec<(String, u64)>> {
        let levels = self.levels.lock();
        let skip = usize::from(!self.keeps_root());
        levels
            .iter()
            .skip(skip)
            .map(|table| self.sorted_entries(table))
            .collect()
    }

    fn keeps_root(&self) -> bool {
        self.options.include_root || self.delims.is_empty()
    }

    fn sorted_entries(&self, table: &FrequencyTable) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> = table
            .iter()
            .map(|(token, count)| (token.clone(), *count))
            .collect();
        let tie_break = self.options.tie_break;
        entries.sort_by(|a, b| {
            b.1.cmp(&a.1).then_with(|| match tie_break {
                TieBreak::Ascending => a.0.cmp(&b.0),
                TieBreak::Descending => b.0.cmp(&a.0),
            })
        });
        entries
    }
}

fn increment(table: &mut FrequencyTable, token: &str) {
    match table.get_mut(token) {
        Some(count) => *count += 1,
        None => {
            table.insert(token.to_string(), 1);
        }
    }
}

impl Statistic for CounterStat {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        CATEGORICAL
    }

    fn compute(&self, field: &str) -> Result<()> {
        let keeps_root = self.keeps_root();
        let mut levels = self.levels.lock();

        // Every pending token is a slice of `field`.
        let mut pending: Vec<(&str, usize)> = vec![(field, 0)];
        while let Some((token, depth)) = pending.pop() {
            if depth > 0 || keeps_root {
                increment(&mut levels[depth], token);
            }
            if let Some(delims) = self.delims.get(depth) {
                pending.extend(
                    split_compressed(token, delims)
                        .into_iter()
                        .map(|piece| (piece, depth + 1)),
                );
            }
        }
        Ok(())
    }

    fn render(&self) -> String {
        self.summary().to_string()
    }

    fn summary(&self) -> StatSummary {
        StatSummary::Categorical {
            levels: self.sorted_levels(),
        }
    }
}

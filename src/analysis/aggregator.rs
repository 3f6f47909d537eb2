//! Grouping, counting and percentage helpers shared by the report views.

use crate::models::CategorizedRecord;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Round to two decimals, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / total * 100`, rounded to two decimals; 0 when `total` is 0.
pub fn percentage(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        round2(part / total * 100.0)
    }
}

/// [`percentage`] for row counts.
pub fn share(part: usize, total: usize) -> f64 {
    percentage(part as f64, total as f64)
}

/// Records grouped by agent, agents ascending, rows in original order.
pub fn group_by_agent(records: &[CategorizedRecord]) -> BTreeMap<&str, Vec<&CategorizedRecord>> {
    let mut grouped: BTreeMap<&str, Vec<&CategorizedRecord>> = BTreeMap::new();

    for record in records {
        grouped.entry(record.agent()).or_default().push(record);
    }

    grouped
}

/// Counter that remembers the order in which keys were first seen.
///
/// Ties are always resolved in favour of the key seen first, which keeps
/// every "most frequent" and "top N" answer deterministic.
#[derive(Debug, Clone)]
pub struct Tally<K> {
    entries: Vec<(K, usize)>,
    index: HashMap<K, usize>,
}

impl<K> Default for Tally<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> Tally<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    pub fn count(&self, key: &K) -> usize {
        self.index.get(key).map(|&pos| self.entries[pos].1).unwrap_or(0)
    }

    /// Highest count; the earliest key wins a tie.
    pub fn most_common(&self) -> Option<(&K, usize)> {
        let mut best: Option<(&K, usize)> = None;
        for (key, count) in &self.entries {
            if best.map_or(true, |(_, top)| *count > top) {
                best = Some((key, *count));
            }
        }
        best
    }

    /// Entries by count descending; equal counts keep first-seen order.
    pub fn ranked(&self) -> Vec<(K, usize)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
        ranked
    }
}

impl<K: Eq + Hash + Clone> FromIterator<K> for Tally<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tally = Tally::new();
        for key in iter {
            tally.add(key);
        }
        tally
    }
}

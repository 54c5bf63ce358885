use std::fmt::Write as _;
use std::ops::Index;
use std::slice;

use super::rule::Rule;

/// An ordered collection of rules belonging to a single phase.
///
/// Declaration order is evaluation order, so the collection only ever appends.
/// Duplicate-id policy lives in the callers: [`Driver`](crate::Driver) scans
/// the whole [`RuleSet`](super::RuleSet) before inserting, while merges go
/// through [`append`](Rules::append) with an explicit exclusion list.
#[derive(Debug, Clone, Default)]
pub struct Rules {
    rules: Vec<Rule>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Rule> {
        self.rules.get_mut(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// Appends a rule unconditionally.
    pub fn insert(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Appends a rule unless its id appears in `excluded`.
    ///
    /// The exclusion check only runs when both `excluded` and `sink` are
    /// given; with either missing the rule is appended unconditionally. When
    /// a rule is skipped, a `Rule id: <id> is duplicated` line is written to
    /// `sink` and `false` is returned.
    ///
    /// `excluded` must be sorted ascending.
    pub fn insert_filtered(
        &mut self,
        rule: Rule,
        excluded: Option<&[i64]>,
        sink: Option<&mut String>,
    ) -> bool {
        if let (Some(excluded), Some(sink)) = (excluded, sink) {
            if excluded.binary_search(&rule.id).is_ok() {
                let _ = writeln!(sink, "Rule id: {} is duplicated", rule.id);
                return false;
            }
        }
        self.rules.push(rule);
        true
    }

    /// Merges a clone of every rule in `other` into this collection.
    ///
    /// The merge is all or nothing: `other` is scanned against `excluded`
    /// first, and on a collision nothing is appended and the offending id is
    /// returned. On success the number of appended rules is returned.
    ///
    /// `excluded` must be sorted ascending.
    pub fn append(
        &mut self,
        other: &Rules,
        excluded: &[i64],
        sink: Option<&mut String>,
    ) -> Result<usize, i64> {
        for rule in &other.rules {
            if excluded.binary_search(&rule.id).is_ok() {
                if let Some(sink) = sink {
                    let _ = writeln!(sink, "Rule id: {} is duplicated", rule.id);
                }
                return Err(rule.id);
            }
        }
        self.rules.extend(other.rules.iter().cloned());
        Ok(other.rules.len())
    }

    /// Renders one line per rule, in evaluation order.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for rule in &self.rules {
            let _ = writeln!(out, "Rule ID: {} -- {}", rule.id, rule);
        }
        out
    }
}

impl Index<usize> for Rules {
    type Output = Rule;

    /// Panics when `index` is out of bounds; use [`get`](Rules::get) for the
    /// checked variant.
    fn index(&self, index: usize) -> &Rule {
        &self.rules[index]
    }
}

impl<'a> IntoIterator for &'a Rules {
    type Item = &'a Rule;
    type IntoIter = slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

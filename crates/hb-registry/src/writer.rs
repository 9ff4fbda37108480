//! Selective bulk writing.
//!
//! A key is written when it contains the filter substring, contains every
//! include token, and contains none of the exclude tokens. Token lists are
//! `:`-separated. Each mapping is walked in key order.

use std::collections::BTreeMap;

use hb_core::{Accumulator, ContainerKind, ObjectSink, Result};

use crate::naming::{ContainerKey, KeySpec};
use crate::registry::Registry;

/// Separator for include/exclude token lists.
pub const LIST_DELIMITER: char = ':';

/// Split `text` on `delimiter`, keeping empty pieces.
///
/// `",a,,b"` splits into `["", "a", "", "b"]`; an empty string yields one
/// empty piece.
pub fn split(text: &str, delimiter: char) -> Vec<String> {
    text.split(delimiter).map(str::to_string).collect()
}

fn parse_list(list: &str) -> Vec<String> {
    if list.is_empty() { Vec::new() } else { split(list, LIST_DELIMITER) }
}

/// Key predicate for bulk writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteFilter {
    substring: String,
    include: Vec<String>,
    exclude: Vec<String>,
}

impl WriteFilter {
    /// Matches every key.
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches keys containing `substring` (empty matches everything).
    pub fn substring(substring: impl Into<String>) -> Self {
        Self { substring: substring.into(), ..Self::default() }
    }

    /// Require every token of the `:`-separated `list`.
    pub fn include(mut self, list: &str) -> Self {
        self.include = parse_list(list);
        self
    }

    /// Reject keys containing any token of the `:`-separated `list`.
    ///
    /// Empty tokens never reject.
    pub fn exclude(mut self, list: &str) -> Self {
        self.exclude = parse_list(list);
        self
    }

    /// Whether `key` passes.
    pub fn matches(&self, key: &str) -> bool {
        key.contains(self.substring.as_str())
            && self.include.iter().all(|t| key.contains(t.as_str()))
            && !self.exclude.iter().any(|t| !t.is_empty() && key.contains(t.as_str()))
    }
}

/// Objects written per mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// 1D histograms.
    pub hist1d: usize,
    /// 2D histograms.
    pub hist2d: usize,
    /// Sparse histograms.
    pub sparse: usize,
    /// Tuples and trees.
    pub records: usize,
    /// Efficiency curves.
    pub efficiency: usize,
}

impl WriteSummary {
    /// Objects written in total.
    pub fn total(&self) -> usize {
        self.hist1d + self.hist2d + self.sparse + self.records + self.efficiency
    }
}

fn write_matching<T, S>(
    map: &BTreeMap<ContainerKey, T>,
    sink: &mut S,
    filter: &WriteFilter,
    kind: ContainerKind,
) -> Result<usize>
where
    T: Accumulator,
    S: ObjectSink + ?Sized,
{
    let mut written = 0;
    for (key, acc) in map {
        if filter.matches(key.as_str()) {
            sink.write_object(acc.to_stored())?;
            written += 1;
        }
    }
    log::debug!("wrote {written}/{} {kind} objects", map.len());
    Ok(written)
}

impl Registry {
    /// Write matching 1D histograms.
    pub fn write_all<S: ObjectSink + ?Sized>(&self, sink: &mut S, filter: &WriteFilter) -> Result<usize> {
        write_matching(&self.hist1d, sink, filter, ContainerKind::Histogram1D)
    }

    /// Write matching 2D histograms.
    pub fn write_all_2d<S: ObjectSink + ?Sized>(&self, sink: &mut S, filter: &WriteFilter) -> Result<usize> {
        write_matching(&self.hist2d, sink, filter, ContainerKind::Histogram2D)
    }

    /// Write matching sparse histograms.
    pub fn write_n<S: ObjectSink + ?Sized>(&self, sink: &mut S, filter: &WriteFilter) -> Result<usize> {
        write_matching(&self.sparse, sink, filter, ContainerKind::SparseND)
    }

    /// Write matching efficiency curves.
    pub fn write_all_eff<S: ObjectSink + ?Sized>(&self, sink: &mut S, filter: &WriteFilter) -> Result<usize> {
        write_matching(&self.efficiency, sink, filter, ContainerKind::Efficiency)
    }

    /// Write tuples and trees whose key contains `substring`.
    pub fn write_all_trees<S: ObjectSink + ?Sized>(&self, sink: &mut S, substring: &str) -> Result<usize> {
        write_matching(&self.records, sink, &WriteFilter::substring(substring), ContainerKind::TreeRecord)
    }

    /// Write every mapping through `filter` (records get its substring part only).
    pub fn write_everything<S: ObjectSink + ?Sized>(
        &self,
        sink: &mut S,
        filter: &WriteFilter,
    ) -> Result<WriteSummary> {
        Ok(WriteSummary {
            hist1d: self.write_all(sink, filter)?,
            hist2d: self.write_all_2d(sink, filter)?,
            sparse: self.write_n(sink, filter)?,
            records: self.write_all_trees(sink, &filter.substring)?,
            efficiency: self.write_all_eff(sink, filter)?,
        })
    }

    /// Write a single 1D histogram. `Ok(false)` on a miss.
    pub fn write_one<'a, S: ObjectSink + ?Sized>(
        &mut self,
        sink: &mut S,
        spec: impl Into<KeySpec<'a>>,
    ) -> Result<bool> {
        let key = spec.into().to_key(ContainerKind::Histogram1D);
        match self.hist1d.get(key.as_str()) {
            Some(h) => {
                sink.write_object(h.to_stored())?;
                Ok(true)
            }
            None => {
                self.record_miss(ContainerKind::Histogram1D, &key, "write");
                Ok(false)
            }
        }
    }

    /// Write everything and release the registry.
    pub fn close<S: ObjectSink + ?Sized>(self, sink: &mut S) -> Result<WriteSummary> {
        let summary = self.write_everything(sink, &WriteFilter::all())?;
        log::debug!(
            "registry closed: {} objects written ({} fills, {} misses)",
            summary.total(),
            self.stats.fills,
            self.stats.misses
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hb_core::AxisSpec;
    use hb_hist::MemorySink;
    use proptest::prelude::*;

    #[test]
    fn split_keeps_empty_pieces() {
        assert_eq!(split(",a,,b", ','), ["", "a", "", "b"]);
        assert_eq!(split("a,", ','), ["a", ""]);
        assert_eq!(split("", ':'), [""]);
        assert_eq!(split("A:B", ':'), ["A", "B"]);
    }

    const KEYS: [&str; 4] = ["xAy", "xBy", "xABy", "xy"];

    fn passing(filter: &WriteFilter) -> Vec<&'static str> {
        KEYS.iter().copied().filter(|k| filter.matches(k)).collect()
    }

    #[test]
    fn include_is_conjunctive() {
        assert_eq!(passing(&WriteFilter::all().include("A:B")), ["xABy"]);
    }

    #[test]
    fn exclude_vetoes_any() {
        assert_eq!(passing(&WriteFilter::all().include("A").exclude("B")), ["xAy"]);
        assert_eq!(passing(&WriteFilter::all().exclude("A:B")), ["xy"]);
    }

    #[test]
    fn empty_lists_and_substring() {
        assert_eq!(passing(&WriteFilter::all()), KEYS);
        assert_eq!(passing(&WriteFilter::all().include("").exclude("")), KEYS);
        assert_eq!(passing(&WriteFilter::all().exclude("::")), KEYS);
        assert_eq!(passing(&WriteFilter::substring("B")), ["xBy", "xABy"]);
        assert_eq!(passing(&WriteFilter::substring("B").exclude("A")), ["xBy"]);
    }

    fn registry() -> Registry {
        let mut reg = Registry::new();
        let axis = AxisSpec::new(2, 0.0, 1.0);
        for name in KEYS {
            reg.create_hist1d_unchanged(name, "", &axis).unwrap();
        }
        reg.create_efficiency("xAy", &axis).unwrap();
        reg.create_tuple("xABy", "a", 100).unwrap();
        reg
    }

    #[test]
    fn write_all_applies_filter_in_key_order() {
        let reg = registry();
        let mut sink = MemorySink::new();
        let n = reg.write_all(&mut sink, &WriteFilter::all().include("A:B")).unwrap();
        assert_eq!(n, 1);
        assert_eq!(sink.names(), ["xABy"]);

        let mut sink = MemorySink::new();
        reg.write_all(&mut sink, &WriteFilter::all()).unwrap();
        assert_eq!(sink.names(), ["xABy", "xAy", "xBy", "xy"]);
    }

    #[test]
    fn trees_use_substring_only() {
        let reg = registry();
        let mut sink = MemorySink::new();
        let summary = reg
            .write_everything(&mut sink, &WriteFilter::substring("AB").exclude("AB"))
            .unwrap();
        assert_eq!(summary.hist1d, 0);
        assert_eq!(summary.records, 1);
        assert_eq!(sink.names(), ["tree_xABy"]);
    }

    #[test]
    fn write_one_and_miss() {
        let mut reg = registry();
        let mut sink = MemorySink::new();
        assert!(reg.write_one(&mut sink, KeySpec::verbatim("xy")).unwrap());
        assert!(!reg.write_one(&mut sink, "xy").unwrap());
        assert_eq!(sink.names(), ["xy"]);
        assert_eq!(reg.stats().misses, 1);
    }

    #[test]
    fn close_writes_every_object_once() {
        let reg = registry();
        let mut sink = MemorySink::new();
        let summary = reg.close(&mut sink).unwrap();
        assert_eq!(summary.total(), 6);
        assert_eq!(summary.efficiency, 1);
        assert_eq!(sink.objects().len(), 6);
    }

    proptest! {
        #[test]
        fn split_join_restores_text(text in "[a-c:]{0,16}") {
            prop_assert_eq!(split(&text, ':').join(":"), text);
        }

        #[test]
        fn key_with_all_tokens_passes_include(tokens in proptest::collection::vec("[A-Z]{1,3}", 1..4)) {
            let key = format!("h1_{}", tokens.concat());
            let filter = WriteFilter::all().include(&tokens.join(":"));
            prop_assert!(filter.matches(&key));
            let vetoed = WriteFilter::all().exclude(&tokens.join(":"));
            prop_assert!(!vetoed.matches(&key));
        }
    }
}

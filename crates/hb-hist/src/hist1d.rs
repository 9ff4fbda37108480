//! Weighted 1D histogram with uniform binning.

use std::collections::BTreeMap;

use hb_core::{Accumulator, Axis, AxisSpec, BinnedAccumulator, StoredObject};

/// A 1D histogram.
///
/// Bin 0 is underflow, bins `1..=n_bins` are regular, bin `n_bins + 1` is
/// overflow.
#[derive(Debug, Clone)]
pub struct Hist1D {
    name: String,
    title: String,
    axis: AxisSpec,
    /// Contents including under/overflow (length = bins + 2).
    contents: Vec<f64>,
    /// Sum of weights squared per cell, once enabled.
    sumw2: Option<Vec<f64>>,
    entries: f64,
    labels: BTreeMap<usize, String>,
}

impl Hist1D {
    /// Create an empty histogram. Weighted errors are off until [`with_sumw2`](Self::with_sumw2).
    pub fn new(name: impl Into<String>, title: impl Into<String>, axis: AxisSpec) -> Self {
        let n_cells = axis.bins + 2;
        Self {
            name: name.into(),
            title: title.into(),
            axis,
            contents: vec![0.0; n_cells],
            sumw2: None,
            entries: 0.0,
            labels: BTreeMap::new(),
        }
    }

    /// Track the sum of squared weights per bin.
    ///
    /// Existing contents seed the sums, matching unit-weight history.
    pub fn with_sumw2(mut self) -> Self {
        if self.sumw2.is_none() {
            self.sumw2 = Some(self.contents.iter().map(|c| c.abs()).collect());
        }
        self
    }

    /// Add `weight` at `x`. Returns the bin that received it.
    pub fn fill(&mut self, x: f64, weight: f64) -> usize {
        let bin = self.axis.find_bin(x);
        self.contents[bin] += weight;
        if let Some(sw2) = self.sumw2.as_mut() {
            sw2[bin] += weight * weight;
        }
        self.entries += 1.0;
        bin
    }

    /// Object title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Axis description.
    pub fn axis(&self) -> &AxisSpec {
        &self.axis
    }

    /// Number of fill calls.
    pub fn entries(&self) -> f64 {
        self.entries
    }

    /// Whether squared weights are tracked.
    pub fn has_sumw2(&self) -> bool {
        self.sumw2.is_some()
    }

    /// Sum of squared weights in `bin`, if tracked.
    pub fn sumw2(&self, bin: usize) -> Option<f64> {
        self.sumw2.as_ref().and_then(|s| s.get(bin).copied())
    }

    /// Statistical error of `bin`: `sqrt(sumw2)` when tracked, else `sqrt(|content|)`.
    pub fn bin_error(&self, bin: usize) -> f64 {
        match self.sumw2(bin) {
            Some(s) => s.sqrt(),
            None => self.bin_content(bin).abs().sqrt(),
        }
    }

    /// Sum of regular-bin contents.
    pub fn integral(&self) -> f64 {
        self.contents[1..=self.axis.bins].iter().sum()
    }

    /// Label of a regular bin, if set.
    pub fn bin_label(&self, bin: usize) -> Option<&str> {
        self.labels.get(&bin).map(String::as_str)
    }
}

impl Accumulator for Hist1D {
    fn name(&self) -> &str {
        &self.name
    }

    fn class_name(&self) -> &'static str {
        "TH1D"
    }

    fn to_stored(&self) -> StoredObject {
        let mut x_axis = self.axis.to_stored();
        x_axis.labels = self.labels.clone();
        StoredObject::Hist1D {
            name: self.name.clone(),
            title: self.title.clone(),
            x_axis,
            contents: self.contents.clone(),
            sumw2: self.sumw2.clone(),
            entries: self.entries,
        }
    }
}

impl BinnedAccumulator for Hist1D {
    fn n_bins(&self) -> usize {
        self.axis.bins
    }

    fn bin_content(&self, bin: usize) -> f64 {
        self.contents.get(bin).copied().unwrap_or(0.0)
    }

    fn set_bin_content(&mut self, bin: usize, value: f64) {
        if let Some(c) = self.contents.get_mut(bin) {
            *c = value;
        }
    }

    fn set_bin_label(&mut self, bin: usize, label: &str) {
        if (1..=self.axis.bins).contains(&bin) {
            self.labels.insert(bin, label.to_string());
        } else {
            log::debug!("{}: ignoring label for bin {bin} outside 1..={}", self.name, self.axis.bins);
        }
    }

    fn set_axis_title(&mut self, axis: Axis, title: &str) {
        match axis {
            Axis::X => self.axis.title = title.to_string(),
            Axis::Y | Axis::Z => {
                log::debug!("{}: 1D histogram has no {axis:?} axis", self.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hist() -> Hist1D {
        Hist1D::new("h1_pt", "pt", AxisSpec::new(4, 0.0, 4.0)).with_sumw2()
    }

    #[test]
    fn weighted_fill_accumulates() {
        let mut h = hist();
        assert_eq!(h.fill(0.5, 2.0), 1);
        h.fill(0.7, 3.0);
        h.fill(-1.0, 1.0);
        h.fill(9.0, 0.5);
        assert_relative_eq!(h.bin_content(1), 5.0);
        assert_relative_eq!(h.sumw2(1).unwrap(), 13.0);
        assert_relative_eq!(h.bin_error(1), 13.0_f64.sqrt());
        assert_relative_eq!(h.bin_content(0), 1.0);
        assert_relative_eq!(h.bin_content(5), 0.5);
        assert_relative_eq!(h.integral(), 5.0);
        assert_eq!(h.entries(), 4.0);
    }

    #[test]
    fn error_without_sumw2_uses_content() {
        let mut h = Hist1D::new("h", "", AxisSpec::new(2, 0.0, 2.0));
        h.fill(0.5, 4.0);
        assert!(!h.has_sumw2());
        assert_relative_eq!(h.bin_error(1), 2.0);
    }

    #[test]
    fn labels_only_on_regular_bins() {
        let mut h = hist();
        h.set_bin_label(0, "under");
        h.set_bin_label(1, "first");
        h.set_bin_label(5, "over");
        assert_eq!(h.bin_label(1), Some("first"));
        assert_eq!(h.bin_label(0), None);
        assert_eq!(h.bin_label(5), None);
    }

    #[test]
    fn stored_includes_flows_and_labels() {
        let mut h = hist();
        h.set_axis_title(Axis::X, "p_T [GeV]");
        h.set_bin_label(2, "b");
        h.fill(1.5, 1.0);
        match h.to_stored() {
            StoredObject::Hist1D { name, x_axis, contents, sumw2, .. } => {
                assert_eq!(name, "h1_pt");
                assert_eq!(x_axis.title, "p_T [GeV]");
                assert_eq!(x_axis.labels.get(&2).map(String::as_str), Some("b"));
                assert_eq!(contents.len(), 6);
                assert_eq!(sumw2.unwrap()[2], 1.0);
            }
            other => panic!("unexpected object: {other:?}"),
        }
    }
}

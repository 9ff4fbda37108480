//! Sparse N-dimensional histogram.
//!
//! Only occupied cells are stored, keyed by their per-axis bin indices.

use std::collections::HashMap;

use hb_core::{Accumulator, AxisSpec, Error, Result, SparseBin, StoredObject};

/// A sparse histogram over `axes.len()` dimensions.
#[derive(Debug, Clone)]
pub struct SparseHist {
    name: String,
    title: String,
    axes: Vec<AxisSpec>,
    /// coords -> (sum of weights, sum of squared weights)
    cells: HashMap<Vec<usize>, (f64, f64)>,
    sumw2: bool,
    entries: f64,
}

impl SparseHist {
    /// Create an empty sparse histogram with one axis per dimension.
    pub fn new(name: impl Into<String>, title: impl Into<String>, axes: Vec<AxisSpec>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            axes,
            cells: HashMap::new(),
            sumw2: false,
            entries: 0.0,
        }
    }

    /// Track the sum of squared weights per cell.
    pub fn with_sumw2(mut self) -> Self {
        self.sumw2 = true;
        self
    }

    /// Dimension recorded at construction.
    pub fn dimension(&self) -> usize {
        self.axes.len()
    }

    /// Axes, in dimension order.
    pub fn axes(&self) -> &[AxisSpec] {
        &self.axes
    }

    /// Add `weight` at the point `values`.
    ///
    /// `values.len()` must equal [`dimension`](Self::dimension); otherwise
    /// nothing is filled and [`Error::ArityMismatch`] is returned.
    pub fn fill(&mut self, values: &[f64], weight: f64) -> Result<()> {
        if values.len() != self.axes.len() {
            return Err(Error::ArityMismatch {
                key: self.name.clone(),
                expected: self.axes.len(),
                got: values.len(),
            });
        }
        let coords: Vec<usize> =
            self.axes.iter().zip(values).map(|(axis, &v)| axis.find_bin(v)).collect();
        let cell = self.cells.entry(coords).or_insert((0.0, 0.0));
        cell.0 += weight;
        if self.sumw2 {
            cell.1 += weight * weight;
        }
        self.entries += 1.0;
        Ok(())
    }

    /// Content of the cell at `coords`; unoccupied cells read as 0.
    pub fn bin_content(&self, coords: &[usize]) -> f64 {
        self.cells.get(coords).map(|c| c.0).unwrap_or(0.0)
    }

    /// Number of occupied cells.
    pub fn n_filled_bins(&self) -> usize {
        self.cells.len()
    }

    /// Number of fill calls.
    pub fn entries(&self) -> f64 {
        self.entries
    }

    /// Set the title of axis `dim`. Out-of-range dimensions are ignored.
    pub fn set_axis_title(&mut self, dim: usize, title: &str) {
        if let Some(axis) = self.axes.get_mut(dim) {
            axis.title = title.to_string();
        }
    }
}

impl Accumulator for SparseHist {
    fn name(&self) -> &str {
        &self.name
    }

    fn class_name(&self) -> &'static str {
        "THnSparseD"
    }

    fn to_stored(&self) -> StoredObject {
        let mut bins: Vec<SparseBin> = self
            .cells
            .iter()
            .map(|(coords, &(content, sumw2))| SparseBin { coords: coords.clone(), content, sumw2 })
            .collect();
        bins.sort_by(|a, b| a.coords.cmp(&b.coords));
        StoredObject::Sparse {
            name: self.name.clone(),
            title: self.title.clone(),
            axes: self.axes.iter().map(AxisSpec::to_stored).collect(),
            bins,
            entries: self.entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse() -> SparseHist {
        SparseHist::new(
            "hn_met",
            "hn_met",
            vec![AxisSpec::new(10, 0.0, 10.0), AxisSpec::new(4, -2.0, 2.0), AxisSpec::new(2, 0.0, 1.0)],
        )
        .with_sumw2()
    }

    #[test]
    fn fill_occupies_only_touched_cells() {
        let mut h = sparse();
        h.fill(&[3.5, 0.1, 0.9], 2.0).unwrap();
        h.fill(&[3.2, 0.4, 0.6], 1.0).unwrap();
        assert_eq!(h.n_filled_bins(), 1);
        assert_eq!(h.bin_content(&[4, 3, 2]), 3.0);
        assert_eq!(h.bin_content(&[1, 1, 1]), 0.0);
    }

    #[test]
    fn wrong_arity_fills_nothing() {
        let mut h = sparse();
        let err = h.fill(&[1.0, 2.0], 1.0).unwrap_err();
        match err {
            Error::ArityMismatch { key, expected, got } => {
                assert_eq!(key, "hn_met");
                assert_eq!(expected, 3);
                assert_eq!(got, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(h.entries(), 0.0);
        assert_eq!(h.n_filled_bins(), 0);
    }

    #[test]
    fn stored_bins_sorted() {
        let mut h = sparse();
        h.fill(&[9.0, 0.0, 0.0], 1.0).unwrap();
        h.fill(&[0.0, 0.0, 0.0], 1.0).unwrap();
        h.set_axis_title(1, "eta");
        match h.to_stored() {
            StoredObject::Sparse { bins, axes, .. } => {
                assert_eq!(bins[0].coords, vec![1, 3, 1]);
                assert_eq!(bins[1].coords, vec![10, 3, 1]);
                assert_eq!(axes[1].title, "eta");
            }
            other => panic!("unexpected object: {other:?}"),
        }
    }
}

//! Efficiency curve: a pair of passed/total histograms over one variable.

use hb_core::{Accumulator, Axis, AxisSpec, StoredObject};

/// Efficiency as a function of a conditioning variable.
#[derive(Debug, Clone)]
pub struct Efficiency {
    name: String,
    title: String,
    axis: AxisSpec,
    passed: Vec<f64>,
    total: Vec<f64>,
}

impl Efficiency {
    /// Create an empty efficiency curve.
    pub fn new(name: impl Into<String>, title: impl Into<String>, axis: AxisSpec) -> Self {
        let n_cells = axis.bins + 2;
        Self {
            name: name.into(),
            title: title.into(),
            axis,
            passed: vec![0.0; n_cells],
            total: vec![0.0; n_cells],
        }
    }

    /// Record one unit-weight outcome at `x`.
    pub fn fill(&mut self, x: f64, passed: bool) {
        self.fill_weighted(x, passed, 1.0);
    }

    /// Record one weighted outcome at `x`.
    pub fn fill_weighted(&mut self, x: f64, passed: bool, weight: f64) {
        let bin = self.axis.find_bin(x);
        self.total[bin] += weight;
        if passed {
            self.passed[bin] += weight;
        }
    }

    /// Weighted passed count of `bin`.
    pub fn passed(&self, bin: usize) -> f64 {
        self.passed.get(bin).copied().unwrap_or(0.0)
    }

    /// Weighted total count of `bin`.
    pub fn total(&self, bin: usize) -> f64 {
        self.total.get(bin).copied().unwrap_or(0.0)
    }

    /// `passed / total` for `bin`, or `None` when the bin is empty.
    pub fn efficiency(&self, bin: usize) -> Option<f64> {
        let total = self.total(bin);
        (total != 0.0).then(|| self.passed(bin) / total)
    }

    /// Conditioning axis.
    pub fn axis(&self) -> &AxisSpec {
        &self.axis
    }

    /// Set the axis title. Only the X axis exists.
    pub fn set_axis_title(&mut self, axis: Axis, title: &str) {
        if axis == Axis::X {
            self.axis.title = title.to_string();
        }
    }
}

impl Accumulator for Efficiency {
    fn name(&self) -> &str {
        &self.name
    }

    fn class_name(&self) -> &'static str {
        "TEfficiency"
    }

    fn to_stored(&self) -> StoredObject {
        StoredObject::Efficiency {
            name: self.name.clone(),
            title: self.title.clone(),
            axis: self.axis.to_stored(),
            passed: self.passed.clone(),
            total: self.total.clone(),
        }
    }
}

//! Weighted 2D histogram with uniform binning on both axes.

use hb_core::{Accumulator, Axis, AxisSpec, StoredObject};

/// A 2D histogram. Cells are stored row-major: `ybin * (xbins + 2) + xbin`.
#[derive(Debug, Clone)]
pub struct Hist2D {
    name: String,
    title: String,
    x_axis: AxisSpec,
    y_axis: AxisSpec,
    contents: Vec<f64>,
    sumw2: Option<Vec<f64>>,
    entries: f64,
}

impl Hist2D {
    /// Create an empty histogram.
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        x_axis: AxisSpec,
        y_axis: AxisSpec,
    ) -> Self {
        let n_cells = (x_axis.bins + 2) * (y_axis.bins + 2);
        Self {
            name: name.into(),
            title: title.into(),
            x_axis,
            y_axis,
            contents: vec![0.0; n_cells],
            sumw2: None,
            entries: 0.0,
        }
    }

    /// Track the sum of squared weights per cell.
    pub fn with_sumw2(mut self) -> Self {
        if self.sumw2.is_none() {
            self.sumw2 = Some(self.contents.iter().map(|c| c.abs()).collect());
        }
        self
    }

    fn cell(&self, xbin: usize, ybin: usize) -> Option<usize> {
        let nx = self.x_axis.bins + 2;
        (xbin < nx && ybin < self.y_axis.bins + 2).then_some(ybin * nx + xbin)
    }

    /// Add `weight` at `(x, y)`.
    pub fn fill(&mut self, x: f64, y: f64, weight: f64) {
        let xbin = self.x_axis.find_bin(x);
        let ybin = self.y_axis.find_bin(y);
        if let Some(cell) = self.cell(xbin, ybin) {
            self.contents[cell] += weight;
            if let Some(sw2) = self.sumw2.as_mut() {
                sw2[cell] += weight * weight;
            }
        }
        self.entries += 1.0;
    }

    /// Content of cell `(xbin, ybin)`; out-of-range cells read as 0.
    pub fn bin_content(&self, xbin: usize, ybin: usize) -> f64 {
        self.cell(xbin, ybin).map(|c| self.contents[c]).unwrap_or(0.0)
    }

    /// Sum of squared weights of cell `(xbin, ybin)`, if tracked.
    pub fn sumw2(&self, xbin: usize, ybin: usize) -> Option<f64> {
        let cell = self.cell(xbin, ybin)?;
        self.sumw2.as_ref().map(|s| s[cell])
    }

    /// X axis.
    pub fn x_axis(&self) -> &AxisSpec {
        &self.x_axis
    }

    /// Y axis.
    pub fn y_axis(&self) -> &AxisSpec {
        &self.y_axis
    }

    /// Number of fill calls.
    pub fn entries(&self) -> f64 {
        self.entries
    }

    /// Set an axis title.
    pub fn set_axis_title(&mut self, axis: Axis, title: &str) {
        match axis {
            Axis::X => self.x_axis.title = title.to_string(),
            Axis::Y => self.y_axis.title = title.to_string(),
            Axis::Z => log::debug!("{}: 2D histogram has no Z axis", self.name),
        }
    }
}

impl Accumulator for Hist2D {
    fn name(&self) -> &str {
        &self.name
    }

    fn class_name(&self) -> &'static str {
        "TH2D"
    }

    fn to_stored(&self) -> StoredObject {
        StoredObject::Hist2D {
            name: self.name.clone(),
            title: self.title.clone(),
            x_axis: self.x_axis.to_stored(),
            y_axis: self.y_axis.to_stored(),
            contents: self.contents.clone(),
            sumw2: self.sumw2.clone(),
            entries: self.entries,
        }
    }
}

//! Common data types for histbook

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Category of accumulator held by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// Weighted 1D histogram.
    Histogram1D,
    /// Weighted 2D histogram.
    Histogram2D,
    /// Sparse N-dimensional histogram.
    SparseND,
    /// Fixed-schema tuple filled with explicit rows.
    TupleRecord,
    /// Record whose rows are snapshots of bound field cells.
    TreeRecord,
    /// Pass/total efficiency curve.
    Efficiency,
}

impl ContainerKind {
    /// All kinds, in registry order.
    pub const ALL: [ContainerKind; 6] = [
        ContainerKind::Histogram1D,
        ContainerKind::Histogram2D,
        ContainerKind::SparseND,
        ContainerKind::TupleRecord,
        ContainerKind::TreeRecord,
        ContainerKind::Efficiency,
    ];

    /// Key prefix used by name synthesis.
    pub fn prefix(self) -> &'static str {
        match self {
            ContainerKind::Histogram1D => "h1",
            ContainerKind::Histogram2D => "h2",
            ContainerKind::SparseND => "hn",
            ContainerKind::TupleRecord | ContainerKind::TreeRecord => "tree",
            ContainerKind::Efficiency => "eff",
        }
    }

    /// Whether this kind lives in the shared tuple/tree mapping.
    pub fn is_record(self) -> bool {
        matches!(self, ContainerKind::TupleRecord | ContainerKind::TreeRecord)
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContainerKind::Histogram1D => "1D histogram",
            ContainerKind::Histogram2D => "2D histogram",
            ContainerKind::SparseND => "sparse histogram",
            ContainerKind::TupleRecord => "tuple",
            ContainerKind::TreeRecord => "tree",
            ContainerKind::Efficiency => "efficiency",
        };
        f.write_str(s)
    }
}

/// Histogram axis selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// First axis.
    X,
    /// Second axis.
    Y,
    /// Third axis.
    Z,
}

/// Upper bound on the dense cell count (flows included) of one histogram.
pub const MAX_CELLS: usize = 1 << 28;

/// Dense cell count of a histogram over `axes`, flows included.
///
/// Fails when the product exceeds [`MAX_CELLS`].
pub fn dense_cell_count(axes: &[&AxisSpec]) -> Result<usize> {
    axes.iter()
        .try_fold(1usize, |acc, axis| axis.bins.checked_add(2).and_then(|n| acc.checked_mul(n)))
        .filter(|&n| n <= MAX_CELLS)
        .ok_or_else(|| {
            let bins: Vec<usize> = axes.iter().map(|a| a.bins).collect();
            Error::Validation(format!("binning {bins:?} exceeds {MAX_CELLS} cells"))
        })
}

/// Uniform binning of one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    /// Number of regular bins (excluding under/overflow).
    pub bins: usize,
    /// Lower edge of the first bin.
    pub low: f64,
    /// Upper edge of the last bin.
    pub high: f64,
    /// Axis title.
    #[serde(default)]
    pub title: String,
}

impl AxisSpec {
    /// Create an untitled axis.
    pub fn new(bins: usize, low: f64, high: f64) -> Self {
        Self { bins, low, high, title: String::new() }
    }

    /// Set the axis title.
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Check that the axis has at least one bin and a non-empty range.
    pub fn validate(&self) -> Result<()> {
        if self.bins == 0 {
            return Err(Error::Validation("axis must have at least one bin".into()));
        }
        dense_cell_count(&[self])?;
        if self.low.is_nan() || self.high.is_nan() || self.low >= self.high {
            return Err(Error::Validation(format!(
                "axis range must satisfy low < high (low={}, high={})",
                self.low, self.high
            )));
        }
        Ok(())
    }

    /// Bin width.
    pub fn width(&self) -> f64 {
        (self.high - self.low) / self.bins as f64
    }

    /// Bin index for `x`: 0 is underflow, `bins + 1` is overflow.
    ///
    /// NaN goes to underflow.
    pub fn find_bin(&self, x: f64) -> usize {
        if x.is_nan() || x < self.low {
            return 0;
        }
        if x >= self.high {
            return self.bins + 1;
        }
        let bin = ((x - self.low) / self.width()) as usize;
        // Rounding at the upper edge can land on `bins`.
        bin.min(self.bins - 1) + 1
    }

    /// Serialized form, without bin labels.
    pub fn to_stored(&self) -> StoredAxis {
        StoredAxis {
            bins: self.bins,
            low: self.low,
            high: self.high,
            title: self.title.clone(),
            labels: BTreeMap::new(),
        }
    }
}

/// Serialized axis of a stored object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAxis {
    /// Number of regular bins.
    pub bins: usize,
    /// Lower edge.
    pub low: f64,
    /// Upper edge.
    pub high: f64,
    /// Axis title.
    pub title: String,
    /// Bin labels keyed by 1-based bin index.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<usize, String>,
}

/// One occupied cell of a sparse histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseBin {
    /// Per-axis bin index (0 = underflow, `bins + 1` = overflow).
    pub coords: Vec<usize>,
    /// Sum of weights.
    pub content: f64,
    /// Sum of squared weights.
    pub sumw2: f64,
}

/// An object as handed to an output sink.
///
/// Bin arrays include under/overflow cells, like ROOT's `fArray`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub enum StoredObject {
    /// 1D histogram.
    #[serde(rename = "TH1D")]
    Hist1D {
        /// Object name (the registry key).
        name: String,
        /// Object title.
        title: String,
        /// X axis.
        x_axis: StoredAxis,
        /// Bin contents, length `bins + 2`.
        contents: Vec<f64>,
        /// Sum of squared weights, if tracked.
        sumw2: Option<Vec<f64>>,
        /// Number of fill calls.
        entries: f64,
    },
    /// 2D histogram.
    #[serde(rename = "TH2D")]
    Hist2D {
        /// Object name.
        name: String,
        /// Object title.
        title: String,
        /// X axis.
        x_axis: StoredAxis,
        /// Y axis.
        y_axis: StoredAxis,
        /// Row-major contents, `(ybins + 2) * (xbins + 2)` cells.
        contents: Vec<f64>,
        /// Sum of squared weights, if tracked.
        sumw2: Option<Vec<f64>>,
        /// Number of fill calls.
        entries: f64,
    },
    /// Sparse N-dimensional histogram.
    #[serde(rename = "THnSparseD")]
    Sparse {
        /// Object name.
        name: String,
        /// Object title.
        title: String,
        /// One axis per dimension.
        axes: Vec<StoredAxis>,
        /// Occupied cells, ordered by coordinates.
        bins: Vec<SparseBin>,
        /// Number of fill calls.
        entries: f64,
    },
    /// Efficiency curve.
    #[serde(rename = "TEfficiency")]
    Efficiency {
        /// Object name.
        name: String,
        /// Object title.
        title: String,
        /// Conditioning axis.
        axis: StoredAxis,
        /// Weighted passed counts per bin (with flows).
        passed: Vec<f64>,
        /// Weighted total counts per bin (with flows).
        total: Vec<f64>,
    },
    /// Tree record.
    #[serde(rename = "TTree")]
    Tree {
        /// Object name.
        name: String,
        /// Object title.
        title: String,
        /// Field names, in column order.
        fields: Vec<String>,
        /// One row per fill.
        rows: Vec<Vec<f64>>,
    },
    /// Tuple record.
    #[serde(rename = "TNtupleD")]
    Ntuple {
        /// Object name.
        name: String,
        /// Object title.
        title: String,
        /// Field names, in column order.
        fields: Vec<String>,
        /// Requested buffer size.
        buffer_size: usize,
        /// One row per fill.
        rows: Vec<Vec<f64>>,
    },
}

impl StoredObject {
    /// Object name.
    pub fn name(&self) -> &str {
        match self {
            StoredObject::Hist1D { name, .. }
            | StoredObject::Hist2D { name, .. }
            | StoredObject::Sparse { name, .. }
            | StoredObject::Efficiency { name, .. }
            | StoredObject::Tree { name, .. }
            | StoredObject::Ntuple { name, .. } => name,
        }
    }

    /// ROOT-style class name.
    pub fn class_name(&self) -> &'static str {
        match self {
            StoredObject::Hist1D { .. } => "TH1D",
            StoredObject::Hist2D { .. } => "TH2D",
            StoredObject::Sparse { .. } => "THnSparseD",
            StoredObject::Efficiency { .. } => "TEfficiency",
            StoredObject::Tree { .. } => "TTree",
            StoredObject::Ntuple { .. } => "TNtupleD",
        }
    }
}

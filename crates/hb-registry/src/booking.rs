//! Booking files: YAML description of the containers to create at setup.
//!
//! ```yaml
//! histograms:
//!   - name: pt
//!     particle: Muon
//!     count: 3
//!     axis: { bins: 50, low: 0, high: 500, title: "p_T [GeV]" }
//!   - name: h_counters
//!     axis: { bins: 10, low: 0, high: 10 }
//!     labels: [all, trigger, iso]
//! histograms_2d:
//!   - name: eta_phi
//!     x: { bins: 50, low: -2.5, high: 2.5 }
//!     y: { bins: 64, low: -3.2, high: 3.2 }
//! sparse:
//!   - name: met
//!     axes:
//!       - { bins: 100, low: 0, high: 1000, title: MET }
//!       - { bins: 64, low: -3.2, high: 3.2, title: phi }
//! tuples:
//!   - { name: kin, fields: "pt:eta:phi", buffer_size: 32000 }
//! trees:
//!   - { name: events, fields: [pt, njet] }
//! efficiencies:
//!   - name: trigger
//!     axis: { bins: 20, low: 0, high: 200 }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use hb_core::{AxisSpec, Error, Result};
use serde::Deserialize;

use crate::naming::{ContainerKey, KeySpec};
use crate::registry::Registry;

fn default_count() -> usize {
    1
}

fn default_buffer_size() -> usize {
    32000
}

/// One 1D histogram (or family) entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Hist1DBooking {
    /// Base name.
    pub name: String,
    /// Optional particle tag.
    #[serde(default)]
    pub particle: Option<String>,
    /// Family size. Absent means a single unindexed histogram.
    #[serde(default)]
    pub count: Option<usize>,
    /// Keep `name` as the literal key.
    #[serde(default)]
    pub unchanged: bool,
    /// Object title for unchanged-name histograms (defaults to the axis title).
    #[serde(default)]
    pub title: Option<String>,
    /// Binning.
    pub axis: AxisSpec,
    /// Labels for bins `1..=labels.len()`.
    #[serde(default)]
    pub labels: Vec<String>,
}

/// One 2D histogram (or family) entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Hist2DBooking {
    /// Base name.
    pub name: String,
    /// Family size. Absent means a single unindexed histogram.
    #[serde(default)]
    pub count: Option<usize>,
    /// X binning.
    pub x: AxisSpec,
    /// Y binning.
    pub y: AxisSpec,
}

/// One sparse histogram entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SparseBooking {
    /// Base name.
    pub name: String,
    /// One axis per dimension.
    pub axes: Vec<AxisSpec>,
}

/// One tuple entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TupleBooking {
    /// Base name.
    pub name: String,
    /// `:`-separated field names.
    pub fields: String,
    /// Buffer size.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

/// One tree entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreeBooking {
    /// Base name.
    pub name: String,
    /// Field names; every cell starts at 0.
    pub fields: Vec<String>,
}

/// One efficiency entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EfficiencyBooking {
    /// Base name.
    pub name: String,
    /// Binning of the conditioning variable.
    pub axis: AxisSpec,
}

/// Everything to book before the event loop.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookingConfig {
    /// 1D histograms.
    #[serde(default)]
    pub histograms: Vec<Hist1DBooking>,
    /// 2D histograms.
    #[serde(default)]
    pub histograms_2d: Vec<Hist2DBooking>,
    /// Sparse histograms.
    #[serde(default)]
    pub sparse: Vec<SparseBooking>,
    /// Tuples.
    #[serde(default)]
    pub tuples: Vec<TupleBooking>,
    /// Trees.
    #[serde(default)]
    pub trees: Vec<TreeBooking>,
    /// Efficiency curves.
    #[serde(default)]
    pub efficiencies: Vec<EfficiencyBooking>,
}

impl BookingConfig {
    /// Parse a booking document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml_ng::from_str(text).map_err(|e| Error::Yaml(e.to_string()))
    }

    /// Read and parse a booking file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Book every entry into `reg`, in document order per section.
    ///
    /// Returns the created keys. Stops at the first invalid entry.
    pub fn book(&self, reg: &mut Registry) -> Result<Vec<ContainerKey>> {
        let mut keys = Vec::new();

        for h in &self.histograms {
            let particle = h.particle.as_deref();
            if h.unchanged {
                let title = h.title.as_deref().unwrap_or(&h.axis.title);
                keys.push(reg.create_hist1d_unchanged(&h.name, title, &h.axis)?);
                if !h.labels.is_empty() {
                    reg.assign_bin_labels(KeySpec::verbatim(&h.name), &h.labels);
                }
                continue;
            }
            match h.count {
                Some(count) => {
                    let family = reg.create_hist1d_family(count, &h.name, particle, &h.axis)?;
                    if !h.labels.is_empty() {
                        for key in &family {
                            reg.assign_bin_labels(KeySpec::verbatim(key.as_str()), &h.labels);
                        }
                    }
                    keys.extend(family);
                }
                None => {
                    let key = match particle {
                        Some(p) => reg.create_hist1d_particle(&h.name, p, &h.axis)?,
                        None => reg.create_hist1d(&h.name, &h.axis)?,
                    };
                    if !h.labels.is_empty() {
                        let mut spec = KeySpec::new(&h.name);
                        if let Some(p) = particle {
                            spec = spec.particle(p);
                        }
                        reg.assign_bin_labels(spec, &h.labels);
                    }
                    keys.push(key);
                }
            }
        }

        for h in &self.histograms_2d {
            match h.count {
                Some(count) => keys.extend(reg.create_hist2d_family(count, &h.name, &h.x, &h.y)?),
                None => keys.push(reg.create_hist2d(&h.name, &h.x, &h.y)?),
            }
        }

        for s in &self.sparse {
            keys.push(reg.create_sparse(&s.name, &s.axes)?);
        }

        for t in &self.tuples {
            keys.push(reg.create_tuple(&t.name, &t.fields, t.buffer_size)?);
        }

        for t in &self.trees {
            let fields: BTreeMap<String, f64> = t.fields.iter().map(|f| (f.clone(), 0.0)).collect();
            keys.push(reg.create_tree(&fields, &t.name)?);
        }

        for e in &self.efficiencies {
            keys.push(reg.create_efficiency(&e.name, &e.axis)?);
        }

        log::info!("booked {} containers", keys.len());
        Ok(keys)
    }
}

impl Registry {
    /// Fresh registry with everything in `config` booked.
    pub fn from_booking(config: &BookingConfig) -> Result<Self> {
        let mut reg = Registry::new();
        config.book(&mut reg)?;
        Ok(reg)
    }
}

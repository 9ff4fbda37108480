//! The registry: five kind-specific mappings from key to accumulator.
//!
//! Creation happens during setup and inserts one entry per container.
//! Re-creating an existing key replaces the entry; the replacement is logged
//! and counted, and the old accumulator is dropped.

use std::collections::BTreeMap;

use hb_core::{Axis, AxisSpec, BinnedAccumulator, ContainerKind, Error, Result, dense_cell_count};
use hb_hist::{Efficiency, FieldBinding, Hist1D, Hist2D, Record, SparseHist};

use crate::naming::{COUNTERS_NAME, ContainerKey, KeySpec};

/// Counters describing registry activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Entries inserted by creation operations.
    pub created: u64,
    /// Creations that replaced an existing key.
    pub replaced: u64,
    /// Fills that reached an accumulator.
    pub fills: u64,
    /// Fill/post/write calls whose key was not found.
    pub misses: u64,
}

/// Owner of every booked accumulator.
#[derive(Debug, Default)]
pub struct Registry {
    pub(crate) hist1d: BTreeMap<ContainerKey, Hist1D>,
    pub(crate) hist2d: BTreeMap<ContainerKey, Hist2D>,
    pub(crate) sparse: BTreeMap<ContainerKey, SparseHist>,
    pub(crate) records: BTreeMap<ContainerKey, Record>,
    pub(crate) efficiency: BTreeMap<ContainerKey, Efficiency>,
    pub(crate) stats: RegistryStats,
}

/// Insert-or-replace, logging collisions.
fn insert_entry<T>(
    map: &mut BTreeMap<ContainerKey, T>,
    stats: &mut RegistryStats,
    kind: ContainerKind,
    key: ContainerKey,
    value: T,
) {
    log::debug!("booking {kind} '{key}'");
    stats.created += 1;
    if map.insert(key.clone(), value).is_some() {
        stats.replaced += 1;
        log::warn!("{kind} '{key}' already booked; previous instance replaced");
    }
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Activity counters.
    pub fn stats(&self) -> RegistryStats {
        self.stats
    }

    /// Total number of booked containers across all mappings.
    pub fn len(&self) -> usize {
        self.hist1d.len()
            + self.hist2d.len()
            + self.sparse.len()
            + self.records.len()
            + self.efficiency.len()
    }

    /// Whether nothing is booked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn record_miss(&mut self, kind: ContainerKind, key: &ContainerKey, op: &str) {
        self.stats.misses += 1;
        log::warn!("({op}) no {kind} '{key}' in registry");
    }

    // ── 1D histograms ────────────────────────────────────────────

    fn book_hist1d(&mut self, key: ContainerKey, title: &str, axis: &AxisSpec) -> Result<ContainerKey> {
        axis.validate()?;
        let mut h = Hist1D::new(key.as_str(), title, axis.clone()).with_sumw2();
        h.set_axis_title(Axis::X, &axis.title);
        insert_entry(&mut self.hist1d, &mut self.stats, ContainerKind::Histogram1D, key.clone(), h);
        Ok(key)
    }

    /// Book one 1D histogram keyed `h1_<name>` (or `h_counters`).
    pub fn create_hist1d(&mut self, name: &str, axis: &AxisSpec) -> Result<ContainerKey> {
        let key = ContainerKey::synthesize(ContainerKind::Histogram1D, name, None, None);
        self.book_hist1d(key, &axis.title, axis)
    }

    /// Book one 1D histogram keyed `h1_<particle>_<name>`.
    pub fn create_hist1d_particle(
        &mut self,
        name: &str,
        particle: &str,
        axis: &AxisSpec,
    ) -> Result<ContainerKey> {
        let key = ContainerKey::synthesize(ContainerKind::Histogram1D, name, None, Some(particle));
        self.book_hist1d(key, &axis.title, axis)
    }

    /// Book `count` independent 1D histograms keyed by index `0..count`
    /// (`h1_<i>_<name>` or `h1_<i>_<particle>_<name>`).
    ///
    /// A family named [`COUNTERS_NAME`] has only one key, so it is booked once.
    pub fn create_hist1d_family(
        &mut self,
        count: usize,
        name: &str,
        particle: Option<&str>,
        axis: &AxisSpec,
    ) -> Result<Vec<ContainerKey>> {
        axis.validate()?;
        if name == COUNTERS_NAME && count > 0 {
            log::debug!("family of {count} '{COUNTERS_NAME}' booked as a single histogram");
            return Ok(vec![self.create_hist1d(name, axis)?]);
        }
        (0..count)
            .map(|i| {
                let key =
                    ContainerKey::synthesize(ContainerKind::Histogram1D, name, Some(i), particle);
                self.book_hist1d(key, &axis.title, axis)
            })
            .collect()
    }

    /// Book a 1D histogram under the literal key `name`.
    pub fn create_hist1d_unchanged(
        &mut self,
        name: &str,
        title: &str,
        axis: &AxisSpec,
    ) -> Result<ContainerKey> {
        self.book_hist1d(ContainerKey::verbatim(name), title, axis)
    }

    // ── 2D histograms ────────────────────────────────────────────

    fn book_hist2d(
        &mut self,
        key: ContainerKey,
        x_axis: &AxisSpec,
        y_axis: &AxisSpec,
    ) -> Result<ContainerKey> {
        x_axis.validate()?;
        y_axis.validate()?;
        dense_cell_count(&[x_axis, y_axis])?;
        let h = Hist2D::new(key.as_str(), key.as_str(), x_axis.clone(), y_axis.clone()).with_sumw2();
        insert_entry(&mut self.hist2d, &mut self.stats, ContainerKind::Histogram2D, key.clone(), h);
        Ok(key)
    }

    /// Book one 2D histogram keyed `h2_<name>`.
    pub fn create_hist2d(
        &mut self,
        name: &str,
        x_axis: &AxisSpec,
        y_axis: &AxisSpec,
    ) -> Result<ContainerKey> {
        let key = ContainerKey::synthesize(ContainerKind::Histogram2D, name, None, None);
        self.book_hist2d(key, x_axis, y_axis)
    }

    /// Book `count` 2D histograms keyed `h2_<i>_<name>`.
    pub fn create_hist2d_family(
        &mut self,
        count: usize,
        name: &str,
        x_axis: &AxisSpec,
        y_axis: &AxisSpec,
    ) -> Result<Vec<ContainerKey>> {
        (0..count)
            .map(|i| {
                let key = ContainerKey::synthesize(ContainerKind::Histogram2D, name, Some(i), None);
                self.book_hist2d(key, x_axis, y_axis)
            })
            .collect()
    }

    // ── Sparse histograms ────────────────────────────────────────

    /// Book a sparse histogram keyed `hn_<name>` with one axis per dimension.
    pub fn create_sparse(&mut self, name: &str, axes: &[AxisSpec]) -> Result<ContainerKey> {
        if axes.is_empty() {
            return Err(Error::Validation(format!("sparse histogram '{name}' needs at least one axis")));
        }
        for axis in axes {
            axis.validate()?;
        }
        let key = ContainerKey::synthesize(ContainerKind::SparseND, name, None, None);
        let h = SparseHist::new(key.as_str(), key.as_str(), axes.to_vec()).with_sumw2();
        insert_entry(&mut self.sparse, &mut self.stats, ContainerKind::SparseND, key.clone(), h);
        Ok(key)
    }

    /// Book a sparse histogram from parallel per-axis arrays.
    ///
    /// Every array must hold exactly `dimension` entries.
    pub fn create_sparse_from_arrays<S: AsRef<str>>(
        &mut self,
        name: &str,
        dimension: usize,
        bins: &[usize],
        mins: &[f64],
        maxs: &[f64],
        titles: &[S],
    ) -> Result<ContainerKey> {
        let lens = [bins.len(), mins.len(), maxs.len(), titles.len()];
        if lens.iter().any(|&n| n != dimension) {
            return Err(Error::Validation(format!(
                "sparse histogram '{name}': dimension {dimension} but array lengths \
                 bins={}, mins={}, maxs={}, titles={}",
                lens[0], lens[1], lens[2], lens[3]
            )));
        }
        let axes: Vec<AxisSpec> = (0..dimension)
            .map(|d| AxisSpec::new(bins[d], mins[d], maxs[d]).titled(titles[d].as_ref()))
            .collect();
        self.create_sparse(name, &axes)
    }

    // ── Records ──────────────────────────────────────────────────

    /// Book a tuple keyed `tree_<name>` with `:`-separated fields.
    pub fn create_tuple(
        &mut self,
        name: &str,
        field_list: &str,
        buffer_size: usize,
    ) -> Result<ContainerKey> {
        let key = ContainerKey::synthesize(ContainerKind::TupleRecord, name, None, None);
        let record = Record::tuple(key.as_str(), name, field_list, buffer_size);
        if record.binding().is_empty() {
            return Err(Error::Validation(format!("tuple '{name}' has no fields ('{field_list}')")));
        }
        insert_entry(&mut self.records, &mut self.stats, ContainerKind::TupleRecord, key.clone(), record);
        Ok(key)
    }

    /// Book a tree keyed `tree_<name>` with one field per entry of `fields`.
    ///
    /// Each field gets a registry-owned cell initialised from the map value.
    pub fn create_tree(&mut self, fields: &BTreeMap<String, f64>, name: &str) -> Result<ContainerKey> {
        let key = ContainerKey::synthesize(ContainerKind::TreeRecord, name, None, None);
        let record = Record::tree(key.as_str(), name, FieldBinding::from(fields));
        insert_entry(&mut self.records, &mut self.stats, ContainerKind::TreeRecord, key.clone(), record);
        Ok(key)
    }

    // ── Efficiencies ─────────────────────────────────────────────

    /// Book an efficiency curve keyed `eff_<name>`.
    pub fn create_efficiency(&mut self, name: &str, axis: &AxisSpec) -> Result<ContainerKey> {
        axis.validate()?;
        let key = ContainerKey::synthesize(ContainerKind::Efficiency, name, None, None);
        let eff = Efficiency::new(key.as_str(), &axis.title, axis.clone());
        insert_entry(&mut self.efficiency, &mut self.stats, ContainerKind::Efficiency, key.clone(), eff);
        Ok(key)
    }

    // ── Handle access ────────────────────────────────────────────

    /// 1D histogram for `spec`, if booked.
    pub fn hist1d<'a>(&self, spec: impl Into<KeySpec<'a>>) -> Option<&Hist1D> {
        self.hist1d.get(spec.into().to_key(ContainerKind::Histogram1D).as_str())
    }

    /// Mutable 1D histogram for `spec`.
    pub fn hist1d_mut<'a>(&mut self, spec: impl Into<KeySpec<'a>>) -> Option<&mut Hist1D> {
        self.hist1d.get_mut(spec.into().to_key(ContainerKind::Histogram1D).as_str())
    }

    /// 2D histogram for `spec`, if booked.
    pub fn hist2d<'a>(&self, spec: impl Into<KeySpec<'a>>) -> Option<&Hist2D> {
        self.hist2d.get(spec.into().to_key(ContainerKind::Histogram2D).as_str())
    }

    /// Mutable 2D histogram for `spec`.
    pub fn hist2d_mut<'a>(&mut self, spec: impl Into<KeySpec<'a>>) -> Option<&mut Hist2D> {
        self.hist2d.get_mut(spec.into().to_key(ContainerKind::Histogram2D).as_str())
    }

    /// Sparse histogram for `spec`, if booked.
    pub fn sparse<'a>(&self, spec: impl Into<KeySpec<'a>>) -> Option<&SparseHist> {
        self.sparse.get(spec.into().to_key(ContainerKind::SparseND).as_str())
    }

    /// Mutable sparse histogram for `spec`.
    pub fn sparse_mut<'a>(&mut self, spec: impl Into<KeySpec<'a>>) -> Option<&mut SparseHist> {
        self.sparse.get_mut(spec.into().to_key(ContainerKind::SparseND).as_str())
    }

    /// Tuple or tree record for `spec`, if booked.
    pub fn record<'a>(&self, spec: impl Into<KeySpec<'a>>) -> Option<&Record> {
        self.records.get(spec.into().to_key(ContainerKind::TreeRecord).as_str())
    }

    /// Mutable tuple or tree record for `spec`.
    pub fn record_mut<'a>(&mut self, spec: impl Into<KeySpec<'a>>) -> Option<&mut Record> {
        self.records.get_mut(spec.into().to_key(ContainerKind::TreeRecord).as_str())
    }

    /// Efficiency curve for `spec`, if booked.
    pub fn efficiency<'a>(&self, spec: impl Into<KeySpec<'a>>) -> Option<&Efficiency> {
        self.efficiency.get(spec.into().to_key(ContainerKind::Efficiency).as_str())
    }

    /// Mutable efficiency curve for `spec`.
    pub fn efficiency_mut<'a>(&mut self, spec: impl Into<KeySpec<'a>>) -> Option<&mut Efficiency> {
        self.efficiency.get_mut(spec.into().to_key(ContainerKind::Efficiency).as_str())
    }

    /// Whether a container of `kind` is booked for `spec`.
    ///
    /// Tuple and tree records share one mapping, so either record kind finds both.
    pub fn contains<'a>(&self, kind: ContainerKind, spec: impl Into<KeySpec<'a>>) -> bool {
        let key = spec.into().to_key(kind);
        let key = key.as_str();
        match kind {
            ContainerKind::Histogram1D => self.hist1d.contains_key(key),
            ContainerKind::Histogram2D => self.hist2d.contains_key(key),
            ContainerKind::SparseND => self.sparse.contains_key(key),
            ContainerKind::TupleRecord | ContainerKind::TreeRecord => self.records.contains_key(key),
            ContainerKind::Efficiency => self.efficiency.contains_key(key),
        }
    }

    /// Keys booked under `kind`, in key order.
    ///
    /// For record kinds only records of that exact kind are listed.
    pub fn keys(&self, kind: ContainerKind) -> Vec<&str> {
        match kind {
            ContainerKind::Histogram1D => self.hist1d.keys().map(ContainerKey::as_str).collect(),
            ContainerKind::Histogram2D => self.hist2d.keys().map(ContainerKey::as_str).collect(),
            ContainerKind::SparseND => self.sparse.keys().map(ContainerKey::as_str).collect(),
            ContainerKind::TupleRecord | ContainerKind::TreeRecord => self
                .records
                .iter()
                .filter(|(_, r)| r.kind() == kind)
                .map(|(k, _)| k.as_str())
                .collect(),
            ContainerKind::Efficiency => self.efficiency.keys().map(ContainerKey::as_str).collect(),
        }
    }
}

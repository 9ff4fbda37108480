//! Fill-time lookup.
//!
//! Every fill resolves its [`KeySpec`] with the same synthesis rules used at
//! creation. A missing key is logged, counted in
//! [`RegistryStats::misses`](crate::RegistryStats), and otherwise ignored.
//! Fills never add or remove registry entries.

use hb_core::{ContainerKind, Result};
use hb_hist::FieldBinding;

use crate::naming::KeySpec;
use crate::registry::Registry;

impl Registry {
    /// Add `weight` at `value` to a 1D histogram. Returns `false` on a miss.
    pub fn fill_1d<'a>(&mut self, spec: impl Into<KeySpec<'a>>, value: f64, weight: f64) -> bool {
        let key = spec.into().to_key(ContainerKind::Histogram1D);
        match self.hist1d.get_mut(key.as_str()) {
            Some(h) => {
                h.fill(value, weight);
                self.stats.fills += 1;
                true
            }
            None => {
                self.record_miss(ContainerKind::Histogram1D, &key, "fill");
                false
            }
        }
    }

    /// Add `weight` at `(x, y)` to a 2D histogram. Returns `false` on a miss.
    pub fn fill_2d<'a>(&mut self, spec: impl Into<KeySpec<'a>>, x: f64, y: f64, weight: f64) -> bool {
        let key = spec.into().to_key(ContainerKind::Histogram2D);
        match self.hist2d.get_mut(key.as_str()) {
            Some(h) => {
                h.fill(x, y, weight);
                self.stats.fills += 1;
                true
            }
            None => {
                self.record_miss(ContainerKind::Histogram2D, &key, "fill");
                false
            }
        }
    }

    /// Record a pass/fail outcome at `x`. Returns `false` on a miss.
    pub fn fill_eff<'a>(&mut self, spec: impl Into<KeySpec<'a>>, x: f64, passed: bool) -> bool {
        self.fill_eff_weighted(spec, x, passed, 1.0)
    }

    /// Record a weighted pass/fail outcome at `x`. Returns `false` on a miss.
    pub fn fill_eff_weighted<'a>(
        &mut self,
        spec: impl Into<KeySpec<'a>>,
        x: f64,
        passed: bool,
        weight: f64,
    ) -> bool {
        let key = spec.into().to_key(ContainerKind::Efficiency);
        match self.efficiency.get_mut(key.as_str()) {
            Some(eff) => {
                eff.fill_weighted(x, passed, weight);
                self.stats.fills += 1;
                true
            }
            None => {
                self.record_miss(ContainerKind::Efficiency, &key, "fill");
                false
            }
        }
    }

    /// Add `weight` at the point `values` of a sparse histogram.
    ///
    /// `Ok(false)` on a miss. `values.len()` must equal the dimension the
    /// histogram was created with; otherwise nothing is filled and
    /// [`Error::ArityMismatch`](hb_core::Error::ArityMismatch) is returned.
    pub fn fill_sparse<'a>(
        &mut self,
        spec: impl Into<KeySpec<'a>>,
        values: &[f64],
        weight: f64,
    ) -> Result<bool> {
        let key = spec.into().to_key(ContainerKind::SparseND);
        match self.sparse.get_mut(key.as_str()) {
            Some(h) => {
                h.fill(values, weight)?;
                self.stats.fills += 1;
                Ok(true)
            }
            None => {
                self.record_miss(ContainerKind::SparseND, &key, "fill");
                Ok(false)
            }
        }
    }

    /// Append an explicit row to a tuple. `Ok(false)` on a miss.
    ///
    /// The row length must equal the number of fields.
    pub fn fill_tuple<'a>(&mut self, spec: impl Into<KeySpec<'a>>, values: &[f64]) -> Result<bool> {
        let key = spec.into().to_key(ContainerKind::TupleRecord);
        match self.records.get_mut(key.as_str()) {
            Some(record) => {
                record.fill_row(values)?;
                self.stats.fills += 1;
                Ok(true)
            }
            None => {
                self.record_miss(ContainerKind::TupleRecord, &key, "fill");
                Ok(false)
            }
        }
    }

    /// Append a row copied from the tree's bound cells. Returns `false` on a miss.
    pub fn fill_tree<'a>(&mut self, spec: impl Into<KeySpec<'a>>) -> bool {
        let key = spec.into().to_key(ContainerKind::TreeRecord);
        match self.records.get_mut(key.as_str()) {
            Some(record) => {
                record.fill_snapshot();
                self.stats.fills += 1;
                true
            }
            None => {
                self.record_miss(ContainerKind::TreeRecord, &key, "fill");
                false
            }
        }
    }

    /// Store `value` in the cell bound to `field` of a tree.
    ///
    /// Returns `false` if the tree or the field does not exist.
    pub fn set_field<'a>(&mut self, spec: impl Into<KeySpec<'a>>, field: &str, value: f64) -> bool {
        let key = spec.into().to_key(ContainerKind::TreeRecord);
        let Some(record) = self.records.get_mut(key.as_str()) else {
            self.record_miss(ContainerKind::TreeRecord, &key, "set");
            return false;
        };
        if record.binding_mut().set(field, value) {
            true
        } else {
            log::warn!("(set) tree '{key}' has no field '{field}'");
            false
        }
    }

    /// Bound cells of a tree, for updating several fields before [`fill_tree`](Self::fill_tree).
    pub fn fields_mut<'a>(&mut self, spec: impl Into<KeySpec<'a>>) -> Option<&mut FieldBinding> {
        let key = spec.into().to_key(ContainerKind::TreeRecord);
        self.records.get_mut(key.as_str()).map(|r| r.binding_mut())
    }
}

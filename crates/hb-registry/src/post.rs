//! End-of-run post-processing: negative-bin clamping and bin labels.
//!
//! Clamping visits bins `0..=N` (underflow plus the regular bins). The
//! overflow bin `N + 1` is not visited, and squared-weight sums are left as
//! they were, so errors of clamped bins keep their pre-clamp values.

use hb_core::{BinnedAccumulator, ContainerKind};

use crate::naming::KeySpec;
use crate::registry::Registry;

/// Reset every bin in `0..=n_bins()` whose content is negative to 0.
///
/// Returns the number of bins changed.
pub fn zero_negative_bins_of<H: BinnedAccumulator + ?Sized>(hist: &mut H) -> usize {
    let mut clamped = 0;
    for bin in 0..=hist.n_bins() {
        let content = hist.bin_content(bin);
        if content < 0.0 {
            log::debug!("{}: bin {bin} content {content} set to zero", hist.name());
            hist.set_bin_content(bin, 0.0);
            clamped += 1;
        }
    }
    clamped
}

/// Label bins `1..=labels.len()` in order.
pub fn assign_labels_of<H, S>(hist: &mut H, labels: &[S])
where
    H: BinnedAccumulator + ?Sized,
    S: AsRef<str>,
{
    for (i, label) in labels.iter().enumerate() {
        hist.set_bin_label(i + 1, label.as_ref());
    }
}

impl Registry {
    /// Clamp negative bins of one 1D histogram.
    ///
    /// Returns the number of bins changed, or `None` on a miss.
    pub fn zero_negative_bins<'a>(&mut self, spec: impl Into<KeySpec<'a>>) -> Option<usize> {
        let key = spec.into().to_key(ContainerKind::Histogram1D);
        match self.hist1d.get_mut(key.as_str()) {
            Some(h) => Some(zero_negative_bins_of(h)),
            None => {
                self.record_miss(ContainerKind::Histogram1D, &key, "zero");
                None
            }
        }
    }

    /// Clamp negative bins of members `0..count` of a 1D family.
    ///
    /// Returns the total number of bins changed across found members.
    pub fn zero_negative_bins_family(&mut self, count: usize, name: &str) -> usize {
        (0..count).filter_map(|i| self.zero_negative_bins(KeySpec::new(name).index(i))).sum()
    }

    /// Clamp negative bins of every booked 1D histogram.
    pub fn zero_negative_bins_all(&mut self) -> usize {
        self.hist1d.values_mut().map(|h| zero_negative_bins_of(h)).sum()
    }

    /// Label bins `1..=labels.len()` of one 1D histogram. Returns `false` on a miss.
    pub fn assign_bin_labels<'a, S: AsRef<str>>(
        &mut self,
        spec: impl Into<KeySpec<'a>>,
        labels: &[S],
    ) -> bool {
        let key = spec.into().to_key(ContainerKind::Histogram1D);
        match self.hist1d.get_mut(key.as_str()) {
            Some(h) => {
                assign_labels_of(h, labels);
                true
            }
            None => {
                self.record_miss(ContainerKind::Histogram1D, &key, "label");
                false
            }
        }
    }

    /// Label bins of members `0..count` of a 1D family.
    ///
    /// Returns the number of members labelled.
    pub fn assign_bin_labels_family<S: AsRef<str>>(
        &mut self,
        count: usize,
        name: &str,
        labels: &[S],
    ) -> usize {
        (0..count).filter(|&i| self.assign_bin_labels(KeySpec::new(name).index(i), labels)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hb_core::AxisSpec;

    fn booked() -> Registry {
        let mut reg = Registry::new();
        reg.create_hist1d("mt", &AxisSpec::new(3, 0.0, 3.0)).unwrap();
        reg
    }

    #[test]
    fn underflow_clamped_overflow_untouched() {
        let mut reg = booked();
        reg.fill_1d("mt", -1.0, -5.0);
        reg.fill_1d("mt", 1.5, -2.0);
        reg.fill_1d("mt", 2.5, 4.0);
        reg.fill_1d("mt", 10.0, -3.0);

        assert_eq!(reg.zero_negative_bins("mt"), Some(2));

        let h = reg.hist1d("mt").unwrap();
        assert_eq!(h.bin_content(0), 0.0);
        assert_eq!(h.bin_content(2), 0.0);
        assert_eq!(h.bin_content(3), 4.0);
        assert_eq!(h.bin_content(4), -3.0);
        // sumw2 is not recomputed
        assert_eq!(h.sumw2(0), Some(25.0));
    }

    #[test]
    fn zero_on_missing_is_none() {
        let mut reg = booked();
        assert_eq!(reg.zero_negative_bins("nope"), None);
        assert_eq!(reg.stats().misses, 1);
    }

    #[test]
    fn family_clamp_and_labels() {
        let mut reg = Registry::new();
        reg.create_hist1d_family(2, "cut", None, &AxisSpec::new(3, 0.0, 3.0)).unwrap();
        reg.fill_1d(KeySpec::new("cut").index(0), 0.5, -1.0);
        reg.fill_1d(KeySpec::new("cut").index(1), 1.5, -1.0);
        assert_eq!(reg.zero_negative_bins_family(2, "cut"), 2);

        let labels = ["all", "trigger", "iso"];
        assert_eq!(reg.assign_bin_labels_family(3, "cut", &labels), 2);
        let h = reg.hist1d(KeySpec::new("cut").index(1)).unwrap();
        assert_eq!(h.bin_label(1), Some("all"));
        assert_eq!(h.bin_label(3), Some("iso"));
        assert_eq!(reg.stats().misses, 1);
    }

    #[test]
    fn labels_start_at_first_regular_bin() {
        let mut reg = booked();
        assert!(reg.assign_bin_labels("mt", &["a".to_string(), "b".to_string()]));
        let h = reg.hist1d("mt").unwrap();
        assert_eq!(h.bin_label(0), None);
        assert_eq!(h.bin_label(1), Some("a"));
        assert_eq!(h.bin_label(2), Some("b"));
    }
}

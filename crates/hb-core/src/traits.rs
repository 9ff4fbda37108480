//! Core traits for histbook
//!
//! The registry never depends on how an accumulator bins or stores data.
//! It only needs to name it, serialize it, and (for binned objects) read and
//! patch individual bins. Output goes through [`ObjectSink`], so the registry
//! does not know whether objects land in a file or in memory.

use crate::Result;
use crate::types::{Axis, StoredObject};

/// Anything the registry can own and write out.
pub trait Accumulator {
    /// Object name (equals the registry key it was created under).
    fn name(&self) -> &str;

    /// ROOT-style class name (e.g. "TH1D").
    fn class_name(&self) -> &'static str;

    /// Snapshot for serialization.
    fn to_stored(&self) -> StoredObject;
}

/// Accumulator with a 1D bin index space (0 = underflow, `n_bins() + 1` = overflow).
pub trait BinnedAccumulator: Accumulator {
    /// Number of regular bins.
    fn n_bins(&self) -> usize;

    /// Content of `bin`. Out-of-range bins read as 0.
    fn bin_content(&self, bin: usize) -> f64;

    /// Overwrite the content of `bin`. Out-of-range bins are ignored.
    fn set_bin_content(&mut self, bin: usize, value: f64);

    /// Attach a text label to a regular bin (1-based).
    fn set_bin_label(&mut self, bin: usize, label: &str);

    /// Set an axis title.
    fn set_axis_title(&mut self, axis: Axis, title: &str);
}

/// Destination for written objects.
pub trait ObjectSink {
    /// Persist one object into the sink's current location.
    fn write_object(&mut self, object: StoredObject) -> Result<()>;
}

impl<S: ObjectSink + ?Sized> ObjectSink for &mut S {
    fn write_object(&mut self, object: StoredObject) -> Result<()> {
        (**self).write_object(object)
    }
}

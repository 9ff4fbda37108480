//! # hb-core
//!
//! Shared types for histbook: the error type, container kinds, axis
//! specifications, the stored-object model written to output files, and the
//! traits the registry uses to talk to accumulator implementations.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{Accumulator, BinnedAccumulator, ObjectSink};
pub use types::{
    Axis, AxisSpec, ContainerKind, MAX_CELLS, SparseBin, StoredAxis, StoredObject, dense_cell_count,
};

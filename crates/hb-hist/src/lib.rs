//! # hb-hist
//!
//! Statistical containers backing the histbook registry: weighted 1D/2D
//! histograms, sparse N-dimensional histograms, efficiency curves, and
//! tuple/tree records, plus output sinks.
//!
//! ## Example
//!
//! ```no_run
//! use hb_core::{Accumulator, AxisSpec, ObjectSink};
//! use hb_hist::{Hist1D, OutputFile};
//!
//! let mut h = Hist1D::new("h1_pt", "p_T", AxisSpec::new(10, 0.0, 100.0)).with_sumw2();
//! h.fill(42.0, 1.0);
//!
//! let mut out = OutputFile::create("out.json");
//! out.cd("Muons");
//! out.write_object(h.to_stored()).unwrap();
//! out.finish().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod efficiency;
pub mod hist1d;
pub mod hist2d;
pub mod output;
pub mod record;
pub mod sparse;

pub use efficiency::Efficiency;
pub use hist1d::Hist1D;
pub use hist2d::Hist2D;
pub use output::{Directory, MemorySink, OutputFile, StoredKey};
pub use record::{FieldBinding, Record, RecordMode};
pub use sparse::SparseHist;

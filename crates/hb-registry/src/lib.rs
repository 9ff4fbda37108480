//! # hb-registry
//!
//! A registry of named statistical accumulators for event-processing loops.
//!
//! Containers are booked once during setup under canonical keys
//! (`h1_<name>`, `h1_<i>_<particle>_<name>`, `h2_<name>`, `hn_<name>`,
//! `tree_<name>`, `eff_<name>`), filled by semantic name inside the event
//! loop, post-processed, and written out in bulk through substring filters.
//! Fills against unknown names are logged and ignored so a long batch job
//! does not stop over one misspelled histogram.
//!
//! ## Example
//!
//! ```no_run
//! use hb_core::AxisSpec;
//! use hb_hist::OutputFile;
//! use hb_registry::{KeySpec, Registry, WriteFilter};
//!
//! let mut reg = Registry::new();
//! reg.create_hist1d_family(2, "pt", Some("Muon"), &AxisSpec::new(50, 0.0, 500.0).titled("p_T"))
//!     .unwrap();
//! reg.create_hist1d("h_counters", &AxisSpec::new(10, 0.0, 10.0)).unwrap();
//!
//! reg.fill_1d(KeySpec::new("pt").index(0).particle("Muon"), 42.0, 1.0);
//! reg.fill_1d("h_counters", 0.0, 1.0);
//!
//! let mut out = OutputFile::create("out.json");
//! reg.write_all(&mut out, &WriteFilter::substring("Muon")).unwrap();
//! out.finish().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod booking;
pub mod fill;
pub mod naming;
pub mod post;
pub mod registry;
pub mod writer;

pub use booking::BookingConfig;
pub use naming::{COUNTERS_NAME, ContainerKey, KeySpec, synthesize};
pub use post::{assign_labels_of, zero_negative_bins_of};
pub use registry::{Registry, RegistryStats};
pub use writer::{LIST_DELIMITER, WriteFilter, WriteSummary, split};

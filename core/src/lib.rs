//! Classification and DM-histogram core for single-pulse search candidates.
//!
//! A batch of candidates is sanity-checked, split into six mutually exclusive
//! categories by a fixed-priority cascade, and summarised per beam as
//! log-spaced DM histograms. Every stage is a pure function of its input and
//! an immutable configuration.

pub mod candidate;
pub mod classify;
pub mod histogram;
pub mod math;
pub mod prelude;
pub mod telemetry;

pub use candidate::{BeamMask, Candidate, MAX_BEAMS};
pub use classify::{Category, CategoryCounts, Classification, Classifier, ClassifierConfig};
pub use histogram::{BeamHistograms, DmHistogram, HistogramBuilder, HistogramConfig};
pub use prelude::{BatchStage, CoreError, CoreResult};

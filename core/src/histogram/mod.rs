pub mod dm;

pub use dm::{BeamHistograms, DmHistogram, HistogramBin, HistogramBuilder, HistogramConfig};

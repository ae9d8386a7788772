use crate::candidate::Candidate;
use crate::math::stats::StatsHelper;
use crate::prelude::{BatchStage, CoreError, CoreResult};
use crate::telemetry::log::LogManager;
use serde::{Deserialize, Serialize};

/// Domain and resolution of the per-beam DM histograms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    /// Lower DM edge; smaller DMs are clamped up to it before binning.
    pub dm_min: f64,
    pub dm_max: f64,
    /// Floor on the bin count for sparse beams.
    pub min_bins: usize,
    /// Wider boxcars are left out of the histogram.
    pub max_filter_width: u32,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            dm_min: 0.10,
            dm_max: 1010.0,
            min_bins: 30,
            max_filter_width: 10,
        }
    }
}

impl HistogramConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if !self.dm_min.is_finite() || self.dm_min <= 0.0 {
            return Err(CoreError::Config(format!(
                "dm_min must be finite and positive, got {}",
                self.dm_min
            )));
        }
        if !self.dm_max.is_finite() || self.dm_max <= self.dm_min {
            return Err(CoreError::Config(format!(
                "dm_max must be finite and above dm_min ({}), got {}",
                self.dm_min, self.dm_max
            )));
        }
        if self.min_bins == 0 {
            return Err(CoreError::Config("min_bins must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// Geometric bin center in pc cm^-3.
    pub center: f64,
    pub count: usize,
}

/// Log-spaced DM histogram of a single beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmHistogram {
    pub beam: u32,
    pub bins: Vec<HistogramBin>,
    /// Candidates that passed the boxcar filter, i.e. the sum of all counts.
    pub candidates: usize,
    /// Filtered candidates whose DM exceeded `dm_max` and were folded into the last bin.
    pub clipped_high: usize,
}

impl DmHistogram {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|bin| bin.count).sum()
    }

    pub fn peak(&self) -> Option<&HistogramBin> {
        self.bins
            .iter()
            .filter(|bin| bin.count > 0)
            .max_by(|a, b| a.count.cmp(&b.count).then(b.center.total_cmp(&a.center)))
    }
}

/// One histogram per beam, ordered by beam index.
pub type BeamHistograms = Vec<DmHistogram>;

/// Builds adaptive log-DM histograms from candidate subsets.
#[derive(Debug, Clone)]
pub struct HistogramBuilder {
    config: HistogramConfig,
    nbeams: u32,
    logger: LogManager,
}

impl HistogramBuilder {
    pub fn new(config: HistogramConfig, nbeams: u32) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            nbeams,
            logger: LogManager::new(),
        })
    }

    pub fn config(&self) -> &HistogramConfig {
        &self.config
    }

    /// `max(min_bins, 2 * floor(sqrt(n)))`.
    pub fn bin_count(&self, n: usize) -> usize {
        self.config
            .min_bins
            .max(StatsHelper::isqrt(n).saturating_mul(2))
    }

    /// Histograms the candidates of `beam`; candidates of other beams are skipped.
    pub fn build(&self, beam: u32, candidates: &[Candidate]) -> DmHistogram {
        let log_dms: Vec<f64> = candidates
            .iter()
            .filter(|c| c.beam == beam && c.filter_width <= self.config.max_filter_width)
            .map(|c| f64::from(c.dm).max(self.config.dm_min).log10())
            .collect();

        let n = log_dms.len();
        let nbins = self.bin_count(n);
        let log_min = self.config.dm_min.log10();
        let log_max = self.config.dm_max.log10();
        let binwidth = (log_max - log_min) / nbins as f64;

        let mut counts = vec![0usize; nbins];
        let mut clipped_high = 0;
        for &log_dm in &log_dms {
            if log_dm > log_max {
                clipped_high += 1;
            }
            counts[StatsHelper::bin_index(log_dm, log_min, log_max, nbins)] += 1;
        }

        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                center: 10f64.powf(log_min + (i as f64 + 0.5) * binwidth),
                count,
            })
            .collect();

        self.logger.detail(&format!(
            "DM histogram beam {} candidates {} bins {} clipped {}",
            beam, n, nbins, clipped_high
        ));

        DmHistogram {
            beam,
            bins,
            candidates: n,
            clipped_high,
        }
    }

    /// Builds every beam in `0..nbeams`, each from its own accumulator.
    pub fn build_all(&self, candidates: &[Candidate]) -> BeamHistograms {
        let histograms: BeamHistograms = (0..self.nbeams)
            .map(|beam| self.build(beam, candidates))
            .collect();
        let populated = histograms.iter().filter(|h| h.candidates > 0).count();
        self.logger.record(&format!(
            "HistogramBuilder beams {} populated {}",
            histograms.len(),
            populated
        ));
        histograms
    }
}

impl BatchStage for HistogramBuilder {
    type Output = BeamHistograms;

    fn name(&self) -> &'static str {
        "dm-histogram"
    }

    fn execute(&self, candidates: &[Candidate]) -> CoreResult<BeamHistograms> {
        Ok(self.build_all(candidates))
    }
}

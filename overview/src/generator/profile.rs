use anyhow::ensure;
use candcore::{BeamMask, Candidate, MAX_BEAMS};
use rand::{rngs::StdRng, seq::index::sample, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Sampling interval of the synthetic time series, in seconds.
const SAMPLE_TIME: f64 = 64e-6;

/// Upper bound on one synthetic batch; larger requests are rejected.
pub const MAX_SYNTHETIC_CANDIDATES: usize = 1_000_000;

/// Configuration for generating a synthetic candidate batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub count: usize,
    pub nbeams: u32,
    pub seed: u64,
    /// Share of weak, sparsely supported noise spikes.
    pub noise_fraction: f64,
    /// Share of events seen simultaneously in many beams.
    pub coincident_fraction: f64,
    /// Share of wide-boxcar events.
    pub wide_fraction: f64,
    /// Share of events near zero DM.
    pub lowdm_fraction: f64,
    pub description: Option<String>,
    pub scenario: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: 2000,
            nbeams: 40,
            seed: 0,
            noise_fraction: 0.4,
            coincident_fraction: 0.1,
            wide_fraction: 0.1,
            lowdm_fraction: 0.1,
            description: None,
            scenario: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Noise,
    Coincident,
    Wide,
    LowDm,
    Pulse,
}

impl GeneratorConfig {
    fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.count <= MAX_SYNTHETIC_CANDIDATES,
            "generator count must be at most {}, got {}",
            MAX_SYNTHETIC_CANDIDATES,
            self.count
        );
        ensure!(
            (1..=MAX_BEAMS).contains(&self.nbeams),
            "generator nbeams must be in 1..={}, got {}",
            MAX_BEAMS,
            self.nbeams
        );
        let fractions = [
            self.noise_fraction,
            self.coincident_fraction,
            self.wide_fraction,
            self.lowdm_fraction,
        ];
        ensure!(
            fractions.iter().all(|f| f.is_finite() && *f >= 0.0),
            "generator fractions must be non-negative"
        );
        ensure!(
            fractions.iter().sum::<f64>() <= 1.0,
            "generator fractions must sum to at most 1"
        );
        Ok(())
    }

    fn pick_kind(&self, draw: f64) -> EventKind {
        let mut edge = self.noise_fraction;
        if draw < edge {
            return EventKind::Noise;
        }
        edge += self.coincident_fraction;
        if draw < edge {
            return EventKind::Coincident;
        }
        edge += self.wide_fraction;
        if draw < edge {
            return EventKind::Wide;
        }
        edge += self.lowdm_fraction;
        if draw < edge {
            return EventKind::LowDm;
        }
        EventKind::Pulse
    }
}

fn base_event(rng: &mut StdRng, sample_index: u64, beam: u32) -> Candidate {
    let snr = rng.gen_range(7.0..30.0);
    let filter_width = rng.gen_range(0..=3);
    let dm = rng.gen_range(20.0f32..1000.0);
    let half_span = 1u64 << filter_width;
    Candidate::single_beam(
        snr,
        sample_index,
        sample_index as f64 * SAMPLE_TIME,
        filter_width,
        (dm * 2.0) as u32,
        dm,
        rng.gen_range(5..60),
        sample_index.saturating_sub(half_span),
        sample_index + half_span,
        beam,
    )
}

/// Builds a seeded synthetic batch. Coincident events also emit one report
/// from a secondary beam that names the primary beam as its owner.
pub fn build_candidates_from_config(config: &GeneratorConfig) -> anyhow::Result<Vec<Candidate>> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut candidates = Vec::with_capacity(config.count);
    let mut sample_index = 0u64;

    for _ in 0..config.count {
        sample_index += rng.gen_range(100..5000);
        let beam = rng.gen_range(0..config.nbeams);
        let mut cand = base_event(&mut rng, sample_index, beam);

        match config.pick_kind(rng.gen()) {
            EventKind::Noise => {
                cand.snr = rng.gen_range(6.0..8.0);
                cand.members = rng.gen_range(1..3);
                cand.max_snr = cand.snr;
            }
            EventKind::Coincident => {
                let nbeams = config.nbeams as usize;
                let width = rng.gen_range(nbeams.min(5)..=nbeams);
                let mut mask = BeamMask::single(beam);
                for other in sample(&mut rng, nbeams, width).into_iter() {
                    mask = mask.union(BeamMask::single(other as u32));
                }
                cand.beam_mask = mask;
                cand.nbeams_detected = mask.count_ones();
                if let Some(secondary) = (0..config.nbeams).find(|&b| b != beam && mask.contains(b))
                {
                    candidates.push(Candidate {
                        beam: secondary,
                        snr: cand.snr * 0.8,
                        ..cand.clone()
                    });
                }
            }
            EventKind::Wide => {
                cand.filter_width = rng.gen_range(10..=12);
                cand.begin = sample_index.saturating_sub(1 << cand.filter_width);
                cand.end = sample_index + (1 << cand.filter_width);
            }
            EventKind::LowDm => {
                cand.dm = rng.gen_range(0.0..1.5);
                cand.dm_trial = 0;
            }
            EventKind::Pulse => {}
        }
        candidates.push(cand);
    }

    Ok(candidates)
}

pub fn build_candidates(count: usize, nbeams: u32, seed: u64) -> anyhow::Result<Vec<Candidate>> {
    let config = GeneratorConfig {
        count,
        nbeams,
        seed,
        ..Default::default()
    };
    build_candidates_from_config(&config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_is_seeded() {
        let first = build_candidates(300, 8, 21).unwrap();
        let second = build_candidates(300, 8, 21).unwrap();
        assert_eq!(first, second);
        assert!(first.len() >= 300);
        assert!(first.iter().all(|c| c.beam < 8));
    }

    #[test]
    fn coincident_events_span_many_beams() {
        let config = GeneratorConfig {
            count: 50,
            nbeams: 12,
            noise_fraction: 0.0,
            coincident_fraction: 1.0,
            wide_fraction: 0.0,
            lowdm_fraction: 0.0,
            ..Default::default()
        };
        let cands = build_candidates_from_config(&config).unwrap();
        assert_eq!(cands.len(), 100);
        assert!(cands.iter().all(|c| c.beam_mask.count_ones() >= 5));
        assert_eq!(
            cands.iter().filter(|c| c.beam != c.primary_beam).count(),
            50
        );
    }

    #[test]
    fn low_dm_events_stay_below_cut() {
        let config = GeneratorConfig {
            count: 40,
            nbeams: 4,
            noise_fraction: 0.0,
            coincident_fraction: 0.0,
            wide_fraction: 0.0,
            lowdm_fraction: 1.0,
            ..Default::default()
        };
        let cands = build_candidates_from_config(&config).unwrap();
        assert!(cands.iter().all(|c| c.dm < 1.5));
    }

    #[test]
    fn generator_rejects_oversubscribed_fractions() {
        let config = GeneratorConfig {
            noise_fraction: 0.9,
            coincident_fraction: 0.5,
            ..Default::default()
        };
        assert!(build_candidates_from_config(&config).is_err());
    }

    #[test]
    fn generator_rejects_oversized_batches() {
        let config = GeneratorConfig {
            count: 1 << 44,
            nbeams: 4,
            ..Default::default()
        };
        let err = build_candidates_from_config(&config).unwrap_err();
        assert!(err.to_string().contains("generator count must be at most"));

        let at_limit = GeneratorConfig {
            count: MAX_SYNTHETIC_CANDIDATES,
            ..config
        };
        assert!(at_limit.validate().is_ok());
    }
}

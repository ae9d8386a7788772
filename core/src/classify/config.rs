use crate::candidate::{BeamMask, MAX_BEAMS};
use crate::prelude::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Immutable thresholds for the classification cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Total number of beams in the observation.
    pub nbeams: u32,
    /// Candidates below this S/N are hidden.
    pub snr_cut: f32,
    /// Candidates with fewer contributing samples are noise.
    pub members_cut: u32,
    /// Events seen by more than this many active beams are coincident RFI.
    pub nbeams_cut: u32,
    /// Candidates below this DM are low-DM RFI.
    pub dm_cut: f32,
    /// Candidates with a wider boxcar than this are hidden.
    pub filter_cut: u32,
    pub active_beam_mask: BeamMask,
    /// Candidates at or above this boxcar index are wide-pulse RFI.
    pub filter_max: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            nbeams: 40,
            snr_cut: 6.5,
            members_cut: 3,
            nbeams_cut: 3,
            dm_cut: 1.5,
            filter_cut: 0,
            active_beam_mask: BeamMask::all(40),
            filter_max: 39,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.nbeams == 0 || self.nbeams > MAX_BEAMS {
            return Err(CoreError::Config(format!(
                "nbeams must be in 1..={}, got {}",
                MAX_BEAMS, self.nbeams
            )));
        }
        if !self.snr_cut.is_finite() {
            return Err(CoreError::Config(format!(
                "snr_cut must be finite, got {}",
                self.snr_cut
            )));
        }
        if !self.dm_cut.is_finite() || self.dm_cut < 0.0 {
            return Err(CoreError::Config(format!(
                "dm_cut must be finite and non-negative, got {}",
                self.dm_cut
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_every_beam() {
        let cfg = ClassifierConfig::default();
        assert_eq!(cfg.active_beam_mask.count_ones(), cfg.nbeams);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn negative_dm_cut_is_rejected() {
        let cfg = ClassifierConfig {
            dm_cut: -1.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn beam_count_must_fit_mask_width() {
        for nbeams in [0, 65] {
            let cfg = ClassifierConfig {
                nbeams,
                ..Default::default()
            };
            assert!(cfg.validate().is_err());
        }
    }

    #[test]
    fn nan_snr_cut_is_rejected() {
        let cfg = ClassifierConfig {
            snr_cut: f32::NAN,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}

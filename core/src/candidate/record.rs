use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest beam count a [`BeamMask`] can describe.
pub const MAX_BEAMS: u32 = u64::BITS;

/// Fixed-width set of beam indices; bit `i` set means beam `i` is a member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeamMask(pub u64);

impl BeamMask {
    pub const EMPTY: BeamMask = BeamMask(0);

    /// Mask holding only `beam`. Beams at or above [`MAX_BEAMS`] yield an empty mask.
    pub fn single(beam: u32) -> Self {
        BeamMask(1u64.checked_shl(beam).unwrap_or(0))
    }

    /// Mask of the low `nbeams` bits, saturating at all 64 bits.
    pub fn below(nbeams: u32) -> Self {
        if nbeams >= MAX_BEAMS {
            BeamMask(u64::MAX)
        } else {
            BeamMask((1u64 << nbeams) - 1)
        }
    }

    /// Mask with every beam in `0..nbeams` enabled.
    pub fn all(nbeams: u32) -> Self {
        Self::below(nbeams)
    }

    pub fn contains(self, beam: u32) -> bool {
        self.intersect(Self::single(beam)) != Self::EMPTY
    }

    pub fn intersect(self, other: BeamMask) -> Self {
        BeamMask(self.0 & other.0)
    }

    pub fn union(self, other: BeamMask) -> Self {
        BeamMask(self.0 | other.0)
    }

    pub fn count_ones(self) -> u32 {
        self.0.count_ones()
    }

    pub fn bits(self) -> u64 {
        self.0
    }
}

impl From<u64> for BeamMask {
    fn from(bits: u64) -> Self {
        BeamMask(bits)
    }
}

impl fmt::Display for BeamMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// One single-pulse detection event emitted by the upstream search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub snr: f32,
    pub sample_index: u64,
    /// Arrival time in seconds.
    pub time: f64,
    /// log2 boxcar index.
    pub filter_width: u32,
    pub dm_trial: u32,
    /// Dispersion measure in pc cm^-3.
    pub dm: f32,
    pub members: u32,
    pub begin: u64,
    pub end: u64,
    /// 0-based beam index.
    pub beam: u32,
    pub beam_mask: BeamMask,
    pub primary_beam: u32,
    pub nbeams_detected: u32,
    pub max_snr: f32,
}

impl Candidate {
    /// Builds a record for a search that ran without cross-beam coincidencing:
    /// the event is attributed to its own beam only.
    #[allow(clippy::too_many_arguments)]
    pub fn single_beam(
        snr: f32,
        sample_index: u64,
        time: f64,
        filter_width: u32,
        dm_trial: u32,
        dm: f32,
        members: u32,
        begin: u64,
        end: u64,
        beam: u32,
    ) -> Self {
        Self {
            snr,
            sample_index,
            time,
            filter_width,
            dm_trial,
            dm,
            members,
            begin,
            end,
            beam,
            beam_mask: BeamMask::single(beam),
            primary_beam: beam,
            nbeams_detected: 1,
            max_snr: snr,
        }
    }

    /// Returns the name of the first non-finite floating-point field, if any.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        if !self.snr.is_finite() {
            Some("snr")
        } else if !self.time.is_finite() {
            Some("time")
        } else if !self.dm.is_finite() {
            Some("dm")
        } else if !self.max_snr.is_finite() {
            Some("max_snr")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_saturates_at_word_width() {
        assert_eq!(BeamMask::below(0), BeamMask::EMPTY);
        assert_eq!(BeamMask::below(3).bits(), 0b111);
        assert_eq!(BeamMask::below(64).bits(), u64::MAX);
        assert_eq!(BeamMask::below(80).bits(), u64::MAX);
    }

    #[test]
    fn single_out_of_range_is_empty() {
        assert_eq!(BeamMask::single(2).bits(), 0b100);
        assert_eq!(BeamMask::single(64), BeamMask::EMPTY);
        assert!(!BeamMask::single(70).contains(70));
    }

    #[test]
    fn single_beam_record_reports_itself() {
        let cand = Candidate::single_beam(9.0, 100, 0.5, 2, 14, 56.7, 8, 90, 110, 5);
        assert_eq!(cand.beam_mask, BeamMask::single(5));
        assert_eq!(cand.primary_beam, 5);
        assert_eq!(cand.nbeams_detected, 1);
        assert_eq!(cand.max_snr, 9.0);
        assert_eq!(cand.non_finite_field(), None);
    }

    #[test]
    fn non_finite_fields_are_named() {
        let mut cand = Candidate::single_beam(9.0, 100, 0.5, 2, 14, 56.7, 8, 90, 110, 5);
        cand.dm = f32::NAN;
        assert_eq!(cand.non_finite_field(), Some("dm"));
    }
}

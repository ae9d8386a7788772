use crate::candidate::BeamMask;

/// Counts how many enabled beams took part in a coincident event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeamCoincidenceCounter {
    window: BeamMask,
}

impl BeamCoincidenceCounter {
    /// Only bits that are both active and below `nbeams` are ever counted.
    pub fn new(active: BeamMask, nbeams: u32) -> Self {
        Self {
            window: active.intersect(BeamMask::below(nbeams)),
        }
    }

    pub fn count(&self, mask: BeamMask) -> u32 {
        mask.intersect(self.window).count_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn bits_at_or_above_nbeams_are_ignored() {
        let counter = BeamCoincidenceCounter::new(BeamMask(u64::MAX), 4);
        assert_eq!(counter.count(BeamMask(0b1111)), 4);
        assert_eq!(counter.count(BeamMask(0b1111_0000)), 0);
        assert_eq!(counter.count(BeamMask(u64::MAX)), 4);
    }

    #[test]
    fn inactive_beams_are_not_counted() {
        let counter = BeamCoincidenceCounter::new(BeamMask(0b1010), 8);
        assert_eq!(counter.count(BeamMask(0b1111)), 2);
    }

    #[test]
    fn full_width_counts_top_bit() {
        let counter = BeamCoincidenceCounter::new(BeamMask(u64::MAX), 64);
        assert_eq!(counter.count(BeamMask::single(63)), 1);
        assert_eq!(counter.count(BeamMask(u64::MAX)), 64);
    }

    #[test]
    fn adding_bits_never_decreases_count() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let nbeams = rng.gen_range(1..=64);
            let counter = BeamCoincidenceCounter::new(BeamMask(rng.gen()), nbeams);
            let mask = BeamMask(rng.gen());
            let extra = BeamMask(rng.gen());
            assert!(counter.count(mask.union(extra)) >= counter.count(mask));
        }
    }
}

pub struct StatsHelper;

impl StatsHelper {
    /// Exact `floor(sqrt(n))` for every `usize`.
    pub fn isqrt(n: usize) -> usize {
        if n < 2 {
            return n;
        }
        let mut root = (n as f64).sqrt() as usize;
        // f64 rounding can be off by one either way for large n
        while root.checked_mul(root).map_or(true, |sq| sq > n) {
            root -= 1;
        }
        while (root + 1).checked_mul(root + 1).map_or(false, |sq| sq <= n) {
            root += 1;
        }
        root
    }

    /// Index of the equal-width bin holding `value` on `[lo, hi]`.
    ///
    /// Values on an interior edge fall in the upper bin, `hi` itself lands in
    /// the last bin, and out-of-range values are clamped to the end bins.
    pub fn bin_index(value: f64, lo: f64, hi: f64, nbins: usize) -> usize {
        if nbins == 0 || value <= lo {
            return 0;
        }
        let last = nbins - 1;
        if value >= hi {
            return last;
        }
        let scaled = (value - lo) / (hi - lo) * nbins as f64;
        (scaled.floor() as usize).min(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isqrt_matches_small_squares() {
        assert_eq!(StatsHelper::isqrt(0), 0);
        assert_eq!(StatsHelper::isqrt(1), 1);
        assert_eq!(StatsHelper::isqrt(3), 1);
        assert_eq!(StatsHelper::isqrt(4), 2);
        assert_eq!(StatsHelper::isqrt(224), 14);
        assert_eq!(StatsHelper::isqrt(225), 15);
    }

    #[test]
    fn isqrt_is_exact_near_word_limit() {
        let root = StatsHelper::isqrt(usize::MAX);
        assert!(root.checked_mul(root).is_some());
        assert!((root + 1).checked_mul(root + 1).is_none());
    }

    #[test]
    fn bin_index_clamps_and_closes_last_bin() {
        assert_eq!(StatsHelper::bin_index(-5.0, 0.0, 10.0, 10), 0);
        assert_eq!(StatsHelper::bin_index(0.0, 0.0, 10.0, 10), 0);
        assert_eq!(StatsHelper::bin_index(1.0, 0.0, 10.0, 10), 1);
        assert_eq!(StatsHelper::bin_index(9.99, 0.0, 10.0, 10), 9);
        assert_eq!(StatsHelper::bin_index(10.0, 0.0, 10.0, 10), 9);
        assert_eq!(StatsHelper::bin_index(50.0, 0.0, 10.0, 10), 9);
    }
}

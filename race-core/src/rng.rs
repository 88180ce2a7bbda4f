/// xorshift32. Small and fully reproducible across platforms, which is all
/// track generation and the tuner need.
#[derive(Clone, Copy, Debug)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        // Zero is a fixed point of xorshift.
        Self {
            state: if seed == 0 { 0x9E37_79B9 } else { seed },
        }
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform in `[min, max_exclusive)`.
    pub fn next_range(&mut self, min: i32, max_exclusive: i32) -> i32 {
        debug_assert!(max_exclusive > min);
        let span = (max_exclusive as i64 - min as i64) as u32;
        (min as i64 + (self.next_u32() % span) as i64) as i32
    }

    /// Uniform in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        self.next_u32() as f64 / (u32::MAX as f64 + 1.0)
    }

    /// Uniform in `[lo, hi)`; returns `lo` for an empty interval.
    pub fn next_between(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        lo + (hi - lo) * self.next_unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = SeededRng::new(42);
        let mut b = SeededRng::new(42);
        for _ in 0..64 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn zero_seed_does_not_stall() {
        let mut rng = SeededRng::new(0);
        assert_ne!(rng.next_u32(), 0);
        assert_ne!(rng.state(), 0);
    }

    #[test]
    fn ranges_stay_in_bounds() {
        let mut rng = SeededRng::new(7);
        for _ in 0..1_000 {
            let v = rng.next_range(-3, 4);
            assert!((-3..4).contains(&v));
            let u = rng.next_unit();
            assert!((0.0..1.0).contains(&u));
            let w = rng.next_between(10.0, 20.0);
            assert!((10.0..20.0).contains(&w));
        }
        assert_eq!(rng.next_between(5.0, 5.0), 5.0);
    }
}

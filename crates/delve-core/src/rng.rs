//! Random source for level generation
//!
//! Every roll a generator makes goes through one `GameRng`, so the seed it
//! was built from is enough to rebuild a level. The seed travels with the
//! finished level rather than with the generator.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// ChaCha8 stream that remembers its seed
#[derive(Debug, Clone)]
pub struct GameRng {
    seed: u64,
    rng: ChaCha8Rng,
}

impl GameRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Stream on a seed drawn from the thread generator
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng().next_u64())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restart the stream from a new seed
    pub fn reseed(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// Uniform value in `0..n`
    ///
    /// Returns 0 if n <= 0.
    pub fn randint0(&mut self, n: i32) -> i32 {
        if n <= 0 {
            return 0;
        }
        self.rng.gen_range(0..n)
    }

    /// Uniform value in `1..=n`
    ///
    /// Returns 0 if n <= 0.
    pub fn randint1(&mut self, n: i32) -> i32 {
        if n <= 0 {
            return 0;
        }
        self.rng.gen_range(1..=n)
    }

    /// Returns true with probability 1/n
    ///
    /// `one_in(0)` and `one_in(1)` are always true.
    pub fn one_in(&mut self, n: i32) -> bool {
        self.randint0(n) == 0
    }

    /// Returns true with probability percent/100
    pub fn percent(&mut self, percent: i32) -> bool {
        self.randint0(100) < percent
    }

    /// Returns true with probability x/y
    pub fn chance(&mut self, x: i32, y: i32) -> bool {
        self.randint0(y) < x
    }

    /// Uniform value in `a-d..=a+d`
    pub fn spread(&mut self, a: i32, d: i32) -> i32 {
        a + self.randint0(1 + d + d) - d
    }

    /// Uniform value in `a..=b`
    ///
    /// Returns `a` when the range is empty.
    pub fn range(&mut self, a: i32, b: i32) -> i32 {
        if b <= a {
            return a;
        }
        a + self.randint0(1 + b - a)
    }

    /// Gaussian sample rounded to the nearest integer
    ///
    /// A non-positive standard deviation returns the mean.
    pub fn normal(&mut self, mean: i32, stdev: i32) -> i32 {
        if stdev <= 0 {
            return mean;
        }
        match Normal::new(mean as f64, stdev as f64) {
            Ok(dist) => dist.sample(&mut self.rng).round() as i32,
            Err(_) => mean,
        }
    }

    /// Choose a random element from a slice
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            Some(&items[self.randint0(items.len() as i32) as usize])
        }
    }

    /// Shuffle a slice in place (Knuth)
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.randint0(i as i32 + 1) as usize;
            items.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_randint0_bounds() {
        let mut rng = GameRng::new(42);
        for _ in 0..1000 {
            let n = rng.randint0(10);
            assert!((0..10).contains(&n));
        }
    }

    #[test]
    fn test_randint1_bounds() {
        let mut rng = GameRng::new(42);
        for _ in 0..1000 {
            let n = rng.randint1(6);
            assert!((1..=6).contains(&n));
        }
    }

    #[test]
    fn test_spread_and_range() {
        let mut rng = GameRng::new(7);
        for _ in 0..1000 {
            let s = rng.spread(20, 3);
            assert!((17..=23).contains(&s));
            let r = rng.range(25, 40);
            assert!((25..=40).contains(&r));
        }
        assert_eq!(rng.range(5, 5), 5);
        assert_eq!(rng.range(9, 3), 9);
    }

    #[test]
    fn test_reproducibility() {
        let mut rng1 = GameRng::new(42);
        let mut rng2 = GameRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.randint0(100), rng2.randint0(100));
        }
    }

    #[test]
    fn test_reseed_restarts_stream() {
        let mut rng = GameRng::new(1);
        let first: Vec<i32> = (0..10).map(|_| rng.randint0(1000)).collect();
        rng.reseed(1);
        let again: Vec<i32> = (0..10).map(|_| rng.randint0(1000)).collect();
        assert_eq!(first, again);
        assert_eq!(rng.seed(), 1);
    }

    #[test]
    fn test_zero_inputs() {
        let mut rng = GameRng::new(42);
        assert_eq!(rng.randint0(0), 0);
        assert_eq!(rng.randint1(0), 0);
        assert_eq!(rng.randint0(-3), 0);
        assert!(rng.one_in(0));
        assert!(rng.one_in(1));
        assert!(!rng.percent(0));
        assert!(rng.percent(100));
        assert_eq!(rng.normal(12, 0), 12);
    }

    #[test]
    fn test_normal_centres_on_mean() {
        let mut rng = GameRng::new(99);
        let total: i64 = (0..2000).map(|_| rng.normal(50, 5) as i64).sum();
        let mean = total / 2000;
        assert!((48..=52).contains(&mean), "mean drifted to {mean}");
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = GameRng::new(3);
        let mut items: Vec<usize> = (0..50).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }
}

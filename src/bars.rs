//! The sequence of bar heights being visualized.
//!
//! Length never changes after construction. Mutation goes through `swap` and
//! `overwrite` only, and the value is moved into the worker for the duration of
//! a run, so there is never more than one writer.

use crate::model::{BAR_COUNT, MAX_VALUE, MIN_VALUE};
use rand::Rng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bars {
    values: Vec<u32>,
}

impl Bars {
    /// A freshly shuffled sequence of `BAR_COUNT` bars.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut bars = Self {
            values: vec![MIN_VALUE; BAR_COUNT],
        };
        bars.randomize(rng);
        bars
    }

    pub fn from_values(values: Vec<u32>) -> Self {
        Self { values }
    }

    /// Refill every slot with an independent uniform value in `[MIN_VALUE, MAX_VALUE]`.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for v in self.values.iter_mut() {
            *v = rng.gen_range(MIN_VALUE..=MAX_VALUE);
        }
    }

    pub fn swap(&mut self, i: usize, j: usize) {
        self.values.swap(i, j);
    }

    pub fn overwrite(&mut self, i: usize, value: u32) {
        self.values[i] = value;
    }

    pub fn get(&self, i: usize) -> u32 {
        self.values[i]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn snapshot(&self) -> Vec<u32> {
        self.values.clone()
    }

    pub fn is_sorted(&self) -> bool {
        self.values.windows(2).all(|w| w[0] <= w[1])
    }

    /// Sort in place without any visualization.
    pub(crate) fn sort_instantly(&mut self) {
        self.values.sort_unstable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn shuffle_stays_in_range_and_keeps_length() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut bars = Bars::random(&mut rng);
        for _ in 0..20 {
            bars.randomize(&mut rng);
            assert_eq!(bars.len(), BAR_COUNT);
            assert!(bars
                .values()
                .iter()
                .all(|v| (MIN_VALUE..=MAX_VALUE).contains(v)));
        }
    }

    #[test]
    fn consecutive_shuffles_differ() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut bars = Bars::random(&mut rng);
        let first = bars.snapshot();
        bars.randomize(&mut rng);
        assert_ne!(first, bars.snapshot());
    }

    #[test]
    fn swap_and_overwrite() {
        let mut bars = Bars::from_values(vec![1, 2, 3]);
        bars.swap(0, 2);
        assert_eq!(bars.values(), &[3, 2, 1]);
        bars.overwrite(1, 9);
        assert_eq!(bars.values(), &[3, 9, 1]);
        assert!(!bars.is_sorted());
        bars.sort_instantly();
        assert!(bars.is_sorted());
    }
}

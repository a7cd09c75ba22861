//! Explicit-versus-randomized decision for one tree level

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inclusive bounds on how many children a randomized level gets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountBounds {
    pub min: u32,
    pub max: u32,
}

impl CountBounds {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Draw a count uniformly from `[min, max]`; a max below min wins
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let lo = self.min.min(self.max);
        rng.gen_range(lo..=self.max) as usize
    }
}

/// How the children of one level are produced
#[derive(Debug, Clone, PartialEq)]
pub enum LevelPlan<T> {
    /// Use exactly these attribute sets, in order
    Explicit(Vec<T>),
    /// Generate a random number of children from empty attribute sets
    Randomized(CountBounds),
}

/// Decide a level's plan. An absent or empty explicit list falls back to
/// randomized generation so sub-levels can be mixed freely.
pub fn resolve_level<T, I>(explicit: Option<I>, bounds: CountBounds) -> LevelPlan<T>
where
    I: IntoIterator<Item = T>,
{
    let items: Vec<T> = explicit.into_iter().flatten().collect();
    if items.is_empty() {
        LevelPlan::Randomized(bounds)
    } else {
        LevelPlan::Explicit(items)
    }
}

impl<T: Default> LevelPlan<T> {
    /// Attribute sets to build children from; randomized children start
    /// from defaults, which leaves every field to sampling.
    pub fn into_items<R: Rng + ?Sized>(self, rng: &mut R) -> Vec<T> {
        match self {
            LevelPlan::Explicit(items) => items,
            LevelPlan::Randomized(bounds) => {
                let count = bounds.sample(rng);
                (0..count).map(|_| T::default()).collect()
            }
        }
    }
}

impl<T> LevelPlan<T> {
    pub fn is_explicit(&self) -> bool {
        matches!(self, LevelPlan::Explicit(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_missing_level_is_randomized() {
        let plan: LevelPlan<u8> = resolve_level(None::<Vec<u8>>, CountBounds::new(1, 4));
        assert_eq!(plan, LevelPlan::Randomized(CountBounds::new(1, 4)));
    }

    #[test]
    fn test_empty_level_is_randomized() {
        let plan = resolve_level(Some(Vec::<u8>::new()), CountBounds::new(0, 2));
        assert!(!plan.is_explicit());
    }

    #[test]
    fn test_explicit_level_kept_in_order() {
        let plan = resolve_level(Some(vec![3, 1, 2]), CountBounds::new(1, 1));
        assert_eq!(plan, LevelPlan::Explicit(vec![3, 1, 2]));
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(plan.into_items(&mut rng), vec![3, 1, 2]);
    }

    #[test]
    fn test_randomized_count_within_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let items = LevelPlan::<u8>::Randomized(CountBounds::new(2, 5)).into_items(&mut rng);
            assert!((2..=5).contains(&items.len()));
        }
    }

    #[test]
    fn test_zero_max_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(CountBounds::new(1, 0).sample(&mut rng), 0);
        assert_eq!(CountBounds::new(0, 0).sample(&mut rng), 0);
    }
}

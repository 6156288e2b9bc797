use super::{CrossoverError, CrossoverStrategy, common_length};
use crate::model::Individual;
use rand::Rng;
use rand_pcg::Pcg32;

/// Ring crossover.
///
/// The genome is treated as a circle. A contiguous arc starting at a random
/// index, with a random length in `[1, n]`, is taken from one parent and kept
/// at the same positions; every position outside the arc comes from the
/// other parent in its original order. The second child is the mirror image.
#[derive(Debug, Clone)]
pub struct AnnularCrossover {
    rng: Pcg32,
}

impl AnnularCrossover {
    pub fn new(rng: Pcg32) -> Self {
        Self { rng }
    }

    /// Builds both children for a ring of `length` genes starting at `start`.
    pub fn exchange_ring(
        a: &Individual,
        b: &Individual,
        start: usize,
        length: usize,
    ) -> (Individual, Individual) {
        let n = a.len();
        let mut in_ring = vec![false; n];
        for offset in 0..length.min(n) {
            in_ring[(start + offset) % n] = true;
        }

        let (a, b) = (a.triangles(), b.triangles());
        let mut child1 = Vec::with_capacity(n);
        let mut child2 = Vec::with_capacity(n);
        for (i, &ring) in in_ring.iter().enumerate() {
            if ring {
                child1.push(a[i]);
                child2.push(b[i]);
            } else {
                child1.push(b[i]);
                child2.push(a[i]);
            }
        }
        (child1.into(), child2.into())
    }
}

impl CrossoverStrategy for AnnularCrossover {
    fn crossover(
        &mut self,
        parent1: &Individual,
        parent2: &Individual,
    ) -> Result<(Individual, Individual), CrossoverError> {
        let n = common_length(parent1, parent2)?;
        if n == 0 {
            return Ok((parent1.clone(), parent2.clone()));
        }
        let start = self.rng.random_range(0..n);
        let length = self.rng.random_range(1..=n);
        Ok(Self::exchange_ring(parent1, parent2, start, length))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_ring_wraps_around() {
        let p1 = tagged_parent([0, 1, 2, 3, 4]);
        let p2 = tagged_parent([10, 11, 12, 13, 14]);
        let (c1, c2) = AnnularCrossover::exchange_ring(&p1, &p2, 3, 3);
        assert_eq!(tags(&c1), vec![0, 11, 12, 3, 4]);
        assert_eq!(tags(&c2), vec![10, 1, 2, 13, 14]);
    }

    #[test]
    fn test_full_ring_copies_parents() {
        let p1 = tagged_parent([0, 1, 2]);
        let p2 = tagged_parent([10, 11, 12]);
        let (c1, c2) = AnnularCrossover::exchange_ring(&p1, &p2, 2, 3);
        assert_eq!(c1, p1);
        assert_eq!(c2, p2);
    }

    #[test]
    fn test_random_rings_keep_length_and_parent_material() {
        let mut xover = AnnularCrossover::new(Pcg32::seed_from_u64(42));
        let p1 = tagged_parent(0..5);
        let p2 = tagged_parent(5..10);
        for _ in 0..30 {
            let (c1, c2) = xover.crossover(&p1, &p2).unwrap();
            assert_eq!(c1.len(), 5);
            assert_eq!(c2.len(), 5);
            // the ring is never empty, so each child keeps something of its own parent
            assert!(tags(&c1).iter().any(|t| *t < 5));
            assert!(tags(&c2).iter().any(|t| *t >= 5));
        }
        assert_eq!(tags(&p1), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_empty_parents() {
        let mut xover = AnnularCrossover::new(Pcg32::seed_from_u64(1));
        let empty = Individual::new(Vec::new());
        let (c1, c2) = xover.crossover(&empty, &empty).unwrap();
        assert!(c1.is_empty() && c2.is_empty());
    }
}

use super::{CrossoverError, CrossoverStrategy, common_length};
use crate::model::{Individual, Triangle};
use rand::Rng;
use rand_pcg::Pcg32;

/// Swaps the tails of both parents at a single random cut point in `[1, n-1]`.
#[derive(Debug, Clone)]
pub struct OnePointCrossover {
    rng: Pcg32,
}

impl OnePointCrossover {
    pub fn new(rng: Pcg32) -> Self {
        Self { rng }
    }

    /// Children `a[..cut] + b[cut..]` and `b[..cut] + a[cut..]`.
    pub fn exchange_tails(a: &Individual, b: &Individual, cut: usize) -> (Individual, Individual) {
        let (a, b) = (a.triangles(), b.triangles());
        let child1 = a[..cut].iter().chain(&b[cut..]).copied().collect::<Vec<_>>();
        let child2 = b[..cut].iter().chain(&a[cut..]).copied().collect::<Vec<_>>();
        (child1.into(), child2.into())
    }
}

impl CrossoverStrategy for OnePointCrossover {
    fn crossover(
        &mut self,
        parent1: &Individual,
        parent2: &Individual,
    ) -> Result<(Individual, Individual), CrossoverError> {
        let n = common_length(parent1, parent2)?;
        if n < 2 {
            return Ok((
                Individual::new(parent1.to_genes()),
                Individual::new(parent2.to_genes()),
            ));
        }
        let cut = self.rng.random_range(1..n);
        Ok(Self::exchange_tails(parent1, parent2, cut))
    }
}

/// Swaps the segment between two random cut points.
///
/// `point1` is drawn from `[1, n-2]` and `point2` from `[point1+1, n-1]`, so
/// both children keep at least one gene of their own parent on each side.
#[derive(Debug, Clone)]
pub struct TwoPointCrossover {
    rng: Pcg32,
}

impl TwoPointCrossover {
    pub fn new(rng: Pcg32) -> Self {
        Self { rng }
    }

    /// Children `a[..p1] + b[p1..p2] + a[p2..]` and the mirror image.
    pub fn swap_segment(
        a: &Individual,
        b: &Individual,
        point1: usize,
        point2: usize,
    ) -> (Individual, Individual) {
        let (a, b) = (a.triangles(), b.triangles());
        let splice = |outer: &[Triangle], inner: &[Triangle]| -> Individual {
            outer[..point1]
                .iter()
                .chain(&inner[point1..point2])
                .chain(&outer[point2..])
                .copied()
                .collect::<Vec<_>>()
                .into()
        };
        (splice(a, b), splice(b, a))
    }
}

impl CrossoverStrategy for TwoPointCrossover {
    fn crossover(
        &mut self,
        parent1: &Individual,
        parent2: &Individual,
    ) -> Result<(Individual, Individual), CrossoverError> {
        let n = common_length(parent1, parent2)?;
        if n < 3 {
            return Ok((
                Individual::new(parent1.to_genes()),
                Individual::new(parent2.to_genes()),
            ));
        }
        let point1 = self.rng.random_range(1..n - 1);
        let point2 = self.rng.random_range(point1 + 1..n);
        Ok(Self::swap_segment(parent1, parent2, point1, point2))
    }
}

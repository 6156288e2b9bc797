use super::{CrossoverError, CrossoverStrategy, common_length};
use crate::model::Individual;
use rand::Rng;
use rand_pcg::Pcg32;

/// Position-wise exchange of whole triangles.
///
/// With probability `p` a position keeps parent1's gene in child1 (and
/// parent2's in child2); otherwise the two genes trade places.
#[derive(Debug, Clone)]
pub struct UniformCrossover {
    p: f64,
    rng: Pcg32,
}

impl UniformCrossover {
    pub fn new(p: f64, rng: Pcg32) -> Self {
        Self { p, rng }
    }
}

impl CrossoverStrategy for UniformCrossover {
    fn crossover(
        &mut self,
        parent1: &Individual,
        parent2: &Individual,
    ) -> Result<(Individual, Individual), CrossoverError> {
        let n = common_length(parent1, parent2)?;
        let mut child1 = Vec::with_capacity(n);
        let mut child2 = Vec::with_capacity(n);
        for (&t1, &t2) in parent1.triangles().iter().zip(parent2.triangles()) {
            if self.rng.random::<f64>() < self.p {
                child1.push(t1);
                child2.push(t2);
            } else {
                child1.push(t2);
                child2.push(t1);
            }
        }
        Ok((child1.into(), child2.into()))
    }
}

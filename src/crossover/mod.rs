//! Recombination operators.
//!
//! Whole triangles are the unit of exchange. Children are always fresh
//! `Individual`s; parents are only read.

pub mod annular;
pub mod point;
pub mod uniform;

pub use annular::AnnularCrossover;
pub use point::{OnePointCrossover, TwoPointCrossover};
pub use uniform::UniformCrossover;

use crate::config::ConfigError;
use crate::model::Individual;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CrossoverError {
    #[error("Parents must have the same number of triangles ({left} != {right})")]
    LengthMismatch { left: usize, right: usize },
}

/// Combines two parents into two children of the same gene count.
pub trait CrossoverStrategy: Send {
    fn crossover(
        &mut self,
        parent1: &Individual,
        parent2: &Individual,
    ) -> Result<(Individual, Individual), CrossoverError>;
}

/// Returns the shared gene count of both parents.
pub(crate) fn common_length(a: &Individual, b: &Individual) -> Result<usize, CrossoverError> {
    if a.len() == b.len() {
        Ok(a.len())
    } else {
        Err(CrossoverError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        })
    }
}

/// Registry of crossover strategies, keyed by the `name` field of the table.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum CrossoverConfig {
    OnePoint,
    TwoPoint,
    Uniform {
        #[serde(default = "default_p")]
        p: f64,
    },
    Annular,
}

fn default_p() -> f64 {
    0.5
}

impl CrossoverConfig {
    pub fn name(&self) -> &'static str {
        match self {
            CrossoverConfig::OnePoint => "one_point",
            CrossoverConfig::TwoPoint => "two_point",
            CrossoverConfig::Uniform { .. } => "uniform",
            CrossoverConfig::Annular => "annular",
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let CrossoverConfig::Uniform { p } = *self {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::InvalidParameter {
                    strategy: self.name(),
                    reason: format!("p must lie in [0, 1], got {p}"),
                });
            }
        }
        Ok(())
    }

    /// Validates the parameters and constructs the strategy around `rng`.
    pub fn build(&self, rng: Pcg32) -> Result<Box<dyn CrossoverStrategy>, ConfigError> {
        self.validate()?;
        let strategy: Box<dyn CrossoverStrategy> = match *self {
            CrossoverConfig::OnePoint => Box::new(OnePointCrossover::new(rng)),
            CrossoverConfig::TwoPoint => Box::new(TwoPointCrossover::new(rng)),
            CrossoverConfig::Uniform { p } => Box::new(UniformCrossover::new(p, rng)),
            CrossoverConfig::Annular => Box::new(AnnularCrossover::new(rng)),
        };
        Ok(strategy)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::model::{Individual, Triangle};

    /// A triangle whose color channels all equal `tag`, so genes are easy to trace.
    pub fn tagged(tag: u8) -> Triangle {
        Triangle::new([0.0, 0.0], [0.0, 0.0], [0.0, 0.0], [tag; 4], tag as f64)
    }

    pub fn tagged_parent(tags: impl IntoIterator<Item = u8>) -> Individual {
        Individual::new(tags.into_iter().map(tagged).collect())
    }

    pub fn tags(individual: &Individual) -> Vec<u8> {
        individual.triangles().iter().map(|t| t.color[0]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_every_strategy_preserves_parents_and_length() {
        let configs = [
            CrossoverConfig::OnePoint,
            CrossoverConfig::TwoPoint,
            CrossoverConfig::Uniform { p: 0.5 },
            CrossoverConfig::Annular,
        ];
        let p1 = tagged_parent(0..8);
        let p2 = tagged_parent(10..18);
        let (before1, before2) = (p1.to_genes(), p2.to_genes());

        for cfg in configs {
            let mut strategy = cfg.build(Pcg32::seed_from_u64(9)).unwrap();
            for _ in 0..20 {
                let (c1, c2) = strategy.crossover(&p1, &p2).unwrap();
                assert_eq!(c1.len(), 8, "{}", cfg.name());
                assert_eq!(c2.len(), 8, "{}", cfg.name());
                // every position holds the gene of one of the parents at that position
                for i in 0..8 {
                    let pair = [tags(&c1)[i], tags(&c2)[i]];
                    assert!(
                        pair == [i as u8, 10 + i as u8] || pair == [10 + i as u8, i as u8],
                        "{} broke position {i}",
                        cfg.name()
                    );
                }
            }
            assert_eq!(p1.to_genes(), before1);
            assert_eq!(p2.to_genes(), before2);
        }
    }

    #[test]
    fn test_every_strategy_rejects_mismatched_parents() {
        let configs = [
            CrossoverConfig::OnePoint,
            CrossoverConfig::TwoPoint,
            CrossoverConfig::Uniform { p: 0.5 },
            CrossoverConfig::Annular,
        ];
        for cfg in configs {
            let mut strategy = cfg.build(Pcg32::seed_from_u64(1)).unwrap();
            let err = strategy
                .crossover(&tagged_parent(0..3), &tagged_parent(0..4))
                .unwrap_err();
            assert_eq!(err, CrossoverError::LengthMismatch { left: 3, right: 4 });
        }
    }

    #[test]
    fn test_uniform_probability_is_validated() {
        let cfg = CrossoverConfig::Uniform { p: -0.1 };
        assert!(cfg.build(Pcg32::seed_from_u64(0)).is_err());
    }
}

//! Parent and survivor selection.
//!
//! Every strategy works on *selection scores*: non-negative values where a
//! larger score is always better. The engine derives them from raw fitness
//! once per generation, so strategies never need to know whether the run is
//! minimizing or maximizing.

pub mod elite;
pub mod proportional;
pub mod tournament;

pub use elite::EliteSelection;
pub use proportional::{BoltzmannSelection, RankingSelection, RouletteSelection, UniversalSelection};
pub use tournament::{ProbTournamentSelection, TournamentSelection};

use crate::config::ConfigError;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum SelectionError {
    #[error("Cannot select {k} indices from an empty score list")]
    EmptyScores { k: usize },
    #[error("Selection scores must be non-negative with a positive sum, got total {total}")]
    NonPositiveTotal { total: f64 },
    #[error("Overflow in exp(score / t) at temperature {temperature}. Try increasing t_initial or t_final")]
    Overflow { temperature: f64 },
}

/// Picks `k` indices into a score slice.
///
/// Indices may repeat unless the implementation says otherwise. Strategies own
/// their random source and are only ever called from the engine thread.
pub trait SelectionStrategy: Send {
    fn select(&mut self, scores: &[f64], k: usize) -> Result<Vec<usize>, SelectionError>;
}

/// Registry of selection strategies, keyed by the `name` field of the table.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum SelectionConfig {
    Elite,
    Roulette,
    Universal,
    Ranking,
    Boltzmann {
        #[serde(default = "default_t_initial")]
        t_initial: f64,
        #[serde(default = "default_t_final")]
        t_final: f64,
        #[serde(default = "default_decay")]
        decay: f64,
    },
    Tournament {
        #[serde(default = "default_tournament_size")]
        tournament_size: usize,
    },
    ProbTournament {
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
}

fn default_t_initial() -> f64 {
    100.0
}

fn default_t_final() -> f64 {
    10.0
}

fn default_decay() -> f64 {
    0.99
}

fn default_tournament_size() -> usize {
    3
}

fn default_threshold() -> f64 {
    0.75
}

impl SelectionConfig {
    /// Registry name of the strategy.
    pub fn name(&self) -> &'static str {
        match self {
            SelectionConfig::Elite => "elite",
            SelectionConfig::Roulette => "roulette",
            SelectionConfig::Universal => "universal",
            SelectionConfig::Ranking => "ranking",
            SelectionConfig::Boltzmann { .. } => "boltzmann",
            SelectionConfig::Tournament { .. } => "tournament",
            SelectionConfig::ProbTournament { .. } => "prob_tournament",
        }
    }

    /// Checks the constructor parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidParameter {
            strategy: self.name(),
            reason,
        };
        match *self {
            SelectionConfig::Boltzmann {
                t_initial,
                t_final,
                decay,
            } => {
                if !(t_initial > t_final && t_final > 0.0) {
                    return Err(invalid(format!(
                        "require t_initial > t_final > 0, got t_initial={t_initial}, t_final={t_final}"
                    )));
                }
                if !(decay > 0.0) {
                    return Err(invalid(format!("require decay > 0, got {decay}")));
                }
            }
            SelectionConfig::Tournament { tournament_size } if tournament_size == 0 => {
                return Err(invalid("tournament_size must be at least 1".to_string()));
            }
            SelectionConfig::ProbTournament { threshold } if !(0.0..=1.0).contains(&threshold) => {
                return Err(invalid(format!("threshold must lie in [0, 1], got {threshold}")));
            }
            _ => {}
        }
        Ok(())
    }

    /// Validates the parameters and constructs the strategy.
    ///
    /// # Arguments
    /// * `rng` - Private random source handed to the strategy
    ///
    /// # Returns
    /// * `Result<Box<dyn SelectionStrategy>, ConfigError>`
    pub fn build(&self, rng: Pcg32) -> Result<Box<dyn SelectionStrategy>, ConfigError> {
        self.validate()?;
        let strategy: Box<dyn SelectionStrategy> = match *self {
            SelectionConfig::Elite => Box::new(EliteSelection),
            SelectionConfig::Roulette => Box::new(RouletteSelection::new(rng)),
            SelectionConfig::Universal => Box::new(UniversalSelection::new(rng)),
            SelectionConfig::Ranking => Box::new(RankingSelection::new(rng)),
            SelectionConfig::Boltzmann {
                t_initial,
                t_final,
                decay,
            } => Box::new(BoltzmannSelection::new(t_initial, t_final, decay, rng)),
            SelectionConfig::Tournament { tournament_size } => {
                Box::new(TournamentSelection::new(tournament_size, rng))
            }
            SelectionConfig::ProbTournament { threshold } => {
                Box::new(ProbTournamentSelection::new(threshold, rng))
            }
        };
        Ok(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_parse_named_strategy_with_defaults() {
        let cfg: SelectionConfig = toml::from_str("name = \"boltzmann\"\nt_final = 5.0").unwrap();
        assert_eq!(
            cfg,
            SelectionConfig::Boltzmann {
                t_initial: 100.0,
                t_final: 5.0,
                decay: 0.99
            }
        );
        assert_eq!(cfg.name(), "boltzmann");
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let parsed: Result<SelectionConfig, _> = toml::from_str("name = \"lottery\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_invalid_parameters_fail_before_construction() {
        let bad = [
            SelectionConfig::Boltzmann {
                t_initial: 1.0,
                t_final: 10.0,
                decay: 0.5,
            },
            SelectionConfig::Boltzmann {
                t_initial: 10.0,
                t_final: 1.0,
                decay: 0.0,
            },
            SelectionConfig::Tournament { tournament_size: 0 },
            SelectionConfig::ProbTournament { threshold: 1.5 },
        ];
        for cfg in bad {
            let err = cfg.build(Pcg32::seed_from_u64(0)).err();
            assert!(
                matches!(err, Some(ConfigError::InvalidParameter { .. })),
                "{cfg:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_every_registered_strategy_returns_in_range_indices() {
        let configs = [
            SelectionConfig::Elite,
            SelectionConfig::Roulette,
            SelectionConfig::Universal,
            SelectionConfig::Ranking,
            SelectionConfig::Boltzmann {
                t_initial: 100.0,
                t_final: 10.0,
                decay: 0.99,
            },
            SelectionConfig::Tournament { tournament_size: 3 },
            SelectionConfig::ProbTournament { threshold: 0.8 },
        ];
        let scores = [0.5, 3.0, 1.0, 0.0, 2.5, 4.0];
        for cfg in configs {
            let mut strategy = cfg.build(Pcg32::seed_from_u64(11)).unwrap();
            let picked = strategy.select(&scores, 4).unwrap();
            assert_eq!(picked.len(), 4, "{}", cfg.name());
            assert!(picked.iter().all(|&i| i < scores.len()), "{}", cfg.name());
        }
    }
}

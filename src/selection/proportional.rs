use super::{SelectionError, SelectionStrategy};
use rand::Rng;
use rand_pcg::Pcg32;

/// Sum of the scores, rejected unless strictly positive.
fn positive_total(scores: &[f64]) -> Result<f64, SelectionError> {
    let total: f64 = scores.iter().sum();
    if total > 0.0 {
        Ok(total)
    } else {
        Err(SelectionError::NonPositiveTotal { total })
    }
}

/// First index whose cumulative score reaches `point`.
fn wheel_index(scores: &[f64], point: f64) -> usize {
    let mut upto = 0.0;
    for (i, w) in scores.iter().enumerate() {
        upto += w;
        if upto >= point {
            return i;
        }
    }
    scores.len() - 1
}

/// Fitness-proportionate selection with `k` independent spins of the wheel.
#[derive(Debug, Clone)]
pub struct RouletteSelection {
    rng: Pcg32,
}

impl RouletteSelection {
    pub fn new(rng: Pcg32) -> Self {
        Self { rng }
    }
}

impl SelectionStrategy for RouletteSelection {
    fn select(&mut self, scores: &[f64], k: usize) -> Result<Vec<usize>, SelectionError> {
        let total = positive_total(scores)?;
        Ok((0..k)
            .map(|_| wheel_index(scores, self.rng.random::<f64>() * total))
            .collect())
    }
}

/// Stochastic universal sampling.
///
/// A single random offset places `k` equally spaced pointers on the wheel,
/// which keeps the number of copies of each index close to its expected value.
#[derive(Debug, Clone)]
pub struct UniversalSelection {
    rng: Pcg32,
}

impl UniversalSelection {
    pub fn new(rng: Pcg32) -> Self {
        Self { rng }
    }
}

impl SelectionStrategy for UniversalSelection {
    fn select(&mut self, scores: &[f64], k: usize) -> Result<Vec<usize>, SelectionError> {
        let total = positive_total(scores)?;
        if k == 0 {
            return Ok(Vec::new());
        }
        let step = total / k as f64;
        let start = self.rng.random::<f64>() * step;

        let mut selected = Vec::with_capacity(k);
        let mut cumulative = 0.0;
        let mut idx = 0;
        for i in 0..k {
            let pointer = start + i as f64 * step;
            while idx < scores.len() - 1 && cumulative + scores[idx] < pointer {
                cumulative += scores[idx];
                idx += 1;
            }
            selected.push(idx);
        }
        Ok(selected)
    }
}

/// Rank-based selection.
///
/// The best score gets pseudo-score `(N-1)/N`, the worst gets `0`, and the
/// wheel is spun on those values. Selection pressure therefore depends only on
/// the ordering of the scores, not on their magnitude.
#[derive(Debug, Clone)]
pub struct RankingSelection {
    roulette: RouletteSelection,
}

impl RankingSelection {
    pub fn new(rng: Pcg32) -> Self {
        Self {
            roulette: RouletteSelection::new(rng),
        }
    }

    /// Maps each score to `(N - rank) / N`, where the best score has rank 1.
    pub fn rank_scores(scores: &[f64]) -> Vec<f64> {
        let n = scores.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let mut pseudo = vec![0.0; n];
        for (rank0, idx) in order.into_iter().enumerate() {
            pseudo[idx] = (n - (rank0 + 1)) as f64 / n as f64;
        }
        pseudo
    }
}

impl SelectionStrategy for RankingSelection {
    fn select(&mut self, scores: &[f64], k: usize) -> Result<Vec<usize>, SelectionError> {
        let pseudo = Self::rank_scores(scores);
        self.roulette.select(&pseudo, k)
    }
}

/// Boltzmann (simulated-annealing style) selection.
///
/// Scores are turned into `exp(score / t)` weights, where the temperature
/// decays from `t_initial` to `t_final` as
/// `t = t_final + (t_initial - t_final) * exp(-decay * generation)`.
/// The generation counter advances once per successful `select` call, so the
/// engine must call it at most once per generation.
#[derive(Debug, Clone)]
pub struct BoltzmannSelection {
    t_initial: f64,
    t_final: f64,
    decay: f64,
    generation_count: u64,
    roulette: RouletteSelection,
}

impl BoltzmannSelection {
    pub fn new(t_initial: f64, t_final: f64, decay: f64, rng: Pcg32) -> Self {
        Self {
            t_initial,
            t_final,
            decay,
            generation_count: 0,
            roulette: RouletteSelection::new(rng),
        }
    }

    /// Temperature that the next call to `select` will use.
    pub fn temperature(&self) -> f64 {
        self.t_final
            + (self.t_initial - self.t_final) * (-self.decay * self.generation_count as f64).exp()
    }

    pub fn generation_count(&self) -> u64 {
        self.generation_count
    }
}

impl SelectionStrategy for BoltzmannSelection {
    fn select(&mut self, scores: &[f64], k: usize) -> Result<Vec<usize>, SelectionError> {
        let temperature = self.temperature();
        let weights: Vec<f64> = scores.iter().map(|s| (s / temperature).exp()).collect();
        if weights.iter().any(|w| w.is_infinite()) {
            return Err(SelectionError::Overflow { temperature });
        }
        let mean = weights.iter().sum::<f64>() / weights.len().max(1) as f64;
        let pseudo: Vec<f64> = weights.iter().map(|w| w / mean).collect();

        self.generation_count += 1;
        self.roulette.select(&pseudo, k)
    }
}
